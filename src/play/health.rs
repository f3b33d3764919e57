/// Health below this counts as empty.
pub const EMPTY_HEALTH: f64 = 0.001;

/// Health above this revives a dead player.
pub const REVIVE_HEALTH: f64 = 0.999;

/// Health that an easy rescue restores.
pub const EZ_RESCUE_HEALTH: f64 = 0.8;

/// Health bar of a play in `0.0..=1.0`.
#[derive(Clone, Debug, PartialEq)]
pub struct Health {
    value: f64,
    failed: bool,
    dead: bool,
    ez_retries: u8,
    fail_anim: f64,
}

/// Mod and config switches that shape how health reacts.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct HealthRules {
    pub(crate) no_fail: bool,
    pub(crate) easy: bool,
    pub(crate) drain_kill: bool,
}

/// Transition caused by a health change.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum HealthChange {
    /// Failure ended the play.
    Failed,
    /// Failure without drain kill; play continues at zero health.
    Died,
    /// Easy prevented a failure.
    Rescued,
    Revived,
}

impl Health {
    pub fn new(ez_retries: u8) -> Self {
        Self {
            value: 1.0,
            failed: false,
            dead: false,
            ez_retries,
            fail_anim: 1.0,
        }
    }

    pub const fn value(&self) -> f64 {
        self.value
    }

    pub const fn is_failed(&self) -> bool {
        self.failed
    }

    pub const fn is_dead(&self) -> bool {
        self.dead
    }

    pub const fn ez_retries(&self) -> u8 {
        self.ez_retries
    }

    /// Fail animation progress, running from 1 down to 0 after failing.
    pub const fn fail_anim(&self) -> f64 {
        self.fail_anim
    }

    /// Apply `amount` and return the resulting transition.
    ///
    /// Only hit results that take health away can fail a play. Drain merely
    /// empties the bar.
    pub(crate) fn add(&mut self, amount: f64, from_hit: bool, rules: HealthRules) -> Option<HealthChange> {
        if self.failed {
            self.value = 0.0;

            return None;
        }

        self.value = (self.value + amount).clamp(0.0, 1.0);

        if self.value < EMPTY_HEALTH && !rules.no_fail {
            if rules.easy && self.ez_retries > 0 {
                self.ez_retries -= 1;
                self.value = EZ_RESCUE_HEALTH;

                return Some(HealthChange::Rescued);
            }

            if from_hit && amount < 0.0 && !self.dead {
                return Some(self.fail(rules.drain_kill));
            }
        }

        if self.dead && self.value > REVIVE_HEALTH {
            self.dead = false;

            return Some(HealthChange::Revived);
        }

        None
    }

    pub(crate) fn fail(&mut self, drain_kill: bool) -> HealthChange {
        self.value = 0.0;

        if drain_kill {
            self.failed = true;
            self.fail_anim = 1.0;

            HealthChange::Failed
        } else {
            self.dead = true;

            HealthChange::Died
        }
    }

    /// Advance the fail animation by `real_secs` seconds.
    pub(crate) fn animate(&mut self, real_secs: f64, fail_duration: f64) {
        if self.failed && fail_duration > 0.0 {
            self.fail_anim = (self.fail_anim - real_secs / fail_duration).max(0.0);
        }
    }
}

impl Default for Health {
    fn default() -> Self {
        Self::new(0)
    }
}
