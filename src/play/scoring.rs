use crate::GameMods;

use super::{
    context::FrameContext,
    events::{PlayEvent, SoundCue},
    health::{Health, HealthChange, HealthRules},
    result::{HitResult, HitResultEvent, Judgement, JudgementKind},
    rules::HealthMultipliers,
    tally::Tally,
};

/// Receives every judgement of a play and keeps the tally and health.
#[derive(Clone, Debug)]
pub(crate) struct Scoring {
    pub(crate) tally: Tally,
    pub(crate) health: Health,
    pub(crate) events: Vec<PlayEvent>,
    pub(crate) restart_requested: bool,
    multipliers: HealthMultipliers,
    health_rules: HealthRules,
    perfect: bool,
    sudden_death: bool,
    sd_restart: bool,
    /// Health only changes between these times.
    first_start: f64,
    last_end: f64,
}

impl Scoring {
    pub(crate) fn new(
        mods: &GameMods,
        multipliers: HealthMultipliers,
        drain_kill: bool,
        sd_restart: bool,
        ez_retries: u8,
        span: (f64, f64),
    ) -> Self {
        Self {
            tally: Tally::default(),
            health: Health::new(ez_retries),
            events: Vec::new(),
            restart_requested: false,
            multipliers,
            health_rules: HealthRules {
                no_fail: mods.nf(),
                easy: mods.ez(),
                drain_kill,
            },
            perfect: mods.pf(),
            sudden_death: mods.sd(),
            sd_restart,
            first_start: span.0,
            last_end: span.1,
        }
    }

    pub(crate) fn judge(&mut self, judgement: Judgement, ctx: &FrameContext<'_>) {
        let Judgement {
            object,
            result,
            delta,
            end_of_combo,
            kind,
        } = judgement;

        let now = ctx.now;

        if kind != JudgementKind::HealthOnly {
            self.tally.add(result, delta, kind);
        }

        let mut combo_end = None;

        if kind.affects_health() {
            let amount = ctx
                .rules
                .health_increase(result, self.multipliers, 200.0);

            self.add_health(amount, true, now);

            if end_of_combo {
                combo_end = self.tally.end_combo(result);

                if let Some(bonus) = combo_end {
                    let amount = ctx.rules.health_increase(bonus, self.multipliers, 200.0);
                    self.add_health(amount, true, now);
                }
            }
        }

        if !matches!(kind, JudgementKind::HealthOnly) {
            self.events.push(PlayEvent::Judgement(HitResultEvent {
                object,
                time: now,
                result,
                delta,
                end_of_combo,
                combo_end,
            }));
        }

        if result == HitResult::SpinnerBonus {
            self.events.push(PlayEvent::Sound(SoundCue::SpinnerBonus));
        }

        if self.perfect && kind != JudgementKind::Head && !result.is_perfect() {
            self.request_restart(now);
        }

        if self.sudden_death && result == HitResult::Miss {
            self.sudden_death_fail(now);
        }
    }

    /// Break the combo without a judgement.
    pub(crate) fn slider_break(&mut self, object: Option<usize>, now: f64) {
        self.tally.slider_break();
        self.events.push(PlayEvent::SliderBreak { object, time: now });

        if self.perfect {
            self.request_restart(now);
        }

        if self.sudden_death {
            self.sudden_death_fail(now);
        }
    }

    /// Passive drain. Never fails the play by itself.
    pub(crate) fn drain(&mut self, amount: f64, now: f64) {
        self.add_health(-amount, false, now);
    }

    fn add_health(&mut self, amount: f64, from_hit: bool, now: f64) {
        if now < self.first_start || now > self.last_end {
            return;
        }

        let change = self.health.add(amount, from_hit, self.health_rules);

        if let Some(change) = change {
            self.on_health_change(change, now);
        }
    }

    fn sudden_death_fail(&mut self, now: f64) {
        if self.sd_restart {
            self.request_restart(now);
        } else if !self.health.is_failed() && !self.health.is_dead() {
            let change = self.health.fail(self.health_rules.drain_kill);
            self.on_health_change(change, now);
        }
    }

    fn request_restart(&mut self, now: f64) {
        if !self.restart_requested {
            tracing::debug!(time = now, "restart requested");

            self.restart_requested = true;
            self.events.push(PlayEvent::RestartRequested { time: now });
        }
    }

    fn on_health_change(&mut self, change: HealthChange, now: f64) {
        match change {
            HealthChange::Failed => {
                tracing::debug!(time = now, "failed");

                self.events.push(PlayEvent::Failed { time: now });
                self.events.push(PlayEvent::Sound(SoundCue::Fail));
            }
            HealthChange::Died => {
                tracing::debug!(time = now, "died without drain kill");

                self.events.push(PlayEvent::Died { time: now });
            }
            HealthChange::Rescued => {
                tracing::debug!(time = now, retries_left = self.health.ez_retries(), "rescued");

                self.events.push(PlayEvent::Rescued { time: now });
            }
            HealthChange::Revived => self.events.push(PlayEvent::Revived { time: now }),
        }
    }
}
