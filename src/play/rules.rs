use crate::{
    model::beatmap::BeatmapAttributes,
    osu::circle_diameter,
    util::difficulty::range,
};

use super::result::HitResult;

/// Time and distance rules derived from a map's modded attributes.
///
/// All times are in milliseconds of map time.
#[derive(Clone, Debug, PartialEq)]
pub struct GameRules {
    pub(crate) od: f64,
    pub(crate) hp: f64,
    pub(crate) clock_rate: f64,
    pub(crate) approach: f64,
    pub(crate) great: f64,
    pub(crate) ok: f64,
    pub(crate) meh: f64,
    pub(crate) miss: f64,
    pub(crate) circle_radius: f64,
}

impl GameRules {
    /// Milliseconds an object fades in for.
    pub const FADE_IN: f64 = 400.0;

    /// Follow circle radius relative to the circle radius.
    pub const FOLLOW_CIRCLE_SCALE: f64 = 2.4;

    const PVS_EXTRA: f64 = 1500.0;

    pub fn new(attrs: &BeatmapAttributes) -> Self {
        let windows = &attrs.hit_windows;

        Self {
            od: attrs.od,
            hp: attrs.hp,
            clock_rate: attrs.clock_rate,
            approach: windows.preempt,
            great: windows.great,
            ok: windows.ok,
            meh: windows.meh,
            miss: windows.miss,
            circle_radius: circle_diameter(attrs.cs) / 2.0,
        }
    }

    /// Judgement for a click `delta` milliseconds away from the object.
    ///
    /// Returns `None` if the click is too far away to be judged at all.
    pub fn judge(&self, delta: f64) -> Option<HitResult> {
        let delta = delta.abs();

        if delta > lookup(self.miss) {
            None
        } else if delta < lookup(self.great) {
            Some(HitResult::N300)
        } else if delta < lookup(self.ok) {
            Some(HitResult::N100)
        } else if delta < lookup(self.meh) {
            Some(HitResult::N50)
        } else {
            Some(HitResult::Miss)
        }
    }

    /// Whether an object at `delta` milliseconds past its start can no
    /// longer be hit.
    pub fn timed_out(&self, delta: f64) -> bool {
        delta >= 0.0 && delta > self.meh.floor()
    }

    pub const fn approach_time(&self) -> f64 {
        self.approach
    }

    pub const fn circle_radius(&self) -> f64 {
        self.circle_radius
    }

    pub fn follow_radius(&self) -> f64 {
        self.circle_radius * Self::FOLLOW_CIRCLE_SCALE
    }

    /// Objects further than this from the current time are not visited.
    pub fn pvs(&self) -> f64 {
        self.approach + Self::FADE_IN + self.miss + Self::PVS_EXTRA
    }

    pub fn spins_per_second(&self) -> f64 {
        range(self.od, 3.0, 5.0, 7.5)
    }

    /// Full rotations a spinner of the given map-time duration requires.
    pub fn rotations_required(&self, duration: f64) -> f64 {
        (duration / 1000.0 * self.spins_per_second() * 0.5 * (1.0 / self.clock_rate).min(1.0))
            .floor()
    }

    /// Health change for `result` on a bar of size `normalization`.
    pub fn health_increase(&self, result: HitResult, multipliers: HealthMultipliers, normalization: f64) -> f64 {
        let HealthMultipliers { normal, combo_end } = multipliers;
        let hp = self.hp;

        let raw = match result {
            HitResult::Miss => range(hp, -6.0, -25.0, -40.0),
            HitResult::N50 => normal * range(hp, 0.4 * 8.0, 0.4, 0.4),
            HitResult::N100 => normal * range(hp, 2.2 * 8.0, 2.2, 2.2),
            HitResult::N300 => normal * 6.0,
            HitResult::SliderBreak => range(hp, -4.0, -15.0, -28.0),
            HitResult::Mu => combo_end * 6.0,
            HitResult::Katu100 | HitResult::Katu300 => combo_end * 10.0,
            HitResult::Geki => combo_end * 14.0,
            HitResult::SliderTick => normal * 3.0,
            HitResult::SliderEdge => normal * 4.0,
            HitResult::SpinnerSpin => normal * 1.7,
            HitResult::SpinnerBonus => normal * 2.0,
        };

        raw / normalization
    }
}

/// Scaling of health gains found by drain calibration.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct HealthMultipliers {
    pub normal: f64,
    pub combo_end: f64,
}

impl Default for HealthMultipliers {
    fn default() -> Self {
        Self {
            normal: 1.0,
            combo_end: 1.0,
        }
    }
}

fn lookup(window: f64) -> f64 {
    window.floor() - 0.5
}

#[cfg(test)]
mod tests {
    use crate::model::beatmap::Beatmap;

    use super::*;

    fn rules(od: f32, hp: f32) -> GameRules {
        let map = Beatmap {
            od,
            hp,
            ..Default::default()
        };

        GameRules::new(&map.attributes().build())
    }

    #[test]
    fn judgement_windows() {
        // od 5: 50 / 100 / 150
        let rules = rules(5.0, 5.0);

        assert_eq!(rules.judge(0.0), Some(HitResult::N300));
        assert_eq!(rules.judge(-49.0), Some(HitResult::N300));
        assert_eq!(rules.judge(49.6), Some(HitResult::N100));
        assert_eq!(rules.judge(120.0), Some(HitResult::N50));
        assert_eq!(rules.judge(-160.0), Some(HitResult::Miss));
        assert_eq!(rules.judge(399.0), Some(HitResult::Miss));
        assert_eq!(rules.judge(-400.0), None);

        assert!(!rules.timed_out(-500.0));
        assert!(!rules.timed_out(150.0));
        assert!(rules.timed_out(150.5));
    }

    #[test]
    fn health_scale() {
        let rules = rules(5.0, 5.0);
        let multipliers = HealthMultipliers::default();

        let miss = rules.health_increase(HitResult::Miss, multipliers, 200.0);
        let great = rules.health_increase(HitResult::N300, multipliers, 200.0);

        assert!((miss + 0.125).abs() < 1e-12);
        assert!((great - 0.03).abs() < 1e-12);
    }

    #[test]
    fn spinner_rotations() {
        let rules = rules(5.0, 5.0);

        // 3s at 5 spins per second, halved
        assert!((rules.rotations_required(3000.0) - 7.0).abs() < f64::EPSILON);
    }
}
