use crate::{
    model::{beatmap::HitWindows, mods::GameMods},
    util::difficulty::{inverse_range, range},
};

use self::calculator::OsuPerformanceCalculator;

use super::attributes::{OsuDifficultyAttributes, OsuPerformanceAttributes};

mod calculator;

// * This is being adjusted to keep the final pp value scaled around what it used to be when changing things.
pub const PERFORMANCE_BASE_MULTIPLIER: f64 = 1.14;

/// Aggregation of the hit results of a play.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct OsuScoreState {
    /// Maximum combo that the score has had so far.
    pub max_combo: u32,
    /// Amount of current 300s.
    pub n300: u32,
    /// Amount of current 100s.
    pub n100: u32,
    /// Amount of current 50s.
    pub n50: u32,
    /// Amount of current misses.
    pub misses: u32,
}

impl OsuScoreState {
    /// Create a new empty score state.
    pub const fn new() -> Self {
        Self {
            max_combo: 0,
            n300: 0,
            n100: 0,
            n50: 0,
            misses: 0,
        }
    }

    /// Return the total amount of hits by adding everything up.
    pub const fn total_hits(&self) -> u32 {
        self.n300 + self.n100 + self.n50 + self.misses
    }

    /// Calculate the accuracy between `0.0` and `1.0` for this state.
    pub fn accuracy(&self) -> f64 {
        let total_hits = self.total_hits();

        if total_hits == 0 {
            return 0.0;
        }

        let numerator = 6 * self.n300 + 2 * self.n100 + self.n50;
        let denominator = 6 * total_hits;

        f64::from(numerator) / f64::from(denominator)
    }
}

/// Performance calculator on osu!standard maps.
///
/// Hit counts that are not specified are derived from the attributes:
/// missing objects count as 300s and the combo defaults to the highest one
/// that is still possible with the given misses.
///
/// # Example
///
/// ```
/// use rosu_play::{osu::attributes::OsuDifficultyAttributes, Performance};
///
/// let attrs = OsuDifficultyAttributes {
///     aim: 2.5,
///     speed: 2.2,
///     slider_factor: 1.0,
///     speed_note_count: 150.0,
///     od: 8.0,
///     ar: 9.0,
///     clock_rate: 1.0,
///     n_circles: 300,
///     max_combo: 300,
///     ..Default::default()
/// };
///
/// let fc = Performance::new(attrs.clone()).calculate();
/// let choke = Performance::new(attrs).combo(150).misses(1).calculate();
///
/// assert!(fc.pp > choke.pp);
/// ```
#[derive(Clone, Debug, PartialEq)]
#[must_use]
pub struct OsuPerformance {
    attrs: OsuDifficultyAttributes,
    mods: GameMods,
    clock_rate: Option<f64>,
    combo: Option<u32>,
    n300: Option<u32>,
    n100: Option<u32>,
    n50: Option<u32>,
    misses: Option<u32>,
}

impl OsuPerformance {
    /// Create a new performance calculator for the given attributes.
    pub fn new(attrs: OsuDifficultyAttributes) -> Self {
        attrs.into()
    }

    /// Specify mods.
    ///
    /// Only mods that don't alter the difficulty attributes have an effect
    /// here, e.g. HD, NF, or SO. Mods such as HR or DT have to be passed to
    /// the difficulty calculation.
    pub fn mods(mut self, mods: impl Into<GameMods>) -> Self {
        self.mods = mods.into();

        self
    }

    /// Adjust the clock rate the AR and OD of the attributes are perceived
    /// at.
    ///
    /// Defaults to the clock rate of the difficulty calculation.
    pub fn clock_rate(mut self, clock_rate: f64) -> Self {
        self.clock_rate = Some(clock_rate.clamp(0.01, 100.0));

        self
    }

    /// Specify the max combo of the play.
    pub const fn combo(mut self, combo: u32) -> Self {
        self.combo = Some(combo);

        self
    }

    /// Specify the amount of 300s of a play.
    pub const fn n300(mut self, n300: u32) -> Self {
        self.n300 = Some(n300);

        self
    }

    /// Specify the amount of 100s of a play.
    pub const fn n100(mut self, n100: u32) -> Self {
        self.n100 = Some(n100);

        self
    }

    /// Specify the amount of 50s of a play.
    pub const fn n50(mut self, n50: u32) -> Self {
        self.n50 = Some(n50);

        self
    }

    /// Specify the amount of misses of a play.
    pub const fn misses(mut self, misses: u32) -> Self {
        self.misses = Some(misses);

        self
    }

    /// Provide parameters through an [`OsuScoreState`].
    pub const fn state(mut self, state: OsuScoreState) -> Self {
        let OsuScoreState {
            max_combo,
            n300,
            n100,
            n50,
            misses,
        } = state;

        self.combo = Some(max_combo);
        self.n300 = Some(n300);
        self.n100 = Some(n100);
        self.n50 = Some(n50);
        self.misses = Some(misses);

        self
    }

    /// Create the [`OsuScoreState`] that will be used for performance
    /// calculation.
    pub fn generate_state(&self) -> OsuScoreState {
        let n_objects = self.attrs.n_objects();

        let misses = self.misses.map_or(0, |n| n.min(n_objects));
        let n_remaining = n_objects - misses;

        let n100 = self.n100.map_or(0, |n| n.min(n_remaining));
        let n50 = self.n50.map_or(0, |n| n.min(n_remaining - n100));

        let n300 = match self.n300 {
            Some(n300) => n300.min(n_remaining - n100 - n50),
            None => n_remaining - n100 - n50,
        };

        let max_possible_combo = self.attrs.max_combo.saturating_sub(misses);

        let max_combo = self
            .combo
            .map_or(max_possible_combo, |combo| combo.min(max_possible_combo));

        OsuScoreState {
            max_combo,
            n300,
            n100,
            n50,
            misses,
        }
    }

    /// Calculate all performance related values.
    pub fn calculate(self) -> OsuPerformanceAttributes {
        let state = self.generate_state();

        let (ar, od) = match self.clock_rate {
            Some(clock_rate) => rescale_ar_od(&self.attrs, clock_rate),
            None => (self.attrs.ar, self.attrs.od),
        };

        OsuPerformanceCalculator::new(self.attrs, &self.mods, ar, od, state).calculate()
    }
}

/// AR and OD of the attributes as perceived at `clock_rate` instead of the
/// clock rate of the difficulty calculation.
fn rescale_ar_od(attrs: &OsuDifficultyAttributes, clock_rate: f64) -> (f64, f64) {
    let attrs_clock_rate = if attrs.clock_rate > 0.0 {
        attrs.clock_rate
    } else {
        1.0
    };

    let ratio = attrs_clock_rate / clock_rate;

    let preempt = range(
        attrs.ar,
        HitWindows::PREEMPT_MIN,
        HitWindows::PREEMPT_MID,
        HitWindows::PREEMPT_MAX,
    ) * ratio;

    let great = range(
        attrs.od,
        HitWindows::GREAT_MIN,
        HitWindows::GREAT_MID,
        HitWindows::GREAT_MAX,
    ) * ratio;

    let ar = inverse_range(
        preempt,
        HitWindows::PREEMPT_MIN,
        HitWindows::PREEMPT_MID,
        HitWindows::PREEMPT_MAX,
    );

    let od = inverse_range(
        great,
        HitWindows::GREAT_MIN,
        HitWindows::GREAT_MID,
        HitWindows::GREAT_MAX,
    );

    (ar, od)
}

impl From<OsuDifficultyAttributes> for OsuPerformance {
    fn from(attrs: OsuDifficultyAttributes) -> Self {
        Self {
            attrs,
            mods: GameMods::DEFAULT,
            clock_rate: None,
            combo: None,
            n300: None,
            n100: None,
            n50: None,
            misses: None,
        }
    }
}

impl From<OsuPerformanceAttributes> for OsuPerformance {
    fn from(attrs: OsuPerformanceAttributes) -> Self {
        attrs.difficulty.into()
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn attrs() -> OsuDifficultyAttributes {
        OsuDifficultyAttributes {
            aim: 2.8,
            speed: 2.4,
            slider_factor: 0.97,
            speed_note_count: 180.0,
            aim_difficult_strain_count: 90.0,
            speed_difficult_strain_count: 70.0,
            ar: 9.3,
            od: 8.5,
            cs: 4.0,
            hp: 5.0,
            clock_rate: 1.0,
            n_circles: 250,
            n_sliders: 150,
            n_spinners: 2,
            stars: 5.4,
            max_combo: 700,
        }
    }

    #[test]
    fn missing_counts_are_derived() {
        let state = OsuPerformance::new(attrs()).n100(10).misses(2).generate_state();

        assert_eq!(state.n300, 402 - 12);
        assert_eq!(state.n100, 10);
        assert_eq!(state.n50, 0);
        assert_eq!(state.misses, 2);
        assert_eq!(state.max_combo, 698);
        assert_eq!(state.total_hits(), 402);
    }

    #[test]
    fn counts_are_capped() {
        let state = OsuPerformance::new(attrs())
            .misses(1000)
            .combo(5000)
            .generate_state();

        assert_eq!(state.misses, 402);
        assert_eq!(state.n300, 0);
        assert_eq!(state.max_combo, 298);
    }

    #[test]
    fn accuracy_weights() {
        let state = OsuScoreState {
            max_combo: 3,
            n300: 1,
            n100: 1,
            n50: 1,
            misses: 1,
        };

        assert!((state.accuracy() - 9.0 / 24.0).abs() < 1e-12);
        assert!(OsuScoreState::new().accuracy().abs() < f64::EPSILON);
    }

    #[test]
    fn full_combo_is_positive() {
        let perf = OsuPerformance::new(attrs()).calculate();

        assert!(perf.pp > 100.0, "{perf:?}");
        assert!(perf.pp_aim > 0.0);
        assert!(perf.pp_speed > 0.0);
        assert!(perf.pp_acc > 0.0);
        assert!(perf.effective_miss_count.abs() < f64::EPSILON);
        assert!(perf.estimated_unstable_rate.is_some());
    }

    #[test]
    fn zero_combo_gives_nothing() {
        let perf = OsuPerformance::new(OsuDifficultyAttributes::default()).calculate();

        assert!(perf.pp.abs() < f64::EPSILON);
    }

    #[test]
    fn mods_adjust_components() {
        let nomod = OsuPerformance::new(attrs()).calculate();
        let hidden = OsuPerformance::new(attrs()).mods(8_u32).calculate();
        let relax = OsuPerformance::new(attrs()).mods(128_u32).calculate();
        let autopilot = OsuPerformance::new(attrs()).mods(8192_u32).calculate();

        assert!(hidden.pp > nomod.pp);
        assert!(relax.pp_speed.abs() < f64::EPSILON);
        assert!(autopilot.pp_aim.abs() < f64::EPSILON);
    }

    #[test]
    fn faster_clock_raises_ar_and_od() {
        let (ar, od) = rescale_ar_od(&attrs(), 1.5);

        assert!(ar > 9.3);
        assert!(od > 8.5);

        let (same_ar, same_od) = rescale_ar_od(&attrs(), 1.0);

        assert!((same_ar - 9.3).abs() < 1e-9);
        assert!((same_od - 8.5).abs() < 1e-9);
    }

    #[test]
    fn score_v2_counts_sliders_for_accuracy() {
        let classic = OsuPerformance::new(attrs()).n100(20).calculate();
        let v2 = OsuPerformance::new(attrs()).n100(20).mods(536_870_912_u32).calculate();

        assert!((classic.pp_acc - v2.pp_acc).abs() > f64::EPSILON);
    }

    proptest! {
        #[test]
        fn more_misses_never_help(misses in 0_u32..60, n100 in 0_u32..40, n50 in 0_u32..10) {
            let base = OsuPerformance::new(attrs()).n100(n100).n50(n50);

            let fewer = base.clone().misses(misses).calculate().pp;
            let more = base.misses(misses + 1).calculate().pp;

            prop_assert!(more <= fewer, "{more} > {fewer}");
        }

        #[test]
        fn higher_combo_never_hurts(combo in 1_u32..699, misses in 0_u32..3) {
            let base = OsuPerformance::new(attrs()).misses(misses).n100(5);

            let lower = base.clone().combo(combo).calculate().pp;
            let higher = base.combo(combo + 1).calculate().pp;

            prop_assert!(higher >= lower, "{higher} < {lower}");
        }
    }
}
