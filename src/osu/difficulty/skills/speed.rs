use std::f64::consts::PI;

use crate::{
    any::difficulty::{
        object::{HasStartTime, IDifficultyObject},
        skills::{strain_decay, StrainSkill},
    },
    osu::difficulty::object::OsuDifficultyObject,
    util::{float_ext::FloatExt, strains_vec::StrainsVec},
};

use super::strain::OsuStrainSkill;

define_skill! {
    #[derive(Clone)]
    pub struct Speed: StrainSkill => [OsuDifficultyObject<'a>][OsuDifficultyObject<'a>] {
        hit_window: f64,
        current_strain: f64 = 0.0,
        current_rhythm: f64 = 0.0,
    }
}

impl Speed {
    const SKILL_MULTIPLIER: f64 = 1375.0;
    const STRAIN_DECAY_BASE: f64 = 0.3;

    fn calculate_initial_strain(
        &mut self,
        time: f64,
        curr: &OsuDifficultyObject<'_>,
        objects: &[OsuDifficultyObject<'_>],
    ) -> f64 {
        let prev_start_time = curr
            .previous(0, objects)
            .map_or(0.0, HasStartTime::start_time);

        (self.current_strain * self.current_rhythm)
            * strain_decay(time - prev_start_time, Self::STRAIN_DECAY_BASE)
    }

    fn strain_value_at(
        &mut self,
        curr: &OsuDifficultyObject<'_>,
        objects: &[OsuDifficultyObject<'_>],
    ) -> f64 {
        if curr.idx == 0 {
            return 0.0;
        }

        self.current_strain *= strain_decay(curr.strain_time, Self::STRAIN_DECAY_BASE);

        if curr.base.is_spinner() {
            self.current_rhythm = 0.0;
        } else {
            self.current_strain +=
                SpeedEvaluator::evaluate_diff_of(curr, objects, self.hit_window)
                    * Self::SKILL_MULTIPLIER;

            self.current_rhythm =
                RhythmEvaluator::evaluate_diff_of(curr, objects, self.hit_window);
        }

        self.current_strain * self.current_rhythm
    }

    /// Amount of notes weighted by how close their strain is to the hardest
    /// one.
    pub fn relevant_note_count(&self) -> f64 {
        let strains = self.object_strains();

        let max_strain = strains.iter().copied().fold(0.0, f64::max);

        if strains.is_empty() || FloatExt::eq(max_strain, 0.0) {
            return 0.0;
        }

        strains
            .iter()
            .map(|strain| 1.0 / (1.0 + f64::exp(-(strain / max_strain * 12.0 - 6.0))))
            .sum()
    }

    // From `OsuStrainSkill`; native rather than trait function so that it has
    // priority over `StrainSkill::difficulty_value`
    fn difficulty_value(current_strain_peaks: StrainsVec) -> f64 {
        super::strain::difficulty_value(
            current_strain_peaks,
            Self::REDUCED_SECTION_COUNT,
            Self::REDUCED_STRAIN_BASELINE,
            Self::DECAY_WEIGHT,
        )
    }
}

impl OsuStrainSkill for Speed {
    const REDUCED_SECTION_COUNT: usize = 5;
    const DIFFICULTY_MULTIPLIER: f64 = 1.04;
}

struct SpeedEvaluator;

impl SpeedEvaluator {
    const SINGLE_SPACING_THRESHOLD: f64 = 125.0;
    // ~200 BPM 1/4 streams
    const MIN_SPEED_BONUS: f64 = 75.0;
    const SPEED_BALANCING_FACTOR: f64 = 40.0;

    fn evaluate_diff_of(
        curr: &OsuDifficultyObject<'_>,
        diff_objects: &[OsuDifficultyObject<'_>],
        hit_window: f64,
    ) -> f64 {
        let prev = curr.previous_or_first(0, diff_objects);

        let dist = Self::SINGLE_SPACING_THRESHOLD.min(prev.travel_dist + curr.min_jump_dist);

        // * Aim to nerf cheesy rhythms (very fast consecutive doubles with
        // * large delta times between)
        let mut strain_time = curr.strain_time;
        strain_time /= ((strain_time / hit_window) / 0.93).clamp(0.92, 1.0);

        // * Cap deltatime to the OD 300 hitwindow.
        let doubletapness = curr.next(0, diff_objects).map_or(1.0, |next| {
            let curr_delta = curr.delta_time.max(1.0);
            let next_delta = (next.start_time - curr.start_time).max(1.0);
            let delta_diff = (next_delta - curr_delta).abs();
            let speed_ratio = curr_delta / curr_delta.max(delta_diff);
            let window_ratio = (curr_delta / hit_window).min(1.0).powf(2.0);

            speed_ratio.powf(1.0 - window_ratio)
        });

        let speed_bonus = if strain_time < Self::MIN_SPEED_BONUS {
            1.0 + 0.75
                * ((Self::MIN_SPEED_BONUS - strain_time) / Self::SPEED_BALANCING_FACTOR).powf(2.0)
        } else {
            1.0
        };

        (speed_bonus + speed_bonus * (dist / Self::SINGLE_SPACING_THRESHOLD).powf(3.5))
            * doubletapness
            / strain_time
    }
}

struct RhythmEvaluator;

impl RhythmEvaluator {
    // * 5 seconds of calculateRhythmBonus max.
    const HISTORY_TIME_MAX: f64 = 5000.0;
    const HISTORY_OBJECTS_MAX: usize = 32;
    const RHYTHM_MULTIPLIER: f64 = 0.75;

    /// Calculates a rhythm multiplier for the difficulty of the tap
    /// associated with historic data of the current object.
    fn evaluate_diff_of(
        curr: &OsuDifficultyObject<'_>,
        diff_objects: &[OsuDifficultyObject<'_>],
        hit_window: f64,
    ) -> f64 {
        let mut prev_island_size = 0;
        let mut rhythm_complexity_sum = 0.0;
        let mut island_size = 1;

        // * Store the ratio of the current start of an island to buff for
        // * tighter rhythms.
        let mut start_ratio = 0.0;
        let mut first_delta_switch = false;

        let historical_note_count = (curr.idx - 1).min(Self::HISTORY_OBJECTS_MAX);

        let mut rhythm_start = 0;

        while rhythm_start + 2 < historical_note_count
            && curr.start_time - curr.previous_or_first(rhythm_start, diff_objects).start_time
                < Self::HISTORY_TIME_MAX
        {
            rhythm_start += 1;
        }

        for i in (1..=rhythm_start).rev() {
            let curr_obj = curr.previous_or_first(i - 1, diff_objects);
            let prev_obj = curr.previous_or_first(i, diff_objects);
            let last_obj = curr.previous_or_first(i + 1, diff_objects);

            // * Scales note 0 to 1 from history to now.
            let mut curr_historical_decay = (Self::HISTORY_TIME_MAX
                - (curr.start_time - curr_obj.start_time))
                / Self::HISTORY_TIME_MAX;

            // * Either we're limited by time or limited by object count.
            curr_historical_decay = curr_historical_decay.min(
                (historical_note_count - i) as f64 / historical_note_count as f64,
            );

            let curr_delta = curr_obj.strain_time;
            let prev_delta = prev_obj.strain_time;
            let last_delta = last_obj.strain_time;

            // * Fancy function to calculate rhythm bonuses.
            let curr_ratio = 1.0
                + 6.0
                    * f64::min(
                        0.5,
                        (PI / (prev_delta.min(curr_delta) / prev_delta.max(curr_delta)))
                            .sin()
                            .powf(2.0),
                    );

            let window_penalty = (((prev_delta - curr_delta).abs() - hit_window * 0.3).max(0.0)
                / (hit_window * 0.3))
                .min(1.0);

            let mut effective_ratio = window_penalty * curr_ratio;

            if first_delta_switch {
                if prev_delta <= 1.25 * curr_delta && prev_delta * 1.25 >= curr_delta {
                    // * Island is still progressing, count size.
                    if island_size < 7 {
                        island_size += 1;
                    }
                } else {
                    // * BPM change is into slider, this is easy acc window.
                    if curr_obj.base.is_slider() {
                        effective_ratio *= 0.125;
                    }

                    // * BPM change was from a slider, this is typically easier
                    // * than circle -> circle.
                    if prev_obj.base.is_slider() {
                        effective_ratio *= 0.25;
                    }

                    // * Repeated island size (ex: triplet -> triplet).
                    if prev_island_size == island_size {
                        effective_ratio *= 0.25;
                    }

                    // * Repeated island polarity (2 -> 4, 3 -> 5).
                    if prev_island_size % 2 == island_size % 2 {
                        effective_ratio *= 0.5;
                    }

                    // * Previous increase happened a note ago.
                    // * Albeit this is a 1/1 -> 1/2-1/4 type of transition,
                    // * we don't want to buff this.
                    if last_delta > prev_delta + 10.0 && prev_delta > curr_delta + 10.0 {
                        effective_ratio *= 0.125;
                    }

                    rhythm_complexity_sum += (effective_ratio * start_ratio).sqrt()
                        * curr_historical_decay
                        * f64::from(4 + island_size).sqrt()
                        / 2.0
                        * f64::from(4 + prev_island_size).sqrt()
                        / 2.0;

                    start_ratio = effective_ratio;

                    // * Log the last island size.
                    prev_island_size = island_size;

                    // * We're slowing down, stop counting.
                    if prev_delta * 1.25 < curr_delta {
                        // * If we're speeding up, this stays true and we keep
                        // * counting island size.
                        first_delta_switch = false;
                    }

                    island_size = 1;
                }
            } else if prev_delta > 1.25 * curr_delta {
                // * We want to be speeding up.
                // * Begin counting island until we change speed again.
                first_delta_switch = true;
                start_ratio = effective_ratio;
                island_size = 1;
            }
        }

        (4.0 + rhythm_complexity_sum * Self::RHYTHM_MULTIPLIER).sqrt() / 2.0
    }
}

