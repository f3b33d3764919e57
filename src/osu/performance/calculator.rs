use statrs::distribution::{Beta, ContinuousCDF, Normal};

use crate::{
    osu::attributes::{OsuDifficultyAttributes, OsuPerformanceAttributes},
    GameMods,
};

use super::{OsuScoreState, PERFORMANCE_BASE_MULTIPLIER};

pub(super) struct OsuPerformanceCalculator<'mods> {
    attrs: OsuDifficultyAttributes,
    mods: &'mods GameMods,
    ar: f64,
    od: f64,
    state: OsuScoreState,
    effective_miss_count: f64,
}

impl<'a> OsuPerformanceCalculator<'a> {
    pub const fn new(
        attrs: OsuDifficultyAttributes,
        mods: &'a GameMods,
        ar: f64,
        od: f64,
        state: OsuScoreState,
    ) -> Self {
        Self {
            attrs,
            mods,
            ar,
            od,
            state,
            effective_miss_count: 0.0,
        }
    }
}

impl OsuPerformanceCalculator<'_> {
    pub fn calculate(mut self) -> OsuPerformanceAttributes {
        let total_hits = self.state.total_hits();

        if total_hits == 0 || self.state.max_combo == 0 {
            return OsuPerformanceAttributes {
                difficulty: self.attrs,
                ..Default::default()
            };
        }

        let accuracy_hit_objects_count = if self.mods.v2() {
            total_hits
        } else {
            self.attrs.n_circles
        };

        self.effective_miss_count = Self::calculate_effective_miss_count(&self.attrs, &self.state);

        let mut multiplier = PERFORMANCE_BASE_MULTIPLIER;

        if self.mods.nf() {
            multiplier *= (1.0 - 0.02 * self.effective_miss_count).max(0.9);
        }

        if self.mods.so() {
            multiplier *=
                1.0 - (f64::from(self.attrs.n_spinners) / f64::from(total_hits)).powf(0.85);
        }

        if self.mods.rx() {
            // * we use OD13.3 as maximum since it's the value at which great hitwidow becomes 0
            let (n100_mult, n50_mult) = if self.od > 0.0 {
                (
                    (1.0 - (self.od / 13.33).powf(1.8)).max(0.0),
                    (1.0 - (self.od / 13.33).powf(5.0)).max(0.0),
                )
            } else {
                (1.0, 1.0)
            };

            self.effective_miss_count = (self.effective_miss_count
                + f64::from(self.state.n100) * n100_mult
                + f64::from(self.state.n50) * n50_mult)
                .min(f64::from(total_hits));
        }

        let aim_value = self.compute_aim_value();
        let speed_value = self.compute_speed_value();
        let accuracy_value = self.compute_accuracy_value(accuracy_hit_objects_count);

        let pp = (aim_value.powf(1.1) + speed_value.powf(1.1) + accuracy_value.powf(1.1))
            .powf(1.0 / 1.1)
            * multiplier;

        let estimated_unstable_rate = Self::calculate_deviation(
            self.od,
            total_hits,
            accuracy_hit_objects_count,
            self.state.n300,
        )
        .map(|deviation| deviation * 10.0);

        OsuPerformanceAttributes {
            difficulty: self.attrs,
            pp,
            pp_acc: accuracy_value,
            pp_aim: aim_value,
            pp_speed: speed_value,
            effective_miss_count: self.effective_miss_count,
            estimated_unstable_rate,
        }
    }

    fn compute_aim_value(&self) -> f64 {
        if self.mods.ap() {
            return 0.0;
        }

        let mut aim_value = Self::skill_to_performance(self.attrs.aim);

        let length_bonus = self.length_bonus();
        aim_value *= length_bonus;

        aim_value *= self.miss_penalty(
            self.attrs.aim_difficult_strain_count,
            self.effective_miss_count,
        );
        aim_value *= self.combo_scaling_factor();

        let mut approach_rate_factor = 0.0;

        if !self.mods.rx() {
            if self.ar > 10.33 {
                approach_rate_factor = 0.3 * (self.ar - 10.33);
            } else if self.ar < 8.0 {
                approach_rate_factor = 0.05 * (8.0 - self.ar);
            }
        }

        aim_value *= 1.0 + approach_rate_factor * length_bonus;

        if self.mods.hd() {
            aim_value *= 1.0 + 0.04 * (12.0 - self.ar).max(0.0);
        }

        // * We assume 15% of sliders in a map are difficult since there's no way to tell from the performance calculator.
        let estimate_diff_sliders = f64::from(self.attrs.n_sliders) * 0.15;

        if self.attrs.n_sliders > 0 {
            let estimate_slider_ends_dropped = f64::from(
                (self.state.n100 + self.state.n50 + self.state.misses)
                    .min(self.attrs.max_combo.saturating_sub(self.state.max_combo)),
            )
            .clamp(0.0, estimate_diff_sliders);

            let slider_nerf_factor = (1.0 - self.attrs.slider_factor)
                * (1.0 - estimate_slider_ends_dropped / estimate_diff_sliders).powf(3.0)
                + self.attrs.slider_factor;

            aim_value *= slider_nerf_factor;
        }

        aim_value *= self.state.accuracy();
        // * It is important to consider accuracy difficulty when scaling with accuracy.
        aim_value *= 0.98 + self.od.powf(2.0) / 2500.0;

        aim_value
    }

    fn compute_speed_value(&self) -> f64 {
        if self.mods.rx() {
            return 0.0;
        }

        let mut speed_value = Self::skill_to_performance(self.attrs.speed);

        let length_bonus = self.length_bonus();
        speed_value *= length_bonus;

        speed_value *= self.miss_penalty(
            self.attrs.speed_difficult_strain_count,
            self.effective_miss_count.powf(0.875),
        );
        speed_value *= self.combo_scaling_factor();

        let approach_rate_factor = if self.ar > 10.33 {
            0.3 * (self.ar - 10.33)
        } else {
            0.0
        };

        speed_value *= 1.0 + approach_rate_factor * length_bonus;

        if self.mods.hd() {
            speed_value *= 1.0 + 0.04 * (12.0 - self.ar).max(0.0);
        }

        // * Calculate accuracy assuming the worst case scenario
        let total_hits = self.total_hits();
        let speed_notes = self.attrs.speed_note_count;

        let relevant_total_diff = total_hits - speed_notes;
        let n300 = f64::from(self.state.n300);
        let n100 = f64::from(self.state.n100);
        let n50 = f64::from(self.state.n50);

        let relevant_n300 = (n300 - relevant_total_diff).max(0.0);
        let relevant_n100 = (n100 - (relevant_total_diff - n300).max(0.0)).max(0.0);
        let relevant_n50 = (n50 - (relevant_total_diff - n300 - n100).max(0.0)).max(0.0);

        let relevant_acc = if speed_notes > 0.0 {
            (relevant_n300 * 6.0 + relevant_n100 * 2.0 + relevant_n50) / (speed_notes * 6.0)
        } else {
            0.0
        };

        // * Scale the speed value with accuracy and OD.
        speed_value *= (0.95 + self.od.powf(2.0) / 750.0)
            * ((self.state.accuracy() + relevant_acc) / 2.0).powf((14.5 - self.od.max(8.0)) / 2.0);

        // * Scale the speed value with # of 50s to punish doubletapping.
        let doubletap_50s = if n50 < total_hits / 500.0 {
            0.0
        } else {
            n50 - total_hits / 500.0
        };

        speed_value *= 0.99_f64.powf(doubletap_50s);

        speed_value
    }

    fn compute_accuracy_value(&self, accuracy_hit_objects_count: u32) -> f64 {
        let amount = f64::from(accuracy_hit_objects_count);

        // * This percentage only considers HitCircles of any value - in this part of the calculation we focus on hitting the timing hit window.
        let better_acc_percentage = if accuracy_hit_objects_count > 0 {
            let n300 = f64::from(self.state.n300) - (self.total_hits() - amount);

            ((n300 * 6.0 + f64::from(self.state.n100) * 2.0 + f64::from(self.state.n50))
                / (amount * 6.0))
                .max(0.0)
        } else {
            0.0
        };

        // * Lots of arbitrary values from testing.
        // * Considering to use derivation from perfect accuracy in a probabilistic manner - assume normal distribution.
        let mut acc_value = 1.52163_f64.powf(self.od) * better_acc_percentage.powf(24.0) * 2.83;

        // * Bonus for many hitcircles - it's harder to keep good accuracy up for longer.
        acc_value *= (amount / 1000.0).powf(0.3).min(1.15);

        if self.mods.hd() {
            acc_value *= 1.08;
        }

        if self.mods.fl() {
            acc_value *= 1.02;
        }

        acc_value
    }

    fn skill_to_performance(difficulty: f64) -> f64 {
        (5.0 * (difficulty / 0.0675).max(1.0) - 4.0).powf(3.0) / 100_000.0
    }

    fn length_bonus(&self) -> f64 {
        let total_hits = self.total_hits();

        0.95 + 0.4 * (total_hits / 2000.0).min(1.0)
            + if total_hits > 2000.0 {
                (total_hits / 2000.0).log10() * 0.5
            } else {
                0.0
            }
    }

    /// Penalty for the effective misses, scaled by how many strains of the
    /// skill are difficult.
    ///
    /// Without a meaningful strain count, the relative miss count decides
    /// and is raised to `exponent`.
    fn miss_penalty(&self, difficult_strain_count: f64, exponent: f64) -> f64 {
        if self.effective_miss_count <= 0.0 {
            return 1.0;
        }

        if difficult_strain_count > 1.0 {
            let scaled = difficult_strain_count.ln().powf(0.94);

            if scaled.is_finite() && scaled > 0.0 {
                return 0.96 / (self.effective_miss_count / (4.0 * scaled) + 1.0);
            }
        }

        let relative = (self.effective_miss_count / self.total_hits()).min(1.0);

        0.97 * (1.0 - relative.powf(0.775)).powf(exponent)
    }

    fn combo_scaling_factor(&self) -> f64 {
        if self.attrs.max_combo == 0 {
            1.0
        } else {
            (f64::from(self.state.max_combo).powf(0.8) / f64::from(self.attrs.max_combo).powf(0.8))
                .min(1.0)
        }
    }

    fn total_hits(&self) -> f64 {
        f64::from(self.state.total_hits())
    }

    fn calculate_effective_miss_count(
        attrs: &OsuDifficultyAttributes,
        state: &OsuScoreState,
    ) -> f64 {
        // * Guess the number of misses + slider breaks from combo
        let mut combo_based_miss_count = 0.0;

        if attrs.n_sliders > 0 {
            let full_combo_threshold =
                f64::from(attrs.max_combo) - 0.1 * f64::from(attrs.n_sliders);

            if f64::from(state.max_combo) < full_combo_threshold {
                combo_based_miss_count = full_combo_threshold / f64::from(state.max_combo).max(1.0);
            }
        }

        // * Clamp miss count to maximum amount of possible breaks
        combo_based_miss_count =
            combo_based_miss_count.min(f64::from(state.n100 + state.n50 + state.misses));

        combo_based_miss_count.max(f64::from(state.misses))
    }

    /// Standard deviation of the hit error in milliseconds, assuming the 300s
    /// on accuracy objects are normally distributed around zero.
    fn calculate_deviation(
        od: f64,
        total_hits: u32,
        accuracy_object_count: u32,
        n300: u32,
    ) -> Option<f64> {
        let relevant_n300 = i64::from(n300) - (i64::from(total_hits) - i64::from(accuracy_object_count));

        if relevant_n300 <= 0 {
            return None;
        }

        let relevant_n300 = relevant_n300 as f64;
        let accuracy_object_count = f64::from(accuracy_object_count);

        // * Lower bound of the 300 probability the player beats in 80% of
        // * cases given the amount of 300s on accuracy objects
        let beta = Beta::new(relevant_n300, 1.0 + accuracy_object_count - relevant_n300).ok()?;
        let probability = beta.inverse_cdf(0.2);

        // * Add the left tail of the normal distribution.
        let probability = probability + (1.0 - probability) / 2.0;

        let z_value = Normal::new(0.0, 1.0).ok()?.inverse_cdf(probability);

        if !z_value.is_finite() || z_value <= 0.0 {
            return None;
        }

        let hit_window = 79.5 - od * 6.0;

        Some(hit_window / z_value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(n300: u32, n100: u32, n50: u32, misses: u32, max_combo: u32) -> OsuScoreState {
        OsuScoreState {
            max_combo,
            n300,
            n100,
            n50,
            misses,
        }
    }

    #[test]
    fn skill_to_performance_floor() {
        let floor = OsuPerformanceCalculator::skill_to_performance(0.0);

        assert!((floor - 1.0 / 100_000.0).abs() < 1e-15);
        assert!(OsuPerformanceCalculator::skill_to_performance(3.0) > 100.0);
    }

    #[test]
    fn combo_breaks_on_slider_maps() {
        let attrs = OsuDifficultyAttributes {
            n_circles: 50,
            n_sliders: 50,
            max_combo: 200,
            ..Default::default()
        };

        let fc = OsuPerformanceCalculator::calculate_effective_miss_count(
            &attrs,
            &state(98, 2, 0, 0, 200),
        );
        assert!(fc.abs() < f64::EPSILON);

        // threshold 195 over a combo of 65 suggests three breaks but only
        // two imperfect hits are available
        let choke = OsuPerformanceCalculator::calculate_effective_miss_count(
            &attrs,
            &state(98, 2, 0, 0, 65),
        );
        assert!((choke - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn deviation_needs_300s_on_circles() {
        assert!(OsuPerformanceCalculator::calculate_deviation(8.0, 100, 40, 50).is_none());

        let deviation = OsuPerformanceCalculator::calculate_deviation(8.0, 100, 100, 99).unwrap();
        let sloppy = OsuPerformanceCalculator::calculate_deviation(8.0, 100, 100, 80).unwrap();

        assert!(deviation > 0.0);
        assert!(sloppy > deviation);
    }

    #[test]
    fn miss_penalty_without_strain_counts() {
        let mods = GameMods::default();

        let mut calc = OsuPerformanceCalculator::new(
            OsuDifficultyAttributes::default(),
            &mods,
            9.0,
            8.0,
            state(95, 0, 0, 5, 10),
        );

        assert!((calc.miss_penalty(0.0, 5.0) - 1.0).abs() < f64::EPSILON);

        calc.effective_miss_count = 5.0;
        let penalty = calc.miss_penalty(0.0, 5.0);

        assert!(penalty < 0.97 && penalty > 0.0);
        assert!(calc.miss_penalty(50.0, 5.0) < 0.96);
    }
}
