use std::f64::consts::{FRAC_PI_2, PI};

use crate::{
    any::difficulty::{
        object::{HasStartTime, IDifficultyObject},
        skills::{strain_decay, StrainSkill},
    },
    osu::difficulty::object::OsuDifficultyObject,
    util::strains_vec::StrainsVec,
};

use super::strain::OsuStrainSkill;

define_skill! {
    #[derive(Clone)]
    pub struct Aim: StrainSkill => [OsuDifficultyObject<'a>][OsuDifficultyObject<'a>] {
        with_sliders: bool,
        current_strain: f64 = 0.0,
    }
}

impl Aim {
    const SKILL_MULTIPLIER: f64 = 23.55;
    const STRAIN_DECAY_BASE: f64 = 0.15;

    fn calculate_initial_strain(
        &mut self,
        time: f64,
        curr: &OsuDifficultyObject<'_>,
        objects: &[OsuDifficultyObject<'_>],
    ) -> f64 {
        let prev_start_time = curr
            .previous(0, objects)
            .map_or(0.0, HasStartTime::start_time);

        self.current_strain * strain_decay(time - prev_start_time, Self::STRAIN_DECAY_BASE)
    }

    fn strain_value_at(
        &mut self,
        curr: &OsuDifficultyObject<'_>,
        objects: &[OsuDifficultyObject<'_>],
    ) -> f64 {
        // The first object only marks where the map starts
        if curr.idx == 0 {
            return 0.0;
        }

        self.current_strain *= strain_decay(curr.delta_time, Self::STRAIN_DECAY_BASE);
        self.current_strain +=
            AimEvaluator::evaluate_diff_of(curr, objects, self.with_sliders) * Self::SKILL_MULTIPLIER;

        self.current_strain
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

impl OsuStrainSkill for Aim {}

struct AimEvaluator;

impl AimEvaluator {
    const WIDE_ANGLE_MULTIPLIER: f64 = 1.5;
    const ACUTE_ANGLE_MULTIPLIER: f64 = 1.95;
    const SLIDER_MULTIPLIER: f64 = 1.35;
    const VELOCITY_CHANGE_MULTIPLIER: f64 = 0.75;

    fn evaluate_diff_of(
        curr: &OsuDifficultyObject<'_>,
        diff_objects: &[OsuDifficultyObject<'_>],
        with_sliders: bool,
    ) -> f64 {
        let prev = curr.previous_or_first(0, diff_objects);
        let prev_prev = curr.previous_or_first(1, diff_objects);

        if curr.base.is_spinner() || curr.idx <= 2 || prev.base.is_spinner() {
            return 0.0;
        }

        // * Calculate the velocity to the current hitobject, which starts
        // * with a base distance / time assuming the last object is a hitcircle.
        let mut curr_vel = curr.jump_dist / curr.strain_time;

        // * But if the last object is a slider, then we extend the travel
        // * velocity through the slider into the current object.
        if prev.base.is_slider() && with_sliders {
            let travel_vel = prev.travel_dist / prev.travel_time;
            let movement_vel = curr.min_jump_dist / curr.min_jump_time;

            curr_vel = curr_vel.max(movement_vel + travel_vel);
        }

        let mut prev_vel = prev.jump_dist / prev.strain_time;

        if prev_prev.base.is_slider() && with_sliders {
            let travel_vel = prev_prev.travel_dist / prev_prev.travel_time;
            let movement_vel = prev.min_jump_dist / prev.min_jump_time;

            prev_vel = prev_vel.max(movement_vel + travel_vel);
        }

        let mut wide_angle_bonus = 0.0;
        let mut acute_angle_bonus = 0.0;
        let mut slider_bonus = 0.0;
        let mut vel_change_bonus = 0.0;

        // * Start strain with regular velocity.
        let mut aim_strain = curr_vel;

        // * If rhythms are the same.
        if curr.strain_time.max(prev.strain_time) < 1.25 * curr.strain_time.min(prev.strain_time) {
            if let (Some(curr_angle), Some(prev_angle), Some(prev_prev_angle)) =
                (curr.angle, prev.angle, prev_prev.angle)
            {
                // * Rewarding angles, take the smaller velocity as base.
                let angle_bonus = curr_vel.min(prev_vel);

                wide_angle_bonus = Self::calc_wide_angle_bonus(curr_angle);

                // * Only buff deltaTime exceeding 300 bpm 1/2.
                if curr.strain_time <= 100.0 {
                    acute_angle_bonus = Self::calc_acute_angle_bonus(curr_angle)
                        * Self::calc_acute_angle_bonus(prev_angle)
                        * angle_bonus.min(125.0 / curr.strain_time)
                        * (FRAC_PI_2 * ((100.0 - curr.strain_time) / 25.0).min(1.0))
                            .sin()
                            .powf(2.0)
                        * (FRAC_PI_2 * (curr.jump_dist.clamp(50.0, 100.0) - 50.0) / 50.0)
                            .sin()
                            .powf(2.0);
                }

                // * Penalize wide angles if they're repeated, reducing the
                // * penalty as the prev_angle gets more acute.
                wide_angle_bonus *= angle_bonus
                    * (1.0
                        - wide_angle_bonus.min(Self::calc_wide_angle_bonus(prev_angle).powf(3.0)));

                // * Penalize acute angles if they're repeated, reducing the
                // * penalty as the prev_prev_angle gets more obtuse.
                acute_angle_bonus *= 0.5
                    + 0.5
                        * (1.0
                            - acute_angle_bonus
                                .min(Self::calc_acute_angle_bonus(prev_prev_angle).powf(3.0)));
            }
        }

        if prev_vel.max(curr_vel) > 0.0 {
            // * We want to use the average velocity over the whole object when
            // * awarding differences, not the individual jump and slider path
            // * velocities.
            let prev_vel = (prev.jump_dist + prev_prev.travel_dist) / prev.strain_time;
            let curr_vel = (curr.jump_dist + prev.travel_dist) / curr.strain_time;
            let max_vel = prev_vel.max(curr_vel);

            if max_vel > 0.0 {
                // * Scale with ratio of difference compared to 0.5 * max dist.
                let dist_ratio = (FRAC_PI_2 * (prev_vel - curr_vel).abs() / max_vel)
                    .sin()
                    .powf(2.0);

                // * Reward for % distance up to 125 / strainTime for overlaps
                // * where velocity is still changing.
                let overlap_vel_buff = (125.0 / curr.strain_time.min(prev.strain_time))
                    .min((prev_vel - curr_vel).abs());

                vel_change_bonus = overlap_vel_buff
                    * dist_ratio
                    * (curr.strain_time.min(prev.strain_time)
                        / curr.strain_time.max(prev.strain_time))
                    .powf(2.0);
            }
        }

        if prev.base.is_slider() {
            // * Reward sliders based on velocity.
            slider_bonus = prev.travel_dist / prev.travel_time;
        }

        // * Add in acute angle bonus or wide angle bonus + velocity change
        // * bonus, whichever is larger.
        aim_strain += (acute_angle_bonus * Self::ACUTE_ANGLE_MULTIPLIER).max(
            wide_angle_bonus * Self::WIDE_ANGLE_MULTIPLIER
                + vel_change_bonus * Self::VELOCITY_CHANGE_MULTIPLIER,
        );

        // * Add in additional slider velocity bonus.
        if with_sliders {
            aim_strain += slider_bonus * Self::SLIDER_MULTIPLIER;
        }

        aim_strain
    }

    fn calc_wide_angle_bonus(angle: f64) -> f64 {
        (3.0 / 4.0 * ((5.0 / 6.0 * PI).min(angle.max(PI / 6.0)) - PI / 6.0))
            .sin()
            .powf(2.0)
    }

    fn calc_acute_angle_bonus(angle: f64) -> f64 {
        1.0 - Self::calc_wide_angle_bonus(angle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn angle_bonuses_are_complementary() {
        for angle in [0.0, 0.5, 1.0, 2.0, PI] {
            let sum = AimEvaluator::calc_wide_angle_bonus(angle)
                + AimEvaluator::calc_acute_angle_bonus(angle);

            assert!((sum - 1.0).abs() < 1e-12);
        }

        assert!(AimEvaluator::calc_wide_angle_bonus(0.0).abs() < 1e-12);
        assert!((AimEvaluator::calc_wide_angle_bonus(PI) - 1.0).abs() < 1e-12);
    }
}
