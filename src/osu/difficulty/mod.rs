use crate::{
    any::difficulty::{skills::StrainSkill, Cancelled, Difficulty},
    model::{beatmap::BeatmapAttributes, mods::GameMods},
    osu::{
        convert::{convert_objects, ObjectCounts},
        difficulty::{object::OsuDifficultyObject, scaling_factor::ScalingFactor},
        object::OsuObject,
        performance::PERFORMANCE_BASE_MULTIPLIER,
    },
    Beatmap,
};

use self::skills::{aim::Aim, speed::Speed, strain::OsuStrainSkill, OsuSkills};

use super::attributes::OsuDifficultyAttributes;

pub mod object;
pub mod scaling_factor;
pub mod skills;

const DIFFICULTY_MULTIPLIER: f64 = 0.0675;

pub fn difficulty(
    difficulty: &Difficulty,
    map: &Beatmap,
) -> Result<OsuDifficultyAttributes, Cancelled> {
    let DifficultyValues { skills, mut attrs } = DifficultyValues::calculate(difficulty, map)?;

    DifficultyValues::eval(&mut attrs, difficulty.get_mods(), &skills);

    Ok(attrs)
}

/// Calculates the attributes after each processed object and hands them to
/// `on_step` together with the amount of processed objects.
///
/// The attributes after `n` steps equal those of a calculation with
/// `passed_objects(n)`.
pub fn gradual<F>(difficulty: &Difficulty, map: &Beatmap, mut on_step: F) -> Result<(), Cancelled>
where
    F: FnMut(usize, &OsuDifficultyAttributes),
{
    let OsuDifficultySetup {
        map_attrs,
        scaling_factor,
        attrs: base_attrs,
    } = OsuDifficultySetup::new(difficulty, map);

    let mods = difficulty.get_mods();
    let objects = convert_objects(map, &map_attrs, mods.reflection());
    let diff_objects =
        OsuDifficultyObject::create_all(&objects, &scaling_factor, map_attrs.clock_rate);

    let mut skills = OsuSkills::new(&map_attrs);
    let mut counts = ObjectCounts::default();

    for (diff_object, n) in diff_objects
        .iter()
        .take(difficulty.get_passed_objects())
        .zip(1..)
    {
        difficulty.check_cancelled()?;

        skills.process(diff_object, &diff_objects);
        counts.add(diff_object.base);

        let mut attrs = base_attrs.clone();
        set_counts(&mut attrs, &counts);
        DifficultyValues::eval(&mut attrs, mods, &skills);

        on_step(n, &attrs);
    }

    Ok(())
}

pub struct OsuDifficultySetup {
    pub map_attrs: BeatmapAttributes,
    pub scaling_factor: ScalingFactor,
    pub attrs: OsuDifficultyAttributes,
}

impl OsuDifficultySetup {
    pub fn new(difficulty: &Difficulty, map: &Beatmap) -> Self {
        let map_attrs = map.attributes().difficulty(difficulty).build();
        let scaling_factor = ScalingFactor::new(map_attrs.cs);

        let attrs = OsuDifficultyAttributes {
            ar: map_attrs.adjusted_ar(),
            od: map_attrs.adjusted_od(),
            cs: map_attrs.cs,
            hp: map_attrs.hp,
            clock_rate: map_attrs.clock_rate,
            ..Default::default()
        };

        Self {
            map_attrs,
            scaling_factor,
            attrs,
        }
    }
}

pub struct DifficultyValues {
    pub skills: OsuSkills,
    pub attrs: OsuDifficultyAttributes,
}

impl DifficultyValues {
    pub fn calculate(difficulty: &Difficulty, map: &Beatmap) -> Result<Self, Cancelled> {
        let take = difficulty.get_passed_objects();

        let OsuDifficultySetup {
            map_attrs,
            scaling_factor,
            mut attrs,
        } = OsuDifficultySetup::new(difficulty, map);

        let objects = convert_objects(map, &map_attrs, difficulty.get_mods().reflection());
        set_counts(&mut attrs, &ObjectCounts::new(&objects, take));

        let diff_objects = Self::create_difficulty_objects(&objects, &scaling_factor, &map_attrs);
        let mut skills = OsuSkills::new(&map_attrs);

        // Objects after `take` still serve as the next object of the last
        // processed one so that truncated strains equal a prefix of the full
        // calculation.
        for diff_object in diff_objects.iter().take(take) {
            difficulty.check_cancelled()?;
            skills.process(diff_object, &diff_objects);
        }

        Ok(Self { skills, attrs })
    }

    /// Process the difficulty values and store the results in `attrs`.
    pub fn eval(attrs: &mut OsuDifficultyAttributes, mods: &GameMods, skills: &OsuSkills) {
        let OsuSkills {
            aim,
            aim_no_sliders,
            speed,
        } = skills;

        let aim_difficulty_value = aim.cloned_difficulty_value();
        let aim_no_sliders_difficulty_value = aim_no_sliders.cloned_difficulty_value();
        let speed_difficulty_value = speed.cloned_difficulty_value();

        let aim_difficult_strain_count = aim.count_top_weighted_strains(aim_difficulty_value);
        let speed_difficult_strain_count = speed.count_top_weighted_strains(speed_difficulty_value);
        let speed_note_count = speed.relevant_note_count();

        let mut aim_rating =
            (aim_difficulty_value * Aim::DIFFICULTY_MULTIPLIER).sqrt() * DIFFICULTY_MULTIPLIER;
        let aim_no_sliders_rating = (aim_no_sliders_difficulty_value * Aim::DIFFICULTY_MULTIPLIER)
            .sqrt()
            * DIFFICULTY_MULTIPLIER;
        let mut speed_rating =
            (speed_difficulty_value * Speed::DIFFICULTY_MULTIPLIER).sqrt() * DIFFICULTY_MULTIPLIER;

        let slider_factor = if aim_rating > 0.0 {
            aim_no_sliders_rating / aim_rating
        } else {
            1.0
        };

        if mods.td() {
            aim_rating = aim_rating.powf(0.8);
        }

        if mods.rx() {
            aim_rating *= 0.9;
            speed_rating = 0.0;
        }

        let base_aim_performance = Aim::difficulty_to_performance(aim_rating);
        let base_speed_performance = Speed::difficulty_to_performance(speed_rating);

        let base_performance = (base_aim_performance.powf(1.1) + base_speed_performance.powf(1.1))
            .powf(1.0 / 1.1);

        // A single object is only rated if it's a slider
        let rated = attrs.n_objects() >= 2 || attrs.n_sliders == 1;

        let star_rating = if rated && base_performance > 0.00001 {
            PERFORMANCE_BASE_MULTIPLIER.cbrt()
                * 0.027
                * ((100_000.0 / 2.0_f64.powf(1.0 / 1.1) * base_performance).cbrt() + 4.0)
        } else {
            0.0
        };

        attrs.aim = aim_rating;
        attrs.speed = speed_rating;
        attrs.slider_factor = slider_factor;
        attrs.speed_note_count = speed_note_count;
        attrs.aim_difficult_strain_count = aim_difficult_strain_count;
        attrs.speed_difficult_strain_count = speed_difficult_strain_count;
        attrs.stars = star_rating;
    }

    pub fn create_difficulty_objects<'a>(
        objects: &'a [OsuObject],
        scaling_factor: &ScalingFactor,
        map_attrs: &BeatmapAttributes,
    ) -> Vec<OsuDifficultyObject<'a>> {
        OsuDifficultyObject::create_all(objects, scaling_factor, map_attrs.clock_rate)
    }
}

fn set_counts(attrs: &mut OsuDifficultyAttributes, counts: &ObjectCounts) {
    attrs.n_circles = counts.n_circles;
    attrs.n_sliders = counts.n_sliders;
    attrs.n_spinners = counts.n_spinners;
    attrs.max_combo = counts.max_combo;
}

#[cfg(test)]
mod tests {
    use crate::{
        any::CancelFlag,
        model::{
            control_point::TimingPoint,
            hit_object::{HitObject, HitObjectKind, Pos},
        },
    };

    use super::*;

    fn jumps(n: usize) -> Beatmap {
        let hit_objects = (0..n)
            .map(|i| HitObject {
                pos: if i % 2 == 0 {
                    Pos::new(64.0, 192.0)
                } else {
                    Pos::new(448.0, 192.0)
                },
                start_time: 1000.0 + 150.0 * i as f64 + if i % 3 == 0 { 20.0 } else { 0.0 },
                new_combo: i % 4 == 0,
                kind: HitObjectKind::Circle,
            })
            .collect();

        Beatmap {
            ar: 9.0,
            cs: 4.0,
            od: 8.0,
            timing_points: vec![TimingPoint::new(0.0, 300.0)],
            hit_objects,
            ..Default::default()
        }
    }

    #[test]
    fn single_circle_is_unrated() {
        let attrs = difficulty(&Difficulty::new(), &jumps(1)).unwrap();

        assert!(attrs.stars.abs() < f64::EPSILON);
        assert_eq!(attrs.n_circles, 1);
        assert_eq!(attrs.max_combo, 1);
    }

    #[test]
    fn jumps_are_rated() {
        let attrs = difficulty(&Difficulty::new(), &jumps(40)).unwrap();

        assert!(attrs.stars > 1.0, "{attrs:?}");
        assert!(attrs.aim > attrs.speed);
        assert!((attrs.slider_factor - 1.0).abs() < 1e-9);
        assert!(attrs.speed_note_count > 0.0);
        assert!(attrs.aim_difficult_strain_count > 0.0);
        assert_eq!(attrs.max_combo, 40);
    }

    #[test]
    fn double_time_is_harder() {
        let map = jumps(40);
        let nomod = difficulty(&Difficulty::new(), &map).unwrap();
        let dt = difficulty(&Difficulty::new().mods(64_u32), &map).unwrap();

        assert!(dt.stars > nomod.stars);
        assert!(dt.ar > nomod.ar);
        assert!((dt.clock_rate - 1.5).abs() < f64::EPSILON);
    }

    #[test]
    fn relax_drops_speed() {
        let attrs = difficulty(&Difficulty::new().mods(128_u32), &jumps(40)).unwrap();

        assert!(attrs.speed.abs() < f64::EPSILON);
    }

    #[test]
    fn gradual_matches_passed_objects() {
        let map = jumps(30);
        let mut steps = Vec::new();

        gradual(&Difficulty::new(), &map, |n, attrs| steps.push((n, attrs.clone()))).unwrap();

        assert_eq!(steps.len(), 30);

        for &n in &[1_usize, 2, 7, 30] {
            let expected = difficulty(&Difficulty::new().passed_objects(n as u32), &map).unwrap();
            let (step, ref actual) = steps[n - 1];

            assert_eq!(step, n);
            assert_eq!(actual, &expected);
        }
    }

    #[test]
    fn cancelled_calculation() {
        let flag = CancelFlag::new();
        flag.cancel();

        let res = difficulty(&Difficulty::new().cancel_flag(flag), &jumps(10));

        assert_eq!(res, Err(Cancelled));
    }
}
