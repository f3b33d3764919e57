use crate::{
    model::beatmap::BreakPeriod,
    osu::object::{OsuObject, OsuObjectKind, SliderEventKind},
    util::difficulty::range,
};

use super::{
    error::LoadError,
    result::HitResult,
    rules::{GameRules, HealthMultipliers},
};

/// Passive health drain of a map and the health gain scaling that goes
/// with it.
#[derive(Clone, Debug, PartialEq)]
pub struct DrainRate {
    /// Health lost per second of map time on a bar of size 1.
    pub rate: f64,
    pub multipliers: HealthMultipliers,
    /// Attempts until the calibration settled.
    pub iterations: usize,
    /// Health of the perfect test play after its last object.
    pub final_health: f64,
}

impl DrainRate {
    const BAR: f64 = 200.0;
    const INITIAL_DROP: f64 = 0.05;

    /// Find the highest drain for which a perfect play never comes close to
    /// failing.
    ///
    /// The map is played repeatedly with full accuracy. Whenever health gets
    /// too low the drain is reduced and the gains are scaled up.
    pub(crate) fn calibrate(
        objects: &[OsuObject],
        breaks: &[BreakPeriod],
        version: i32,
        rules: &GameRules,
        max_iterations: usize,
    ) -> Result<Self, LoadError> {
        let hp = rules.hp;

        let lowest_ever = range(hp, 195.0, 160.0, 60.0);
        let lowest_combo_end = range(hp, 198.0, 170.0, 80.0);
        let lowest_end = range(hp, 198.0, 180.0, 80.0);
        let recovery_needed = range(hp, 8.0, 4.0, 0.0);

        let mut drop = Self::INITIAL_DROP;
        let mut multipliers = HealthMultipliers::default();

        let Some(first) = objects.first() else {
            return Ok(Self {
                rate: 0.0,
                multipliers,
                iterations: 0,
                final_health: 1.0,
            });
        };

        for iteration in 1..=max_iterations {
            let mut player = TestPlayer::new(rules, multipliers);
            let mut last_time = (first.start_time - rules.approach_time()).trunc();
            let mut break_idx = 0;
            let mut combo_too_low = 0;
            let mut fail = false;

            for (i, h) in objects.iter().enumerate() {
                let mut break_time = 0.0;

                if let Some(b) = breaks.get(break_idx) {
                    if b.start_time >= last_time && b.end_time <= h.start_time {
                        break_time = if version < 8 {
                            b.end_time - b.start_time
                        } else {
                            b.end_time - last_time
                        };

                        break_idx += 1;
                    }
                }

                player.decrease(drop * (h.start_time - last_time - break_time));
                last_time = h.end_time.trunc();

                if player.health <= lowest_ever {
                    fail = true;
                    drop *= 0.96;

                    break;
                }

                let long_drop = drop * h.duration();
                let max_long_drop = (long_drop - player.health).max(0.0);
                player.decrease(long_drop);

                match h.kind {
                    OsuObjectKind::Circle => {}
                    OsuObjectKind::Slider(ref slider) => {
                        player.increase(HitResult::SliderEdge);

                        for event in slider.events.iter() {
                            match event.kind {
                                SliderEventKind::Repeat => player.increase(HitResult::SliderEdge),
                                SliderEventKind::Tick => player.increase(HitResult::SliderTick),
                                SliderEventKind::End => {}
                            }
                        }

                        player.increase(HitResult::SliderEdge);
                    }
                    OsuObjectKind::Spinner => {
                        let spins = (h.duration() / 1000.0 * rules.spins_per_second()).trunc();

                        for _ in 0..spins as usize {
                            player.increase(HitResult::SpinnerSpin);
                        }
                    }
                }

                if max_long_drop > 0.0 && player.health - max_long_drop <= lowest_ever {
                    fail = true;
                    drop *= 0.96;

                    break;
                }

                player.increase(HitResult::N300);

                let end_of_combo = objects.get(i + 1).map_or(true, |next| next.new_combo);

                if end_of_combo {
                    player.increase(HitResult::Geki);

                    if player.health < lowest_combo_end {
                        combo_too_low += 1;

                        if combo_too_low > 2 {
                            multipliers.combo_end *= 1.07;
                            multipliers.normal *= 1.03;
                            fail = true;

                            break;
                        }
                    }
                }
            }

            if !fail && player.health < lowest_end {
                fail = true;
                drop *= 0.94;
                multipliers.combo_end *= 1.01;
                multipliers.normal *= 1.01;
            }

            let recovery = (player.uncapped - Self::BAR) / objects.len() as f64;

            if !fail && recovery < recovery_needed {
                fail = true;
                drop *= 0.96;
                multipliers.combo_end *= 1.02;
                multipliers.normal *= 1.01;
            }

            if !fail {
                let rate = drop / Self::BAR * 1000.0;

                tracing::debug!(
                    rate,
                    normal = multipliers.normal,
                    combo_end = multipliers.combo_end,
                    iterations = iteration,
                    "drain rate calibrated"
                );

                return Ok(Self {
                    rate,
                    multipliers,
                    iterations: iteration,
                    final_health: player.health / Self::BAR,
                });
            }
        }

        Err(LoadError::DrainCalibration {
            iterations: max_iterations,
        })
    }

    /// Health lost over `ms` milliseconds of map time.
    pub fn drain(&self, ms: f64) -> f64 {
        self.rate * ms / 1000.0
    }
}

struct TestPlayer<'a> {
    rules: &'a GameRules,
    multipliers: HealthMultipliers,
    health: f64,
    uncapped: f64,
}

impl<'a> TestPlayer<'a> {
    const fn new(rules: &'a GameRules, multipliers: HealthMultipliers) -> Self {
        Self {
            rules,
            multipliers,
            health: DrainRate::BAR,
            uncapped: DrainRate::BAR,
        }
    }

    fn decrease(&mut self, amount: f64) {
        self.health = (self.health - amount).max(0.0);
        self.uncapped = (self.uncapped - amount).max(0.0);
    }

    fn increase(&mut self, result: HitResult) {
        let amount = self.rules.health_increase(result, self.multipliers, 1.0);

        self.health = (self.health + amount).min(DrainRate::BAR);
        self.uncapped += amount;
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        model::{
            beatmap::Beatmap,
            control_point::TimingPoint,
            hit_object::{HitObject, HitObjectKind, PathControlPoint, PathType, Pos, Slider},
        },
        osu::convert::convert_objects,
    };

    use super::*;

    fn circles(hp: f32, n: usize, spacing: f64) -> Beatmap {
        Beatmap {
            hp,
            timing_points: vec![TimingPoint::new(0.0, 500.0)],
            hit_objects: (0..n)
                .map(|i| HitObject {
                    pos: Pos::new(100.0 + 20.0 * (i % 10) as f32, 200.0),
                    start_time: 1000.0 + spacing * i as f64,
                    new_combo: i % 4 == 0,
                    kind: HitObjectKind::Circle,
                })
                .collect(),
            ..Default::default()
        }
    }

    fn calibrate(map: &Beatmap, max_iterations: usize) -> Result<DrainRate, LoadError> {
        let attrs = map.attributes().build();
        let rules = GameRules::new(&attrs);
        let objects = convert_objects(map, &attrs, crate::model::mods::Reflection::None);

        DrainRate::calibrate(&objects, &map.breaks, map.version, &rules, max_iterations)
    }

    #[test]
    fn converges_within_band() {
        for hp in [0.0, 5.0, 10.0] {
            let map = circles(hp, 40, 250.0);
            let drain = calibrate(&map, 1000).unwrap();
            let lowest_end = range(f64::from(hp), 198.0, 180.0, 80.0) / DrainRate::BAR;

            assert!(drain.rate > 0.0);
            assert!(drain.rate <= DrainRate::INITIAL_DROP / DrainRate::BAR * 1000.0);
            assert!(drain.final_health >= lowest_end);
            assert!(drain.multipliers.normal >= 1.0);
        }
    }

    #[test]
    fn higher_hp_drains_faster() {
        let low = calibrate(&circles(2.0, 40, 250.0), 1000).unwrap();
        let high = calibrate(&circles(8.0, 40, 250.0), 1000).unwrap();

        assert!(high.rate > low.rate);
    }

    #[test]
    fn slider_ends_count_in_whole_milliseconds() {
        let mut head = PathControlPoint::new(Pos::default());
        head.path_type = Some(PathType::LINEAR);

        let mut map = circles(5.0, 20, 250.0);

        for h in map.hit_objects.iter_mut() {
            h.start_time += 11_000.0;
        }

        map.hit_objects.insert(
            0,
            HitObject {
                pos: Pos::new(100.0, 200.0),
                start_time: 1000.0,
                new_combo: true,
                kind: HitObjectKind::Slider(Slider {
                    expected_dist: Some(100.0),
                    repeats: 0,
                    control_points: vec![head, PathControlPoint::new(Pos::new(100.0, 0.0))]
                        .into_boxed_slice(),
                }),
            },
        );

        let attrs = map.attributes().build();
        let end = convert_objects(&map, &attrs, crate::model::mods::Reflection::None)[0].end_time;
        assert!(end.fract() > 0.0, "{end}");

        let mut with_break = |start_time: f64| {
            map.breaks = vec![BreakPeriod {
                start_time,
                end_time: 11_000.0,
            }];

            calibrate(&map, 1000).unwrap()
        };

        // a break starting inside the slider's last millisecond still counts
        let inside = with_break(end.trunc() + end.fract() / 2.0);
        let whole = with_break(end.trunc());

        assert_eq!(inside, whole);
    }

    #[test]
    fn capped_iterations() {
        // the lead-in alone drops below the floor on the first attempt
        let err = calibrate(&circles(0.0, 10, 250.0), 1).unwrap_err();

        assert!(matches!(err, LoadError::DrainCalibration { iterations: 1 }));
    }
}
