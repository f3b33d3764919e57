pub use rosu_map::section::events::BreakPeriod;

use crate::play::error::LoadError;

use super::{
    control_point::{DifficultyPoint, TimingPoint},
    hit_object::HitObject,
};

pub use self::attributes::{BeatmapAttributes, BeatmapAttributesBuilder, HitWindows};

mod attributes;

/// All beatmap data that is relevant for judging and scoring.
///
/// Parsing `.osu` files is left to the caller, e.g. through `rosu-map`.
#[derive(Clone, Debug, PartialEq)]
pub struct Beatmap {
    pub version: i32,

    // General
    pub stack_leniency: f32,

    // Difficulty
    pub ar: f32,
    pub cs: f32,
    pub hp: f32,
    pub od: f32,
    pub slider_multiplier: f64,
    pub slider_tick_rate: f64,

    // Events
    pub breaks: Vec<BreakPeriod>,

    // TimingPoints
    pub timing_points: Vec<TimingPoint>,
    pub difficulty_points: Vec<DifficultyPoint>,

    // HitObjects
    pub hit_objects: Vec<HitObject>,
}

impl Beatmap {
    /// Maps with more hit objects than this are refused.
    pub const MAX_HIT_OBJECTS: usize = 40_000;

    /// Sliders with more scoring times than this are refused.
    pub const MAX_SLIDER_SCORING_TIMES: usize = 32_768;

    /// Returns a [`BeatmapAttributesBuilder`] to calculate modified beatmap
    /// attributes.
    pub fn attributes(&self) -> BeatmapAttributesBuilder {
        BeatmapAttributesBuilder::from(self)
    }

    /// Check whether the map can be played at all.
    pub fn check(&self) -> Result<(), LoadError> {
        if self.hit_objects.is_empty() {
            return Err(LoadError::NoHitObjects);
        }

        if self.hit_objects.len() > Self::MAX_HIT_OBJECTS {
            return Err(LoadError::TooManyHitObjects {
                count: self.hit_objects.len(),
                max: Self::MAX_HIT_OBJECTS,
            });
        }

        if self.timing_points.is_empty() {
            return Err(LoadError::NoTimingPoints);
        }

        let unsorted = self
            .hit_objects
            .windows(2)
            .position(|pair| pair[1].start_time < pair[0].start_time);

        if let Some(idx) = unsorted {
            return Err(LoadError::UnsortedHitObjects { idx: idx + 1 });
        }

        Ok(())
    }

    /// Whether `time` lies within one of the map's breaks.
    pub fn is_break(&self, time: f64) -> bool {
        self.breaks
            .iter()
            .any(|b| b.start_time <= time && time <= b.end_time)
    }
}

impl Default for Beatmap {
    fn default() -> Self {
        Self {
            version: 14,
            stack_leniency: 0.7,
            ar: 5.0,
            cs: 5.0,
            hp: 5.0,
            od: 5.0,
            slider_multiplier: 1.4,
            slider_tick_rate: 1.0,
            breaks: Vec::new(),
            timing_points: Vec::new(),
            difficulty_points: Vec::new(),
            hit_objects: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::model::hit_object::{HitObjectKind, Pos};

    use super::*;

    fn circle(start_time: f64) -> HitObject {
        HitObject {
            pos: Pos::new(256.0, 192.0),
            start_time,
            new_combo: false,
            kind: HitObjectKind::Circle,
        }
    }

    #[test]
    fn check_structure() {
        let mut map = Beatmap::default();
        assert!(matches!(map.check(), Err(LoadError::NoHitObjects)));

        map.hit_objects.push(circle(1000.0));
        assert!(matches!(map.check(), Err(LoadError::NoTimingPoints)));

        map.timing_points.push(TimingPoint::new(0.0, 500.0));
        assert!(map.check().is_ok());

        map.hit_objects.push(circle(500.0));
        assert!(matches!(
            map.check(),
            Err(LoadError::UnsortedHitObjects { idx: 1 })
        ));
    }

    #[test]
    fn breaks_are_inclusive() {
        let map = Beatmap {
            breaks: vec![BreakPeriod {
                start_time: 1000.0,
                end_time: 3000.0,
            }],
            ..Default::default()
        };

        assert!(map.is_break(1000.0));
        assert!(map.is_break(3000.0));
        assert!(!map.is_break(3000.5));
    }
}
