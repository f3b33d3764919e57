use crate::{any::difficulty::skills::StrainSkill, model::beatmap::BeatmapAttributes};

use self::{aim::Aim, speed::Speed};

use super::object::OsuDifficultyObject;

pub mod aim;
pub mod speed;
pub mod strain;

#[derive(Clone)]
pub struct OsuSkills {
    pub aim: Aim,
    pub aim_no_sliders: Aim,
    pub speed: Speed,
}

impl OsuSkills {
    pub fn new(map_attrs: &BeatmapAttributes) -> Self {
        // Full width of the 300 window in real time
        let hit_window = 2.0 * map_attrs.hit_windows.great / map_attrs.clock_rate;

        Self {
            aim: Aim::new(true),
            aim_no_sliders: Aim::new(false),
            speed: Speed::new(hit_window),
        }
    }

    pub fn process(&mut self, curr: &OsuDifficultyObject<'_>, objects: &[OsuDifficultyObject<'_>]) {
        self.aim.process(curr, objects);
        self.aim_no_sliders.process(curr, objects);
        self.speed.process(curr, objects);
    }
}
