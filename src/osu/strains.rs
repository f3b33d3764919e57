use crate::{any::difficulty::skills::StrainSkill, Beatmap, Cancelled, Difficulty};

use super::difficulty::{skills::OsuSkills, DifficultyValues};

/// The result of calculating the strains on a osu! map.
///
/// Suitable to plot the difficulty of a map over time.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct OsuStrains {
    /// Strain peaks of the aim skill.
    pub aim: Vec<f64>,
    /// Strain peaks of the aim skill without sliders.
    pub aim_no_sliders: Vec<f64>,
    /// Strain peaks of the speed skill.
    pub speed: Vec<f64>,
    /// Aim strain of each processed object.
    pub object_aim: Vec<f64>,
    /// Aim strain without sliders of each processed object.
    pub object_aim_no_sliders: Vec<f64>,
    /// Speed strain of each processed object, rhythm included.
    pub object_speed: Vec<f64>,
}

impl OsuStrains {
    /// Time between two strains in ms.
    pub const SECTION_LEN: f64 = 400.0;
}

pub fn strains(difficulty: &Difficulty, map: &Beatmap) -> Result<OsuStrains, Cancelled> {
    let DifficultyValues {
        skills:
            OsuSkills {
                aim,
                aim_no_sliders,
                speed,
            },
        attrs: _,
    } = DifficultyValues::calculate(difficulty, map)?;

    Ok(OsuStrains {
        object_aim: aim.object_strains().to_vec(),
        object_aim_no_sliders: aim_no_sliders.object_strains().to_vec(),
        object_speed: speed.object_strains().to_vec(),
        aim: aim.into_current_strain_peaks().into_vec(),
        aim_no_sliders: aim_no_sliders.into_current_strain_peaks().into_vec(),
        speed: speed.into_current_strain_peaks().into_vec(),
    })
}
