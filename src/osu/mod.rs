use rosu_map::util::Pos;

pub mod attributes;
pub mod convert;
pub mod difficulty;
pub mod object;
pub mod performance;
pub mod strains;

pub(crate) const PLAYFIELD_BASE_SIZE: Pos = Pos { x: 512.0, y: 384.0 };

/// Diameter of a hit circle in osu!pixels for the given circle size.
pub fn circle_diameter(cs: f64) -> f64 {
    f64::max(0.0, (1.0 - 0.7 * (cs - 5.0) / 5.0) / 2.0 * 128.0)
}
