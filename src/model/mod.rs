/// Beatmap types.
pub mod beatmap;

/// Timing and difficulty control points.
pub mod control_point;

/// Hit objects as they appear in a map.
pub mod hit_object;

/// Game mods.
pub mod mods;
