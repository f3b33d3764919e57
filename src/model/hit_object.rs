use std::cmp::Ordering;

use rosu_map::section::{
    general::GameMode,
    hit_objects::{BorrowedCurve, CurveBuffers},
};

pub use rosu_map::{
    section::hit_objects::{PathControlPoint, PathType},
    util::Pos,
};

/// A hit object as it appears in the map file.
#[derive(Clone, Debug, PartialEq)]
pub struct HitObject {
    pub pos: Pos,
    pub start_time: f64,
    /// Whether this object starts a new combo.
    pub new_combo: bool,
    pub kind: HitObjectKind,
}

impl HitObject {
    /// Whether the hitobject is a circle.
    pub const fn is_circle(&self) -> bool {
        matches!(&self.kind, HitObjectKind::Circle)
    }

    /// Whether the hitobject is a slider.
    pub const fn is_slider(&self) -> bool {
        matches!(&self.kind, HitObjectKind::Slider(_))
    }

    /// Whether the hitobject is a spinner.
    pub const fn is_spinner(&self) -> bool {
        matches!(&self.kind, HitObjectKind::Spinner(_))
    }
}

impl PartialOrd for HitObject {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.start_time.partial_cmp(&other.start_time)
    }
}

/// Additional data for a [`HitObject`].
#[derive(Clone, Debug, PartialEq)]
pub enum HitObjectKind {
    Circle,
    Slider(Slider),
    Spinner(Spinner),
}

/// A slider.
#[derive(Clone, Debug, PartialEq)]
pub struct Slider {
    /// Pixel length of the slider path.
    pub expected_dist: Option<f64>,
    pub repeats: usize,
    /// Control points relative to the slider head.
    pub control_points: Box<[PathControlPoint]>,
}

impl Slider {
    /// The amount of spans of the slider.
    pub const fn span_count(&self) -> usize {
        self.repeats + 1
    }

    pub(crate) fn curve<'a>(&self, bufs: &'a mut CurveBuffers) -> BorrowedCurve<'a> {
        BorrowedCurve::new(GameMode::Osu, &self.control_points, self.expected_dist, bufs)
    }
}

/// A spinner.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Spinner {
    pub duration: f64,
}
