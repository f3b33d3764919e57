/// Timing-related info about this control point.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TimingPoint {
    pub time: f64,
    pub beat_len: f64,
}

impl TimingPoint {
    pub const DEFAULT_BEAT_LEN: f64 = 60_000.0 / 60.0;

    pub fn new(time: f64, beat_len: f64) -> Self {
        Self {
            time,
            beat_len: beat_len.clamp(6.0, 60_000.0),
        }
    }

    pub fn bpm(&self) -> f64 {
        60_000.0 / self.beat_len
    }
}

impl Default for TimingPoint {
    fn default() -> Self {
        Self {
            time: 0.0,
            beat_len: Self::DEFAULT_BEAT_LEN,
        }
    }
}

/// Slider velocity changes.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct DifficultyPoint {
    pub time: f64,
    pub slider_velocity: f64,
}

impl DifficultyPoint {
    pub const DEFAULT_SLIDER_VELOCITY: f64 = 1.0;

    pub fn new(time: f64, slider_velocity: f64) -> Self {
        Self {
            time,
            slider_velocity: slider_velocity.clamp(0.1, 10.0),
        }
    }

    /// Creates a point from the raw negative beat length of an inherited
    /// timing line, e.g. `-50.0` for double velocity.
    pub fn from_inherited_beat_len(time: f64, beat_len: f64) -> Self {
        let velocity = if beat_len < 0.0 { -100.0 / beat_len } else { 1.0 };

        Self::new(time, velocity)
    }
}

impl Default for DifficultyPoint {
    fn default() -> Self {
        Self {
            time: 0.0,
            slider_velocity: Self::DEFAULT_SLIDER_VELOCITY,
        }
    }
}

/// The timing point that is active at `time`.
///
/// Times before the first point resolve to the first point.
pub fn timing_point_at(points: &[TimingPoint], time: f64) -> Option<&TimingPoint> {
    let i = points
        .binary_search_by(|probe| probe.time.total_cmp(&time))
        .unwrap_or_else(|i| i.saturating_sub(1));

    points.get(i)
}

/// The difficulty point that is active at `time`, if any has started yet.
pub fn difficulty_point_at(points: &[DifficultyPoint], time: f64) -> Option<&DifficultyPoint> {
    points
        .binary_search_by(|probe| probe.time.total_cmp(&time))
        .map_or_else(|i| i.checked_sub(1), Some)
        .map(|i| &points[i])
}
