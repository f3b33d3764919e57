/// A play session could not be started.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("the map has no hit objects")]
    NoHitObjects,
    #[error("the map has no timing points")]
    NoTimingPoints,
    #[error("hit object {idx} starts before its predecessor")]
    UnsortedHitObjects { idx: usize },
    #[error("the map has {count} hit objects, at most {max} are supported")]
    TooManyHitObjects { count: usize, max: usize },
    #[error("slider {idx} would produce {count} scoring times, at most {max} are supported")]
    TooManyScoringTimes { idx: usize, count: usize, max: usize },
    #[error("drain rate calibration did not converge after {iterations} iterations")]
    DrainCalibration { iterations: usize },
}

impl LoadError {
    /// Stable numeric code for callers that only carry integers.
    pub const fn code(&self) -> i32 {
        match self {
            Self::UnsortedHitObjects { .. } => 2,
            Self::NoTimingPoints => 3,
            Self::NoHitObjects => 4,
            Self::TooManyHitObjects { .. } | Self::TooManyScoringTimes { .. } => 5,
            Self::DrainCalibration { .. } => 7,
        }
    }
}

/// A running session had to be stopped.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("the clock was not ready after {waited_ms}ms")]
    ClockNotReady { waited_ms: f64 },
    #[error("the clock was still not ready after reloading it")]
    ClockReloadFailed,
}

impl SessionError {
    /// Stable numeric code for callers that only carry integers.
    pub const fn code(&self) -> i32 {
        match self {
            Self::ClockNotReady { .. } => 10,
            Self::ClockReloadFailed => 11,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable() {
        assert_eq!(LoadError::NoHitObjects.code(), 4);
        assert_eq!(LoadError::NoTimingPoints.code(), 3);
        assert_eq!(LoadError::DrainCalibration { iterations: 4 }.code(), 7);
        assert_eq!(SessionError::ClockReloadFailed.code(), 11);
    }

    #[test]
    fn messages() {
        let err = LoadError::TooManyHitObjects {
            count: 50_000,
            max: 40_000,
        };

        assert_eq!(
            err.to_string(),
            "the map has 50000 hit objects, at most 40000 are supported"
        );
    }
}
