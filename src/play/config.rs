/// How unfinished objects restrict clicks on later objects.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum NoteLock {
    /// Finishing an object through a click force-misses every earlier
    /// unfinished object that it does not overlap.
    Own,
    /// Every unfinished object blocks all later objects. Overlapping
    /// objects within the 2B tolerance are let through once the blocking
    /// slider head or spinner has started.
    #[default]
    Stable,
    /// An object blocks later objects only until its start time has passed
    /// or, for sliders, until its head has been judged. Spinners never
    /// block.
    Lazer,
}

/// Every tunable of a play session.
///
/// The config is frozen once a [`Timeline`] is created.
///
/// ```
/// use rosu_play::play::config::{NoteLock, PlayConfig};
///
/// let config = PlayConfig::new()
///     .note_lock(NoteLock::Lazer)
///     .universal_offset(-15.0)
///     .drain_kill(false);
///
/// assert_eq!(config.get_note_lock(), NoteLock::Lazer);
/// ```
///
/// [`Timeline`]: crate::play::timeline::Timeline
#[derive(Clone, Debug, PartialEq)]
#[must_use]
pub struct PlayConfig {
    pub(crate) note_lock: NoteLock,
    pub(crate) tolerance_2b: f64,
    pub(crate) early_note_time: f64,
    pub(crate) end_delay: f64,
    pub(crate) end_skip: bool,
    pub(crate) skip_time: f64,
    pub(crate) relax_offset: f64,
    pub(crate) slider_end_inside_check_offset: f64,
    pub(crate) timing_point_offset: f64,
    pub(crate) universal_offset: f64,
    pub(crate) universal_offset_hardcoded: f64,
    pub(crate) local_offset: f64,
    pub(crate) online_offset: f64,
    pub(crate) old_map_offset: f64,
    pub(crate) old_map_version: i32,
    pub(crate) drain_kill: bool,
    pub(crate) sd_restart: bool,
    pub(crate) nightmare: bool,
    pub(crate) fail_duration: f64,
    pub(crate) ez_retries: u8,
    pub(crate) section_min_gap: f64,
    pub(crate) warning_min_gap: f64,
    pub(crate) calibration_iterations: usize,
    pub(crate) clock_grace: f64,
}

impl PlayConfig {
    /// Create a new config with default values.
    pub const fn new() -> Self {
        Self {
            note_lock: NoteLock::Stable,
            tolerance_2b: 3.0,
            early_note_time: 1500.0,
            end_delay: 750.0,
            end_skip: true,
            skip_time: 5000.0,
            relax_offset: -12.0,
            slider_end_inside_check_offset: 36.0,
            timing_point_offset: 5.0,
            universal_offset: 0.0,
            universal_offset_hardcoded: 0.0,
            local_offset: 0.0,
            online_offset: 0.0,
            old_map_offset: 24.0,
            old_map_version: 5,
            drain_kill: true,
            sd_restart: false,
            nightmare: false,
            fail_duration: 2.25,
            ez_retries: 2,
            section_min_gap: 2880.0,
            warning_min_gap: 1000.0,
            calibration_iterations: 1000,
            clock_grace: 100.0,
        }
    }

    /// Note-lock variant. Defaults to [`NoteLock::Stable`].
    pub const fn note_lock(mut self, note_lock: NoteLock) -> Self {
        self.note_lock = note_lock;

        self
    }

    /// Milliseconds after the end of a slider or spinner within which the
    /// next object still counts as overlapping for [`NoteLock::Stable`].
    pub const fn tolerance_2b(mut self, tolerance: f64) -> Self {
        self.tolerance_2b = tolerance;

        self
    }

    /// Artificial lead-in in milliseconds if the first object starts
    /// earlier than this.
    pub const fn early_note_time(mut self, ms: f64) -> Self {
        self.early_note_time = ms;

        self
    }

    /// Milliseconds after the end of the last object until the session ends.
    pub const fn end_delay(mut self, ms: f64) -> Self {
        self.end_delay = ms;

        self
    }

    /// Whether the session ends after the last object instead of waiting
    /// for the clock to finish.
    pub const fn end_skip(mut self, end_skip: bool) -> Self {
        self.end_skip = end_skip;

        self
    }

    /// Minimum gap in milliseconds until the next object for a section to
    /// be skippable.
    pub const fn skip_time(mut self, ms: f64) -> Self {
        self.skip_time = ms;

        self
    }

    /// Offset in milliseconds relative to an object's start at which relax
    /// starts hitting it.
    pub const fn relax_offset(mut self, ms: f64) -> Self {
        self.relax_offset = ms;

        self
    }

    /// How many milliseconds before a slider's end the cursor must still be
    /// tracking.
    pub const fn slider_end_inside_check_offset(mut self, ms: f64) -> Self {
        self.slider_end_inside_check_offset = ms;

        self
    }

    /// Lookahead in milliseconds when resolving the active timing point.
    pub const fn timing_point_offset(mut self, ms: f64) -> Self {
        self.timing_point_offset = ms;

        self
    }

    /// User offset in milliseconds, scaled by the clock rate.
    pub const fn universal_offset(mut self, ms: f64) -> Self {
        self.universal_offset = ms;

        self
    }

    /// Fixed offset in milliseconds that compensates the audio backend.
    pub const fn universal_offset_hardcoded(mut self, ms: f64) -> Self {
        self.universal_offset_hardcoded = ms;

        self
    }

    /// Offset in milliseconds the player stored for this map.
    pub const fn local_offset(mut self, ms: f64) -> Self {
        self.local_offset = ms;

        self
    }

    /// Offset in milliseconds published for this map.
    pub const fn online_offset(mut self, ms: f64) -> Self {
        self.online_offset = ms;

        self
    }

    /// Flat offset in milliseconds for maps with a format version below
    /// `version`.
    pub const fn old_map_offset(mut self, ms: f64, version: i32) -> Self {
        self.old_map_offset = ms;
        self.old_map_version = version;

        self
    }

    /// Whether failing ends the play.
    ///
    /// If disabled, the player is only marked as dead and can keep playing.
    pub const fn drain_kill(mut self, drain_kill: bool) -> Self {
        self.drain_kill = drain_kill;

        self
    }

    /// Whether sudden death requests a restart instead of failing.
    pub const fn sd_restart(mut self, sd_restart: bool) -> Self {
        self.sd_restart = sd_restart;

        self
    }

    /// Whether clicks that no object consumed count as slider breaks.
    pub const fn nightmare(mut self, nightmare: bool) -> Self {
        self.nightmare = nightmare;

        self
    }

    /// Duration of the fail animation in seconds.
    pub const fn fail_duration(mut self, secs: f64) -> Self {
        self.fail_duration = secs;

        self
    }

    /// How often easy rescues the player from failing.
    pub const fn ez_retries(mut self, retries: u8) -> Self {
        self.ez_retries = retries;

        self
    }

    /// Minimum gap in milliseconds for section pass/fail flashes.
    pub const fn section_min_gap(mut self, ms: f64) -> Self {
        self.section_min_gap = ms;

        self
    }

    /// Minimum gap in milliseconds for warning arrows.
    pub const fn warning_min_gap(mut self, ms: f64) -> Self {
        self.warning_min_gap = ms;

        self
    }

    /// Upper bound of drain rate calibration attempts.
    pub const fn calibration_iterations(mut self, iterations: usize) -> Self {
        self.calibration_iterations = iterations;

        self
    }

    /// Real milliseconds the clock may stay not ready before it is
    /// reloaded or the session stops.
    pub const fn clock_grace(mut self, ms: f64) -> Self {
        self.clock_grace = ms;

        self
    }

    pub const fn get_note_lock(&self) -> NoteLock {
        self.note_lock
    }

    pub const fn get_end_delay(&self) -> f64 {
        self.end_delay
    }

    pub const fn get_drain_kill(&self) -> bool {
        self.drain_kill
    }

    /// Sum of all offsets applied to the clock position.
    pub(crate) fn total_offset(&self, clock_rate: f64, map_version: i32) -> f64 {
        let old_map = if map_version < self.old_map_version {
            self.old_map_offset
        } else {
            0.0
        };

        self.universal_offset * clock_rate + self.universal_offset_hardcoded
            - self.local_offset
            - self.online_offset
            - old_map
    }
}

impl Default for PlayConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = PlayConfig::default();

        assert_eq!(config.get_note_lock(), NoteLock::Stable);
        assert!((config.tolerance_2b - 3.0).abs() < f64::EPSILON);
        assert!((config.get_end_delay() - 750.0).abs() < f64::EPSILON);
        assert!(config.get_drain_kill());
        assert_eq!(config.ez_retries, 2);
    }

    #[test]
    fn offset_chain() {
        let config = PlayConfig::new()
            .universal_offset(10.0)
            .universal_offset_hardcoded(-5.0)
            .local_offset(3.0)
            .online_offset(2.0);

        assert!((config.total_offset(1.5, 14) - 5.0).abs() < 1e-9);

        // old maps additionally shift by the flat offset
        assert!((config.total_offset(1.5, 4) - (5.0 - 24.0)).abs() < 1e-9);
    }
}
