use crate::{model::hit_object::Pos, GameMods};

use super::{config::PlayConfig, input::Keys, rules::GameRules};

/// The audio clock a live session follows.
///
/// Times are in milliseconds. `position` is the playback position in map
/// time while `real_time` is a monotonic wall clock.
pub trait Clock {
    fn position(&self) -> f64;

    fn real_time(&self) -> f64;

    /// Length of the track in map time.
    fn length(&self) -> f64;

    fn is_ready(&self) -> bool {
        true
    }

    fn is_finished(&self) -> bool;

    /// Start playback once the lead-in is over.
    fn play(&mut self);

    /// Reload the track in an alternate mode. Returns whether it worked.
    fn reload(&mut self) -> bool {
        false
    }
}

/// A clock that only moves when told to.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ManualClock {
    pub position: f64,
    pub real_time: f64,
    pub length: f64,
    pub rate: f64,
    pub ready: bool,
    pub playing: bool,
}

impl ManualClock {
    pub fn new(length: f64, rate: f64) -> Self {
        Self {
            length,
            rate,
            ready: true,
            ..Self::default()
        }
    }

    /// Advance real time by `ms` and playback accordingly.
    pub fn advance(&mut self, ms: f64) {
        self.real_time += ms;

        if self.playing {
            self.position = (self.position + ms * self.rate).min(self.length);
        }
    }
}

impl Clock for ManualClock {
    fn position(&self) -> f64 {
        self.position
    }

    fn real_time(&self) -> f64 {
        self.real_time
    }

    fn length(&self) -> f64 {
        self.length
    }

    fn is_ready(&self) -> bool {
        self.ready
    }

    fn is_finished(&self) -> bool {
        self.position >= self.length
    }

    fn play(&mut self) {
        self.playing = true;
    }
}

/// Everything an object needs to know about the current frame.
pub(crate) struct FrameContext<'a> {
    pub(crate) now: f64,
    /// Real milliseconds since the previous frame.
    pub(crate) real_frame_ms: f64,
    pub(crate) cursor: Pos,
    pub(crate) keys: Keys,
    pub(crate) prev_key_was_key1: bool,
    pub(crate) paused: bool,
    pub(crate) rules: &'a GameRules,
    pub(crate) config: &'a PlayConfig,
    pub(crate) mods: &'a GameMods,
}

impl FrameContext<'_> {
    pub(crate) fn autoplay(&self) -> bool {
        self.mods.autoplay()
    }

    pub(crate) fn relax(&self) -> bool {
        self.mods.rx()
    }

    /// Whether spinners turn by themselves.
    pub(crate) fn auto_spin(&self) -> bool {
        self.mods.autoplay() || self.mods.ap() || self.mods.so()
    }

    pub(crate) fn distance_to(&self, pos: Pos) -> f64 {
        f64::from(self.cursor.distance(pos))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_waits_for_play() {
        let mut clock = ManualClock::new(1000.0, 1.5);

        clock.advance(100.0);
        assert!(clock.position().abs() < f64::EPSILON);

        clock.play();
        clock.advance(100.0);
        assert!((clock.position() - 150.0).abs() < 1e-9);
        assert!((clock.real_time() - 200.0).abs() < 1e-9);

        clock.advance(10_000.0);
        assert!(clock.is_finished());
    }
}
