use std::{
    collections::VecDeque,
    ops::{BitAnd, BitOr},
};

use crate::model::hit_object::Pos;

/// Held keys and mouse buttons as a bitmask.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Keys(u32);

impl Keys {
    pub const NONE: Self = Self(0);
    pub const M1: Self = Self(1);
    pub const M2: Self = Self(2);
    pub const K1: Self = Self(4);
    pub const K2: Self = Self(8);
    pub const SMOKE: Self = Self(16);

    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0 && other.0 != 0
    }

    /// A key press also sets its mouse button. Keep only the key.
    pub const fn normalized(self) -> Self {
        let mut bits = self.0;

        if bits & Self::K1.0 != 0 {
            bits &= !Self::M1.0;
        }

        if bits & Self::K2.0 != 0 {
            bits &= !Self::M2.0;
        }

        Self(bits)
    }

    /// First key or mouse button.
    pub const fn key1(self) -> bool {
        self.0 & (Self::K1.0 | Self::M1.0) != 0
    }

    /// Second key or mouse button.
    pub const fn key2(self) -> bool {
        self.0 & (Self::K2.0 | Self::M2.0) != 0
    }

    pub const fn any_held(self) -> bool {
        self.key1() || self.key2()
    }

    /// Keys that are held in `self` but were not in `prev`.
    pub const fn pressed_since(self, prev: Self) -> Self {
        Self(self.0 & !prev.0)
    }
}

impl BitOr for Keys {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        Self(self.0 | rhs.0)
    }
}

impl BitAnd for Keys {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self::Output {
        Self(self.0 & rhs.0)
    }
}

/// Cursor position and held keys at a point in map time.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ReplayFrame {
    pub time: f64,
    pub pos: Pos,
    pub keys: Keys,
}

impl ReplayFrame {
    pub const fn new(time: f64, x: f32, y: f32, keys: u32) -> Self {
        Self {
            time,
            pos: Pos { x, y },
            keys: Keys::from_bits(keys),
        }
    }
}

/// A press that no object has consumed yet.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Click {
    pub time: f64,
    pub pos: Pos,
}

/// Where cursor positions and key states come from.
///
/// The timeline pulls every frame up to the current time from its source and
/// turns rising key edges into clicks. Recorded and live input therefore
/// share the exact same judging path.
pub trait InputSource {
    /// Next frame with a time of at most `until`, if any.
    fn next_frame(&mut self, until: f64) -> Option<ReplayFrame>;

    /// Reposition the source for a seek to `time` and return the state the
    /// input was in at that time.
    fn seek(&mut self, time: f64) -> Option<ReplayFrame>;
}

/// Never produces any input.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoInput;

impl InputSource for NoInput {
    fn next_frame(&mut self, _: f64) -> Option<ReplayFrame> {
        None
    }

    fn seek(&mut self, _: f64) -> Option<ReplayFrame> {
        None
    }
}

/// Input fed by the host each frame, e.g. from a mouse and keyboard.
///
/// Every state passed to [`LiveInput::set`] is applied on the next update
/// and may be recorded to replay the session later.
#[derive(Clone, Debug, Default)]
pub struct LiveInput {
    pending: VecDeque<ReplayFrame>,
    recorded: Vec<ReplayFrame>,
    record: bool,
}

impl LiveInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep every applied frame so the session can be replayed.
    pub fn recording() -> Self {
        Self {
            record: true,
            ..Self::default()
        }
    }

    /// Queue the current device state.
    pub fn set(&mut self, time: f64, pos: Pos, keys: Keys) {
        self.pending.push_back(ReplayFrame { time, pos, keys });
    }

    /// Frames applied so far if recording is enabled.
    pub fn recorded(&self) -> &[ReplayFrame] {
        &self.recorded
    }

    pub fn take_recorded(&mut self) -> Vec<ReplayFrame> {
        std::mem::take(&mut self.recorded)
    }
}

impl InputSource for LiveInput {
    fn next_frame(&mut self, until: f64) -> Option<ReplayFrame> {
        let frame = *self.pending.front()?;

        if frame.time > until {
            return None;
        }

        self.pending.pop_front();

        if self.record {
            self.recorded.push(frame);
        }

        Some(frame)
    }

    fn seek(&mut self, _: f64) -> Option<ReplayFrame> {
        self.pending.clear();

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalization_prefers_keys() {
        let keys = Keys::from_bits(1 | 4 | 2);

        assert_eq!(keys.normalized(), Keys::K1 | Keys::M2);
        assert!(keys.normalized().key1());
        assert!(keys.normalized().key2());
        assert!(!Keys::SMOKE.any_held());
    }

    #[test]
    fn rising_edges() {
        let prev = Keys::K1;
        let now = Keys::K1 | Keys::K2;

        assert_eq!(now.pressed_since(prev), Keys::K2);
        assert_eq!(prev.pressed_since(now), Keys::NONE);
    }

    #[test]
    fn live_input_applies_frames_in_time() {
        let mut input = LiveInput::recording();

        input.set(10.0, Pos::new(1.0, 2.0), Keys::M1);
        input.set(20.0, Pos::new(1.0, 2.0), Keys::NONE);

        assert!(input.next_frame(15.0).is_some());
        assert!(input.next_frame(15.0).is_none());
        assert!(input.next_frame(20.0).is_some());
        assert_eq!(input.recorded().len(), 2);
    }
}
