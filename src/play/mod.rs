pub use self::{
    config::{NoteLock, PlayConfig},
    context::{Clock, ManualClock},
    error::{LoadError, SessionError},
    events::{PlayEvent, SoundCue},
    input::{InputSource, Keys, LiveInput, NoInput, ReplayFrame},
    replay::{ReplayInput, ReplayParseError},
    result::{HitResult, HitResultEvent},
    tally::Tally,
    timeline::{FrameState, Skip, Timeline},
};

/// Tunables of a play session.
pub mod config;

/// Clocks driving live sessions.
pub mod context;

/// Health drain calibration.
pub mod drain;

pub mod error;
pub mod events;
pub mod health;
pub mod input;

/// Recorded replay frames.
pub mod replay;

pub mod result;

/// Hit windows and health values derived from a map's attributes.
pub mod rules;

pub mod tally;
pub mod timeline;

/// Re-simulation of recorded scores.
pub mod verify;

mod notelock;
mod object;
mod scoring;
