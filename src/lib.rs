//! Judgement, health, difficulty, and performance core for [osu!] standard plays.
//!
//! ## Description
//!
//! `rosu-play` decides frame by frame which hit objects of a map have been
//! hit or missed, keeps track of the player's health, and calculates star
//! ratings as well as performance points for a play.
//!
//! The same timeline drives live play and recorded replays so that a replay
//! reproduces the judgements of the original play exactly.
//!
//! ## Usage
//!
//! ```
//! use rosu_play::{
//!     model::{beatmap::Beatmap, control_point::TimingPoint, hit_object::{HitObject, HitObjectKind, Pos}},
//!     play::{config::PlayConfig, input::ReplayFrame, replay::ReplayInput, timeline::Timeline},
//!     Difficulty, GameMods, Performance,
//! };
//!
//! let mut map = Beatmap::default();
//! map.timing_points.push(TimingPoint::new(0.0, 500.0));
//!
//! for i in 0..4 {
//!     map.hit_objects.push(HitObject {
//!         pos: Pos::new(100.0 + 50.0 * i as f32, 192.0),
//!         start_time: 1000.0 + 300.0 * f64::from(i),
//!         new_combo: i == 0,
//!         kind: HitObjectKind::Circle,
//!     });
//! }
//!
//! // Difficulty and performance
//! let attrs = Difficulty::new().calculate(&map).unwrap();
//! let pp = Performance::new(attrs.clone()).combo(4).calculate().pp;
//! assert!(pp > 0.0);
//!
//! // Simulate a replay that clicks every circle on time
//! let frames: Vec<ReplayFrame> = map
//!     .hit_objects
//!     .iter()
//!     .flat_map(|h| {
//!         [
//!             ReplayFrame::new(h.start_time, h.pos.x, h.pos.y, 1),
//!             ReplayFrame::new(h.start_time + 50.0, h.pos.x, h.pos.y, 0),
//!         ]
//!     })
//!     .collect();
//!
//! let mut timeline = Timeline::new(&map, GameMods::default(), PlayConfig::default())
//!     .unwrap()
//!     .with_input(ReplayInput::new(frames));
//!
//! timeline.simulate_to_end();
//! assert_eq!(timeline.tally().n300, 4);
//! ```
//!
//! [osu!]: https://osu.ppy.sh/home

#![deny(rustdoc::broken_intra_doc_links)]
#![warn(clippy::missing_const_for_fn, clippy::pedantic)]
#![allow(
    clippy::missing_errors_doc,
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::struct_excessive_bools,
    clippy::match_same_arms,
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss,
    clippy::explicit_iter_loop,
    clippy::similar_names,
    clippy::cast_possible_wrap
)]

#[doc(inline)]
pub use self::{
    any::{Cancelled, Difficulty, Performance},
    model::{beatmap::Beatmap, mods::GameMods},
};

#[macro_use]
mod util;

/// Calculation entry points.
pub mod any;

/// Types used in and around this crate.
pub mod model;

/// osu!standard objects, difficulty, and performance.
pub mod osu;

/// Judgements, health, and the play timeline.
pub mod play;

/// Work that runs off the frame thread.
pub mod background;
