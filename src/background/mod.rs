pub use self::{
    live_pp::{LivePp, LivePpWorker, PpSnapshot},
    star_cache::{LoadStage, StarCache, StarCacheLoader},
    verifier::{ScoreJob, ScoreReport, ScoreVerifier},
};

mod live_pp;
mod star_cache;
mod verifier;
