pub use self::difficulty::{CancelFlag, Cancelled, Difficulty, ModsDependent};
pub use crate::osu::performance::OsuPerformance as Performance;

pub mod difficulty;
