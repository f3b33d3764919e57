use std::{
    fmt::{Debug, Formatter, Result as FmtResult},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use crate::{
    model::{beatmap::Beatmap, mods::GameMods},
    osu::{attributes::OsuDifficultyAttributes, strains::OsuStrains},
};

pub mod object;
pub mod skills;

/// The calculation was cancelled through its cancel flag.
///
/// Partial results are never handed out so there is nothing to discard.
#[derive(Copy, Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("difficulty calculation was cancelled")]
pub struct Cancelled;

impl Cancelled {
    /// Stable numeric code for callers that only carry integers.
    pub const fn code(self) -> i32 {
        6
    }
}

/// A value that may or may not already account for mods.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ModsDependent {
    pub value: f32,
    pub with_mods: bool,
}

impl ModsDependent {
    pub const fn new(value: f32) -> Self {
        Self {
            value,
            with_mods: false,
        }
    }
}

/// Difficulty calculator settings.
///
/// # Example
///
/// ```
/// use rosu_play::{Beatmap, Difficulty};
///
/// let map = Beatmap::default();
///
/// let attrs = Difficulty::new()
///     .mods(8_u32 + 64) // HDDT
///     .passed_objects(100)
///     .calculate(&map)
///     .unwrap();
///
/// assert_eq!(attrs.stars, 0.0);
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
#[must_use]
pub struct Difficulty {
    mods: GameMods,
    passed_objects: Option<u32>,
    clock_rate: Option<f64>,
    ar: Option<ModsDependent>,
    cs: Option<ModsDependent>,
    hp: Option<ModsDependent>,
    od: Option<ModsDependent>,
    cancel: Option<CancelFlag>,
}

/// Shared flag that aborts a running calculation once set.
#[derive(Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn reset(&self) {
        self.0.store(false, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

impl PartialEq for CancelFlag {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Debug for CancelFlag {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_tuple("CancelFlag")
            .field(&self.is_cancelled())
            .finish()
    }
}

impl Difficulty {
    /// Create a new difficulty calculator.
    pub const fn new() -> Self {
        Self {
            mods: GameMods::DEFAULT,
            passed_objects: None,
            clock_rate: None,
            ar: None,
            cs: None,
            hp: None,
            od: None,
            cancel: None,
        }
    }

    /// Specify mods.
    ///
    /// Accepts legacy bitflags or [`GameMods`].
    pub fn mods(self, mods: impl Into<GameMods>) -> Self {
        Self {
            mods: mods.into(),
            ..self
        }
    }

    /// Amount of passed objects for partial plays, e.g. a fail.
    ///
    /// The result equals a full calculation over the first `passed_objects`
    /// hit objects.
    pub const fn passed_objects(mut self, passed_objects: u32) -> Self {
        self.passed_objects = Some(passed_objects);

        self
    }

    /// Adjust the clock rate used in the calculation.
    ///
    /// If none is specified, it will take the clock rate based on the mods
    /// i.e. 1.5 for DT, 0.75 for HT and 1.0 otherwise.
    ///
    /// | Minimum | Maximum |
    /// | :-----: | :-----: |
    /// | 0.01    | 100     |
    pub fn clock_rate(self, clock_rate: f64) -> Self {
        Self {
            clock_rate: Some(clock_rate.clamp(0.01, 100.0)),
            ..self
        }
    }

    /// Override a beatmap's set AR.
    ///
    /// `with_mods` determines if the given value should be used before
    /// or after accounting for mods, e.g. on `true` the value will be
    /// used as is and on `false` it will be modified based on the mods.
    pub fn ar(self, ar: f32, with_mods: bool) -> Self {
        Self {
            ar: Some(ModsDependent {
                value: ar.clamp(-20.0, 20.0),
                with_mods,
            }),
            ..self
        }
    }

    /// Override a beatmap's set CS.
    ///
    /// See [`Difficulty::ar`] for `with_mods`.
    pub fn cs(self, cs: f32, with_mods: bool) -> Self {
        Self {
            cs: Some(ModsDependent {
                value: cs.clamp(-20.0, 20.0),
                with_mods,
            }),
            ..self
        }
    }

    /// Override a beatmap's set HP.
    ///
    /// See [`Difficulty::ar`] for `with_mods`.
    pub fn hp(self, hp: f32, with_mods: bool) -> Self {
        Self {
            hp: Some(ModsDependent {
                value: hp.clamp(-20.0, 20.0),
                with_mods,
            }),
            ..self
        }
    }

    /// Override a beatmap's set OD.
    ///
    /// See [`Difficulty::ar`] for `with_mods`.
    pub fn od(self, od: f32, with_mods: bool) -> Self {
        Self {
            od: Some(ModsDependent {
                value: od.clamp(-20.0, 20.0),
                with_mods,
            }),
            ..self
        }
    }

    /// Poll the given flag between objects and abort with [`Cancelled`] once
    /// it is set.
    pub fn cancel_flag(self, flag: CancelFlag) -> Self {
        Self {
            cancel: Some(flag),
            ..self
        }
    }

    /// Perform the difficulty calculation.
    pub fn calculate(&self, map: &Beatmap) -> Result<OsuDifficultyAttributes, Cancelled> {
        crate::osu::difficulty::difficulty(self, map)
    }

    /// Perform the difficulty calculation but instead of evaluating the skill
    /// strains, return them as is.
    ///
    /// Suitable to plot the difficulty of a map over time.
    pub fn strains(&self, map: &Beatmap) -> Result<OsuStrains, Cancelled> {
        crate::osu::strains::strains(self, map)
    }

    pub const fn get_mods(&self) -> &GameMods {
        &self.mods
    }

    pub fn get_clock_rate(&self) -> f64 {
        self.clock_rate
            .unwrap_or_else(|| self.mods.clock_rate())
    }

    pub fn get_passed_objects(&self) -> usize {
        self.passed_objects.map_or(usize::MAX, |n| n as usize)
    }

    pub const fn get_ar(&self) -> Option<ModsDependent> {
        self.ar
    }

    pub const fn get_cs(&self) -> Option<ModsDependent> {
        self.cs
    }

    pub const fn get_hp(&self) -> Option<ModsDependent> {
        self.hp
    }

    pub const fn get_od(&self) -> Option<ModsDependent> {
        self.od
    }

    /// Whether the attached cancel flag has been set.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancelFlag::is_cancelled)
    }

    /// Returns `Err(Cancelled)` if the cancel flag has been set.
    pub(crate) fn check_cancelled(&self) -> Result<(), Cancelled> {
        if self.is_cancelled() {
            Err(Cancelled)
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_rate_falls_back_to_mods() {
        let difficulty = Difficulty::new().mods(64_u32);
        assert!((difficulty.get_clock_rate() - 1.5).abs() < f64::EPSILON);

        let difficulty = difficulty.clock_rate(1.2);
        assert!((difficulty.get_clock_rate() - 1.2).abs() < f64::EPSILON);
    }

    #[test]
    fn cancel_flag_is_shared() {
        let flag = CancelFlag::new();
        let difficulty = Difficulty::new().cancel_flag(flag.clone());

        assert!(difficulty.check_cancelled().is_ok());
        flag.cancel();
        assert_eq!(difficulty.check_cancelled(), Err(Cancelled));
    }
}
