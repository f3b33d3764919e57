use std::fmt::{Debug, Formatter, Result as FmtResult};

use rosu_mods::GameModsLegacy;

/// Collection of game mods.
///
/// Can be created from legacy bitflags or [`rosu_mods::GameModsLegacy`].
///
/// ```
/// use rosu_play::GameMods;
/// use rosu_mods::GameModsLegacy;
///
/// let int = GameMods::from(64_u32 + 8);
/// let legacy = GameMods::from(GameModsLegacy::Hidden | GameModsLegacy::DoubleTime);
///
/// assert_eq!(int, legacy);
/// ```
#[derive(Copy, Clone, PartialEq, Eq)]
pub struct GameMods {
    inner: GameModsLegacy,
}

/// How hit object positions are mirrored.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Reflection {
    None,
    Vertical,
    Horizontal,
}

macro_rules! mod_checks {
    ( $( $fn:ident => $variant:ident, )* ) => {
        impl GameMods {
            $(
                pub fn $fn(&self) -> bool {
                    self.inner.contains(GameModsLegacy::$variant)
                }
            )*
        }
    };
}

mod_checks! {
    nf => NoFail,
    ez => Easy,
    td => TouchDevice,
    hd => Hidden,
    hr => HardRock,
    sd => SuddenDeath,
    dt => DoubleTime,
    rx => Relax,
    ht => HalfTime,
    nc => Nightcore,
    fl => Flashlight,
    so => SpunOut,
    ap => Autopilot,
    pf => Perfect,
    autoplay => Autoplay,
    v2 => ScoreV2,
    mr => Mirror,
}

impl GameMods {
    pub(crate) const DEFAULT: Self = Self {
        inner: GameModsLegacy::NoMod,
    };

    /// Legacy bitflags of the mods.
    pub fn bits(&self) -> u32 {
        self.inner.bits()
    }

    /// Returns the mods' clock rate.
    pub fn clock_rate(&self) -> f64 {
        self.inner.clock_rate()
    }

    pub(crate) fn od_ar_hp_multiplier(&self) -> f64 {
        if self.hr() {
            1.4
        } else if self.ez() {
            0.5
        } else {
            1.0
        }
    }

    pub(crate) fn reflection(&self) -> Reflection {
        if self.hr() {
            Reflection::Vertical
        } else if self.mr() {
            Reflection::Horizontal
        } else {
            Reflection::None
        }
    }
}

impl Default for GameMods {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl Debug for GameMods {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        Debug::fmt(&self.inner, f)
    }
}

impl From<u32> for GameMods {
    fn from(bits: u32) -> Self {
        Self {
            inner: GameModsLegacy::from_bits(bits),
        }
    }
}

impl From<GameModsLegacy> for GameMods {
    fn from(inner: GameModsLegacy) -> Self {
        Self { inner }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags() {
        let mods = GameMods::from(8_u32 + 16);

        assert!(mods.hd());
        assert!(mods.hr());
        assert!(!mods.ez());
        assert_eq!(mods.reflection(), Reflection::Vertical);
        assert!((mods.od_ar_hp_multiplier() - 1.4).abs() < f64::EPSILON);
    }

    #[test]
    fn clock_rates() {
        assert!((GameMods::from(64_u32).clock_rate() - 1.5).abs() < f64::EPSILON);
        assert!((GameMods::from(256_u32).clock_rate() - 0.75).abs() < f64::EPSILON);
        assert!((GameMods::default().clock_rate() - 1.0).abs() < f64::EPSILON);
    }
}
