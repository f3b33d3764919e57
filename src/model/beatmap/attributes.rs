use crate::{
    any::difficulty::ModsDependent,
    model::mods::GameMods,
    util::difficulty::{inverse_range, range},
    Difficulty,
};

use super::Beatmap;

/// Summary struct for a [`Beatmap`]'s attributes.
///
/// AR, OD, CS, and HP account for mods but not for the clock rate. Use
/// [`BeatmapAttributes::adjusted_ar`] and [`BeatmapAttributes::adjusted_od`]
/// for the values a player perceives on e.g. DT.
#[derive(Clone, Debug, PartialEq)]
pub struct BeatmapAttributes {
    /// The approach rate.
    pub ar: f64,
    /// The overall difficulty.
    pub od: f64,
    /// The circle size.
    pub cs: f64,
    /// The health drain rate
    pub hp: f64,
    /// The clock rate with respect to mods.
    pub clock_rate: f64,
    /// The hit windows in map time.
    pub hit_windows: HitWindows,
}

impl BeatmapAttributes {
    /// Approach rate after applying the clock rate.
    pub fn adjusted_ar(&self) -> f64 {
        inverse_range(
            self.hit_windows.preempt / self.clock_rate,
            HitWindows::PREEMPT_MIN,
            HitWindows::PREEMPT_MID,
            HitWindows::PREEMPT_MAX,
        )
    }

    /// Overall difficulty after applying the clock rate.
    pub fn adjusted_od(&self) -> f64 {
        inverse_range(
            self.hit_windows.great / self.clock_rate,
            HitWindows::GREAT_MIN,
            HitWindows::GREAT_MID,
            HitWindows::GREAT_MAX,
        )
    }
}

/// Time windows in milliseconds of map time.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct HitWindows {
    /// Time between an object appearing and its start time.
    pub preempt: f64,
    /// Largest offset for a 300.
    pub great: f64,
    /// Largest offset for a 100.
    pub ok: f64,
    /// Largest offset for a 50.
    pub meh: f64,
    /// Offsets beyond this are not judged at all.
    pub miss: f64,
}

impl HitWindows {
    pub const PREEMPT_MIN: f64 = 1800.0;
    pub const PREEMPT_MID: f64 = 1200.0;
    pub const PREEMPT_MAX: f64 = 450.0;

    pub const GREAT_MIN: f64 = 80.0;
    pub const GREAT_MID: f64 = 50.0;
    pub const GREAT_MAX: f64 = 20.0;

    pub const MISS: f64 = 400.0;

    /// Windows for the given modded AR and OD.
    pub fn new(ar: f64, od: f64) -> Self {
        Self {
            preempt: range(ar, Self::PREEMPT_MIN, Self::PREEMPT_MID, Self::PREEMPT_MAX),
            great: range(od, Self::GREAT_MIN, Self::GREAT_MID, Self::GREAT_MAX),
            ok: range(od, 140.0, 100.0, 60.0),
            meh: range(od, 200.0, 150.0, 100.0),
            miss: Self::MISS,
        }
    }

    /// Same windows measured in real time.
    pub fn adjusted(self, clock_rate: f64) -> Self {
        Self {
            preempt: self.preempt / clock_rate,
            great: self.great / clock_rate,
            ok: self.ok / clock_rate,
            meh: self.meh / clock_rate,
            miss: self.miss / clock_rate,
        }
    }
}

/// A builder for [`BeatmapAttributes`] and [`HitWindows`].
#[derive(Clone, Debug, PartialEq)]
#[must_use]
pub struct BeatmapAttributesBuilder {
    ar: ModsDependent,
    od: ModsDependent,
    cs: ModsDependent,
    hp: ModsDependent,
    mods: GameMods,
    clock_rate: Option<f64>,
}

impl BeatmapAttributesBuilder {
    /// Create a new [`BeatmapAttributesBuilder`].
    ///
    /// Attributes are set to `5.0`.
    pub const fn new() -> Self {
        Self {
            ar: ModsDependent::new(5.0),
            od: ModsDependent::new(5.0),
            cs: ModsDependent::new(5.0),
            hp: ModsDependent::new(5.0),
            mods: GameMods::DEFAULT,
            clock_rate: None,
        }
    }

    /// Use the given [`Beatmap`]'s attributes.
    pub const fn map(self, map: &Beatmap) -> Self {
        Self {
            ar: ModsDependent::new(map.ar),
            od: ModsDependent::new(map.od),
            cs: ModsDependent::new(map.cs),
            hp: ModsDependent::new(map.hp),
            mods: self.mods,
            clock_rate: self.clock_rate,
        }
    }

    /// Specify the approach rate.
    ///
    /// `with_mods` determines if the given value should be used before
    /// or after accounting for mods, e.g. on `true` the value will be
    /// used as is and on `false` it will be modified based on the mods.
    pub const fn ar(self, ar: f32, with_mods: bool) -> Self {
        Self {
            ar: ModsDependent {
                value: ar,
                with_mods,
            },
            ..self
        }
    }

    /// Specify the overall difficulty.
    ///
    /// See [`BeatmapAttributesBuilder::ar`] for `with_mods`.
    pub const fn od(self, od: f32, with_mods: bool) -> Self {
        Self {
            od: ModsDependent {
                value: od,
                with_mods,
            },
            ..self
        }
    }

    /// Specify the circle size.
    ///
    /// See [`BeatmapAttributesBuilder::ar`] for `with_mods`.
    pub const fn cs(self, cs: f32, with_mods: bool) -> Self {
        Self {
            cs: ModsDependent {
                value: cs,
                with_mods,
            },
            ..self
        }
    }

    /// Specify the drain rate.
    ///
    /// See [`BeatmapAttributesBuilder::ar`] for `with_mods`.
    pub const fn hp(self, hp: f32, with_mods: bool) -> Self {
        Self {
            hp: ModsDependent {
                value: hp,
                with_mods,
            },
            ..self
        }
    }

    /// Specify the mods.
    pub fn mods(self, mods: impl Into<GameMods>) -> Self {
        Self {
            mods: mods.into(),
            ..self
        }
    }

    /// Specify a custom clock rate.
    pub const fn clock_rate(self, clock_rate: f64) -> Self {
        Self {
            clock_rate: Some(clock_rate),
            ..self
        }
    }

    /// Specify all settings through [`Difficulty`].
    pub fn difficulty(self, difficulty: &Difficulty) -> Self {
        Self {
            ar: difficulty.get_ar().unwrap_or(self.ar),
            od: difficulty.get_od().unwrap_or(self.od),
            cs: difficulty.get_cs().unwrap_or(self.cs),
            hp: difficulty.get_hp().unwrap_or(self.hp),
            mods: *difficulty.get_mods(),
            clock_rate: Some(difficulty.get_clock_rate()),
        }
    }

    /// Calculate the [`BeatmapAttributes`].
    pub fn build(&self) -> BeatmapAttributes {
        let clock_rate = self.clock_rate.unwrap_or_else(|| self.mods.clock_rate());

        let ar = self.apply(self.ar);
        let od = self.apply(self.od);
        let hp = self.apply(self.hp);

        let mut cs = f64::from(self.cs.value);

        if !self.cs.with_mods {
            if self.mods.hr() {
                cs = (cs * 1.3).min(10.0);
            } else if self.mods.ez() {
                cs *= 0.5;
            }
        }

        BeatmapAttributes {
            ar,
            od,
            cs,
            hp,
            clock_rate,
            hit_windows: HitWindows::new(ar, od),
        }
    }

    fn apply(&self, value: ModsDependent) -> f64 {
        if value.with_mods {
            f64::from(value.value)
        } else {
            (f64::from(value.value) * self.mods.od_ar_hp_multiplier()).min(10.0)
        }
    }
}

impl From<&Beatmap> for BeatmapAttributesBuilder {
    fn from(map: &Beatmap) -> Self {
        Self::new().map(map)
    }
}

impl Default for BeatmapAttributesBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn consider_mods() {
        let attrs = BeatmapAttributesBuilder::new()
            .ar(8.5, false)
            .mods(64_u32)
            .build();

        assert!(close(attrs.ar, 8.5), "{}", attrs.ar);
        assert!(close(attrs.adjusted_ar(), 10.0), "{}", attrs.adjusted_ar());
    }

    #[test]
    fn hard_rock_caps_at_ten() {
        let attrs = BeatmapAttributesBuilder::new()
            .ar(9.0, false)
            .od(8.0, false)
            .cs(4.0, false)
            .mods(16_u32)
            .build();

        assert!(close(attrs.ar, 10.0));
        assert!(close(attrs.od, 10.0));
        assert!(close(attrs.cs, 5.2));
        assert!(close(attrs.hit_windows.great, 20.0));
        assert!(close(attrs.hit_windows.preempt, 450.0));
    }

    #[test]
    fn skip_mods() {
        let attrs = BeatmapAttributesBuilder::new()
            .ar(8.5, true)
            .mods(2_u32)
            .build();

        assert!(close(attrs.ar, 8.5), "{}", attrs.ar);
    }

    #[test]
    fn windows() {
        let windows = HitWindows::new(9.0, 8.0);

        assert!(close(windows.preempt, 600.0));
        assert!(close(windows.great, 32.0));
        assert!(close(windows.ok, 76.0));
        assert!(close(windows.meh, 120.0));
        assert!(close(windows.adjusted(1.5).great, 32.0 / 1.5));
    }
}
