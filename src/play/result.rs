/// Judgement tiers, including the partial credits that only affect health.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum HitResult {
    Miss,
    N50,
    N100,
    N300,
    /// Combo ended with at least one 50 or miss.
    Mu,
    /// Combo ended with at least one 100 and a final 100.
    Katu100,
    /// Combo ended with at least one 100 and a final 300.
    Katu300,
    /// Combo ended with only 300s.
    Geki,
    SliderTick,
    /// Slider head, repeat, or end.
    SliderEdge,
    SpinnerSpin,
    SpinnerBonus,
    SliderBreak,
}

impl HitResult {
    /// Whether this tier keeps a Perfect play alive.
    pub const fn is_perfect(self) -> bool {
        matches!(
            self,
            Self::N300
                | Self::Geki
                | Self::SliderTick
                | Self::SliderEdge
                | Self::SpinnerSpin
                | Self::SpinnerBonus
        )
    }

    pub const fn is_hit(self) -> bool {
        !matches!(self, Self::Miss | Self::SliderBreak)
    }
}

/// Terminal judgement of an object or of a slider's head.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct HitResultEvent {
    /// Index of the object in map order.
    pub object: usize,
    /// Map time at which the judgement happened.
    pub time: f64,
    pub result: HitResult,
    /// Offset from the ideal time. Positive means late.
    pub delta: f64,
    pub end_of_combo: bool,
    /// Bonus awarded because the combo ended with this judgement.
    pub combo_end: Option<HitResult>,
}

/// What a judgement counts towards.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum JudgementKind {
    /// Circles and spinners.
    Full,
    /// Slider heads only feed combo and the hit error bar.
    Head,
    /// Slider repeats and ticks give combo and health but no counts.
    Nested,
    /// Slider ends only add combo if the slider was held until the end.
    Tail { held: bool },
    /// Partial credit that only touches health.
    HealthOnly,
}

impl JudgementKind {
    pub(crate) const fn counts(self) -> bool {
        matches!(self, Self::Full | Self::Tail { .. })
    }

    pub(crate) const fn affects_combo(self) -> bool {
        match self {
            Self::Full | Self::Head | Self::Nested => true,
            Self::Tail { held } => held,
            Self::HealthOnly => false,
        }
    }

    pub(crate) const fn affects_health(self) -> bool {
        !matches!(self, Self::Head)
    }

    pub(crate) const fn shows_hit_error(self) -> bool {
        matches!(self, Self::Full | Self::Head)
    }
}

/// A judgement as handed from an object to the scoring state.
#[derive(Copy, Clone, Debug, PartialEq)]
pub(crate) struct Judgement {
    pub(crate) object: usize,
    pub(crate) result: HitResult,
    pub(crate) delta: f64,
    pub(crate) end_of_combo: bool,
    pub(crate) kind: JudgementKind,
}

impl Judgement {
    pub(crate) const fn full(object: usize, result: HitResult, delta: f64, end_of_combo: bool) -> Self {
        Self {
            object,
            result,
            delta,
            end_of_combo,
            kind: JudgementKind::Full,
        }
    }

    pub(crate) const fn health_only(object: usize, result: HitResult) -> Self {
        Self {
            object,
            result,
            delta: 0.0,
            end_of_combo: false,
            kind: JudgementKind::HealthOnly,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn perfect_tiers() {
        assert!(HitResult::N300.is_perfect());
        assert!(HitResult::SpinnerBonus.is_perfect());
        assert!(!HitResult::N100.is_perfect());
        assert!(!HitResult::Miss.is_perfect());
    }

    #[test]
    fn tail_combo_depends_on_hold() {
        assert!(JudgementKind::Tail { held: true }.affects_combo());
        assert!(!JudgementKind::Tail { held: false }.affects_combo());
        assert!(JudgementKind::Tail { held: false }.counts());
        assert!(!JudgementKind::Head.counts());
        assert!(!JudgementKind::Head.affects_health());
    }
}
