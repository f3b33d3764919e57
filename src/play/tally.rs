use super::result::{HitResult, JudgementKind};

/// Counts, combo, and hit errors of a play.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Tally {
    pub n300: u32,
    pub n100: u32,
    pub n50: u32,
    pub misses: u32,
    pub n_geki: u32,
    pub n_katu: u32,
    pub combo: u32,
    pub max_combo: u32,
    pub slider_breaks: u32,
    /// Score from spinner rotations.
    pub spinner_score: u32,
    /// Offsets of clicked circles and slider heads.
    pub hit_errors: Vec<f64>,
    /// Bit 0 for a 100, bit 1 for a 50 or miss within the current combo.
    pub(crate) combo_bits: u8,
}

impl Tally {
    pub(crate) fn add(&mut self, result: HitResult, delta: f64, kind: JudgementKind) {
        if result == HitResult::Miss {
            self.break_combo();
        } else {
            if kind.shows_hit_error() {
                self.hit_errors.push(delta);
            }

            if kind.affects_combo() {
                self.combo += 1;
                self.max_combo = self.max_combo.max(self.combo);
            }
        }

        if !kind.counts() {
            return;
        }

        match result {
            HitResult::Miss => {
                self.misses += 1;
                self.combo_bits |= 2;
            }
            HitResult::N50 => {
                self.n50 += 1;
                self.combo_bits |= 2;
            }
            HitResult::N100 => {
                self.n100 += 1;
                self.combo_bits |= 1;
            }
            HitResult::N300 => self.n300 += 1,
            _ => {}
        }
    }

    /// Bonus for the combo that just ended with `last`, resetting the combo
    /// state.
    pub(crate) fn end_combo(&mut self, last: HitResult) -> Option<HitResult> {
        let bonus = if self.combo_bits == 0 {
            self.n_geki += 1;

            Some(HitResult::Geki)
        } else if self.combo_bits & 2 == 0 {
            self.n_katu += 1;

            match last {
                HitResult::N100 => Some(HitResult::Katu100),
                HitResult::N300 => Some(HitResult::Katu300),
                _ => None,
            }
        } else if last != HitResult::Miss {
            Some(HitResult::Mu)
        } else {
            None
        };

        self.combo_bits = 0;

        bonus
    }

    pub(crate) fn break_combo(&mut self) {
        self.combo = 0;
    }

    pub(crate) fn slider_break(&mut self) {
        self.break_combo();
        self.slider_breaks += 1;
    }

    pub fn n_objects(&self) -> u32 {
        self.n300 + self.n100 + self.n50 + self.misses
    }

    /// Accuracy in `0.0..=1.0`.
    pub fn accuracy(&self) -> f64 {
        let total = self.n_objects();

        if total == 0 {
            return 1.0;
        }

        let numerator = 6 * self.n300 + 2 * self.n100 + self.n50;

        f64::from(numerator) / f64::from(6 * total)
    }

    /// Mean hit error in milliseconds.
    pub fn mean_hit_error(&self) -> f64 {
        if self.hit_errors.is_empty() {
            return 0.0;
        }

        self.hit_errors.iter().sum::<f64>() / self.hit_errors.len() as f64
    }

    /// Standard deviation of the hit errors times ten.
    pub fn unstable_rate(&self) -> f64 {
        if self.hit_errors.is_empty() {
            return 0.0;
        }

        let mean = self.mean_hit_error();

        let variance = self
            .hit_errors
            .iter()
            .map(|error| (error - mean).powi(2))
            .sum::<f64>()
            / self.hit_errors.len() as f64;

        variance.sqrt() * 10.0
    }
}
