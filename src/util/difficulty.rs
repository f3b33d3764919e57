/// Maps a difficulty value in `0..=10` onto the range `min..=max` with `mid`
/// at difficulty 5.
pub fn range(difficulty: f64, min: f64, mid: f64, max: f64) -> f64 {
    if difficulty > 5.0 {
        mid + (max - mid) * (difficulty - 5.0) / 5.0
    } else if difficulty < 5.0 {
        mid - (mid - min) * (5.0 - difficulty) / 5.0
    } else {
        mid
    }
}

/// Inverse of [`range`].
///
/// Only valid for ranges where `min`, `mid`, and `max` are monotonic.
pub fn inverse_range(value: f64, min: f64, mid: f64, max: f64) -> f64 {
    if value < mid {
        ((value * 5.0 - mid * 5.0) / (max - mid)) + 5.0
    } else if value > mid {
        5.0 - ((mid * 5.0 - value * 5.0) / (mid - min))
    } else {
        5.0
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use crate::util::float_ext::FloatExt;

    use super::*;

    #[test]
    fn range_anchors() {
        assert!(FloatExt::eq(range(0.0, 1800.0, 1200.0, 450.0), 1800.0));
        assert!(FloatExt::eq(range(5.0, 1800.0, 1200.0, 450.0), 1200.0));
        assert!(FloatExt::eq(range(10.0, 1800.0, 1200.0, 450.0), 450.0));
        assert!(FloatExt::eq(range(8.0, 80.0, 50.0, 20.0), 32.0));
    }

    proptest! {
        #[test]
        fn inverse_undoes_range(difficulty in 0.0..11.0_f64) {
            let value = range(difficulty, 80.0, 50.0, 20.0);
            let back = inverse_range(value, 80.0, 50.0, 20.0);

            prop_assert!((back - difficulty).abs() < 1e-9);
        }
    }
}
