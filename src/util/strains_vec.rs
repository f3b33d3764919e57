use std::{iter::Copied, slice::Iter};

/// A `Vec<f64>` of non-negative strain values.
///
/// Zeros are kept until [`StrainsVec::retain_non_zero`] is called so that the
/// section layout is preserved for plotting.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StrainsVec {
    inner: Vec<f64>,
}

impl StrainsVec {
    /// Constructs a new, empty [`StrainsVec`] with at least the specified
    /// capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Vec::with_capacity(capacity),
        }
    }

    /// Returns the number of elements.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Appends an element to the back.
    pub fn push(&mut self, value: f64) {
        debug_assert!(value >= 0.0 || value.is_nan());

        self.inner.push(value);
    }

    /// Sorts the entries in descending order.
    pub fn sort_desc(&mut self) {
        self.inner.sort_by(|a, b| b.total_cmp(a));
    }

    /// Removes all zero entries.
    pub fn retain_non_zero(&mut self) {
        self.inner.retain(|&value| value > 0.0);
    }

    /// Removes all zeros and sorts the remaining entries in descending order.
    pub fn retain_non_zero_and_sort(&mut self) {
        self.retain_non_zero();
        self.sort_desc();
    }

    /// Removes all zeros, sorts the remaining entries in descending order, and
    /// returns an iterator over mutable references to the values.
    pub fn sorted_non_zero_iter_mut(&mut self) -> impl ExactSizeIterator<Item = &mut f64> {
        self.retain_non_zero_and_sort();

        self.inner.iter_mut()
    }

    /// Returns an iterator over the values.
    pub fn iter(&self) -> Copied<Iter<'_, f64>> {
        self.inner.iter().copied()
    }

    /// The largest value or `0.0` if empty.
    pub fn max(&self) -> f64 {
        self.inner.iter().copied().fold(0.0, f64::max)
    }

    pub fn into_vec(self) -> Vec<f64> {
        self.inner
    }
}

impl From<Vec<f64>> for StrainsVec {
    fn from(inner: Vec<f64>) -> Self {
        Self { inner }
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::StrainsVec;

    proptest! {
        #[test]
        fn sorted_non_zero(values in prop::collection::vec(prop_oneof![Just(0.0), 0.0..1000.0_f64], 0..200)) {
            let mut vec = StrainsVec::with_capacity(values.len());

            for &value in values.iter() {
                vec.push(value);
            }

            prop_assert_eq!(vec.len(), values.len());

            let expected_non_zero = values.iter().filter(|&&v| v > 0.0).count();
            let sorted: Vec<f64> = vec.sorted_non_zero_iter_mut().map(|v| *v).collect();

            prop_assert_eq!(sorted.len(), expected_non_zero);
            prop_assert!(sorted.windows(2).all(|w| w[0] >= w[1]));
        }
    }

    #[test]
    fn max_of_empty_is_zero() {
        assert!(StrainsVec::default().max().abs() < f64::EPSILON);
    }
}
