use crate::util::{float_ext::FloatExt, strains_vec::StrainsVec};

pub trait StrainSkill: Sized {
    type DifficultyObject<'a>;
    type DifficultyObjects<'a>: ?Sized;

    const DECAY_WEIGHT: f64 = 0.9;
    const SECTION_LENGTH: i32 = 400;

    fn process<'a>(
        &mut self,
        curr: &Self::DifficultyObject<'a>,
        objects: &Self::DifficultyObjects<'a>,
    );

    fn count_top_weighted_strains(&self, difficulty_value: f64) -> f64;

    /// Strain of every processed object in order.
    fn object_strains(&self) -> &[f64];

    fn save_current_peak(&mut self);

    fn start_new_section_from<'a>(
        &mut self,
        time: f64,
        curr: &Self::DifficultyObject<'a>,
        objects: &Self::DifficultyObjects<'a>,
    );

    fn get_current_strain_peaks(&self) -> StrainsVec;

    fn into_current_strain_peaks(self) -> StrainsVec;

    fn current_strain_peaks(mut strain_peaks: StrainsVec, current_section_peak: f64) -> StrainsVec {
        strain_peaks.push(current_section_peak);

        strain_peaks
    }

    fn difficulty_value(current_strain_peaks: StrainsVec) -> f64;

    fn into_difficulty_value(self) -> f64;

    fn cloned_difficulty_value(&self) -> f64;
}

pub fn count_top_weighted_strains(object_strains: &[f64], difficulty_value: f64) -> f64 {
    if object_strains.is_empty() {
        return 0.0;
    }

    // What would the top strain be if all strain values were identical
    let consistent_top_strain = difficulty_value / 10.0;

    if FloatExt::eq(consistent_top_strain, 0.0) {
        return object_strains.len() as f64;
    }

    object_strains
        .iter()
        .map(|s| 1.1 / (1.0 + f64::exp(-10.0 * (s / consistent_top_strain - 0.88))))
        .sum()
}

pub fn difficulty_value(current_strain_peaks: StrainsVec, decay_weight: f64) -> f64 {
    let mut difficulty = 0.0;
    let mut weight = 1.0;

    let mut peaks = current_strain_peaks;
    peaks.retain_non_zero_and_sort();

    for strain in peaks.iter() {
        difficulty += strain * weight;
        weight *= decay_weight;
    }

    difficulty
}

pub fn strain_decay(ms: f64, strain_decay_base: f64) -> f64 {
    f64::powf(strain_decay_base, ms / 1000.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weighted_sum_decays() {
        let peaks = StrainsVec::from(vec![1.0, 0.0, 2.0]);
        let value = difficulty_value(peaks, 0.9);

        assert!((value - (2.0 + 0.9)).abs() < 1e-12);
    }

    #[test]
    fn top_weighted_of_uniform_strains() {
        let strains = [5.0; 10];
        let count = count_top_weighted_strains(&strains, 50.0);

        // every strain equals the consistent top strain
        assert!(count > 8.0 && count < 9.0);
        assert!(count_top_weighted_strains(&[], 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn decay_halves_with_base() {
        assert!((strain_decay(1000.0, 0.5) - 0.5).abs() < 1e-12);
        assert!((strain_decay(0.0, 0.15) - 1.0).abs() < 1e-12);
    }
}
