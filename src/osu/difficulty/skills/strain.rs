use crate::util::{float_ext::FloatExt, strains_vec::StrainsVec};

pub trait OsuStrainSkill {
    const REDUCED_SECTION_COUNT: usize = 10;
    const REDUCED_STRAIN_BASELINE: f64 = 0.75;
    const DIFFICULTY_MULTIPLIER: f64 = 1.06;

    fn difficulty_to_performance(difficulty: f64) -> f64 {
        difficulty_to_performance(difficulty)
    }
}

/// Weighted sum of the strain peaks after the highest few peaks have been
/// scaled down to account for extreme difficulty spikes.
pub fn difficulty_value(
    current_strain_peaks: StrainsVec,
    reduced_section_count: usize,
    reduced_strain_baseline: f64,
    decay_weight: f64,
) -> f64 {
    let mut peaks = current_strain_peaks;

    // Note that we remove all initial zeros here.
    let peaks_iter = peaks.sorted_non_zero_iter_mut().take(reduced_section_count);

    for (i, strain) in peaks_iter.enumerate() {
        let clamped = (i as f64 / reduced_section_count as f64).clamp(0.0, 1.0);
        let scale = f64::log10(f64::lerp(1.0, 10.0, clamped));
        *strain *= f64::lerp(reduced_strain_baseline, 1.0, scale);
    }

    peaks.sort_desc();

    let mut difficulty = 0.0;
    let mut weight = 1.0;

    for strain in peaks.iter() {
        difficulty += strain * weight;
        weight *= decay_weight;
    }

    difficulty
}

pub fn difficulty_to_performance(difficulty: f64) -> f64 {
    f64::powf(5.0 * f64::max(1.0, difficulty / 0.0675) - 4.0, 3.0) / 100_000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn top_peaks_are_reduced() {
        let peaks = StrainsVec::from(vec![10.0; 3]);
        let reduced = difficulty_value(peaks.clone(), 10, 0.75, 0.9);
        let unreduced = crate::any::difficulty::skills::difficulty_value(peaks, 0.9);

        assert!(reduced < unreduced);

        // the first peak is scaled by the baseline
        let single = difficulty_value(StrainsVec::from(vec![10.0]), 10, 0.75, 0.9);
        assert!((single - 7.5).abs() < 1e-9);
    }

    #[test]
    fn performance_has_a_floor() {
        assert!((difficulty_to_performance(0.0) - 1e-5).abs() < 1e-12);
        assert!(difficulty_to_performance(0.3) > difficulty_to_performance(0.2));
    }
}
