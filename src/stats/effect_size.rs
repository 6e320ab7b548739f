// Standardized mean difference
//
// d = (mean_1 - mean_2) / sqrt((sd_1^2 + sd_2^2) / 2)
//
// The two variances are averaged with equal weight regardless of sample
// size. This is not the n-weighted pooled SD of the textbook Cohen's d; the
// published reference value this experiment is compared against uses the
// equal-weight form.
//
// Per-subject comparisons use sample SDs (n - 1). Comparisons over trials
// pooled across subjects use population SDs (n), matching the reference
// analysis that produced the published pooled values.

use super::descriptive::{describe, Descriptive};
use crate::error::{AnalysisError, Result};

/// Which standard deviation enters the denominator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SdKind {
    /// n - 1
    Sample,
    /// n
    Population,
}

impl SdKind {
    fn of(self, d: &Descriptive) -> f64 {
        match self {
            SdKind::Sample => d.sd,
            SdKind::Population => {
                let n = d.n as f64;
                d.sd * ((n - 1.0) / n).sqrt()
            }
        }
    }
}

fn standardized(first: &Descriptive, second: &Descriptive, kind: SdKind) -> Result<f64> {
    if first.sd == 0.0 && second.sd == 0.0 {
        return Err(AnalysisError::Degenerate {
            context: "effect size".to_string(),
            reason: "both series have zero variance".to_string(),
        });
    }
    let (sd1, sd2) = (kind.of(first), kind.of(second));
    let spread = ((sd1 * sd1 + sd2 * sd2) / 2.0).sqrt();
    Ok((first.mean - second.mean) / spread)
}

/// Effect size from two precomputed summaries (sample SDs)
pub fn effect_size_from(first: &Descriptive, second: &Descriptive) -> Result<f64> {
    standardized(first, second, SdKind::Sample)
}

/// Effect size of `first` relative to `second` (sample SDs)
///
/// # Example
/// ```
/// use emsrt::stats::effect_size;
///
/// let d = effect_size(&[300.0, 310.0, 290.0, 305.0], &[280.0, 275.0, 285.0, 270.0]).unwrap();
/// assert!((d - 3.138).abs() < 1e-3);
/// ```
pub fn effect_size(first: &[f64], second: &[f64]) -> Result<f64> {
    effect_size_with(first, second, SdKind::Sample)
}

/// Effect size over pooled trials (population SDs)
///
/// # Example
/// ```
/// use emsrt::stats::effect_size_population;
///
/// // both population SDs are 1
/// let d = effect_size_population(&[1.0, 3.0], &[5.0, 7.0]).unwrap();
/// assert!((d + 4.0).abs() < 1e-12);
/// ```
pub fn effect_size_population(first: &[f64], second: &[f64]) -> Result<f64> {
    effect_size_with(first, second, SdKind::Population)
}

fn effect_size_with(first: &[f64], second: &[f64], kind: SdKind) -> Result<f64> {
    let a = describe(first, "effect size first series")?;
    let b = describe(second, "effect size second series")?;
    standardized(&a, &b, kind)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference(a: &[f64], b: &[f64], ddof: f64) -> f64 {
        let mean = |v: &[f64]| v.iter().sum::<f64>() / v.len() as f64;
        let var = |v: &[f64]| {
            let m = mean(v);
            v.iter().map(|x| (x - m).powi(2)).sum::<f64>() / (v.len() as f64 - ddof)
        };
        (mean(a) - mean(b)) / ((var(a) + var(b)) / 2.0).sqrt()
    }

    fn ramp(offset: f64) -> Vec<f64> {
        (0..30).map(|k| 312.0 + offset + 0.1 * k as f64).collect()
    }

    #[test]
    fn test_matches_reference_computation() {
        let baseline = [300.0, 310.0, 290.0, 305.0];
        let post = [280.0, 275.0, 285.0, 270.0];
        let d = effect_size(&baseline, &post).unwrap();
        assert!((d - reference(&baseline, &post, 1.0)).abs() < 1e-12);
        // variances 218.75 / 3 and 125 / 3
        assert!((d - 23.75 / (343.75f64 / 6.0).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_small_shift_between_close_series() {
        // Both series have sample variance 0.775; f32 would lose the shift
        let d = effect_size(&ramp(0.5), &ramp(0.0)).unwrap();
        assert!((d - 0.5 / 0.775f64.sqrt()).abs() < 1e-9, "d = {d}");
    }

    #[test]
    fn test_population_sd_for_pooled_trials() {
        // sample SDs are sqrt(2) each: -4 / sqrt(2) with n - 1
        assert!((effect_size_population(&[1.0, 3.0], &[5.0, 7.0]).unwrap() + 4.0).abs() < 1e-12);
        assert!((effect_size(&[1.0, 3.0], &[5.0, 7.0]).unwrap() + 4.0 / 2f64.sqrt()).abs() < 1e-12);

        let a = [300.0, 310.0, 290.0, 305.0, 298.0];
        let b = [280.0, 275.0, 285.0];
        let d = effect_size_population(&a, &b).unwrap();
        assert!((d - reference(&a, &b, 0.0)).abs() < 1e-12);
    }

    #[test]
    fn test_equal_weighting_ignores_sample_size() {
        // Same SDs, very different n: the textbook pooled SD would differ
        let small = [10.0, 12.0];
        let large = [0.0, 2.0, 0.0, 2.0, 0.0, 2.0, 0.0, 2.0];
        let d = effect_size(&small, &large).unwrap();
        assert!((d - reference(&small, &large, 1.0)).abs() < 1e-12);
    }

    #[test]
    fn test_sign_follows_argument_order() {
        let a = [1.0, 2.0, 3.0];
        let b = [4.0, 5.0, 6.0];
        assert!(effect_size(&a, &b).unwrap() < 0.0);
        assert!(effect_size(&b, &a).unwrap() > 0.0);
    }

    #[test]
    fn test_zero_variance_is_degenerate() {
        let err = effect_size(&[5.0, 5.0], &[7.0, 7.0]).unwrap_err();
        assert!(matches!(err, AnalysisError::Degenerate { .. }));
        let err = effect_size_population(&[5.0, 5.0], &[7.0, 7.0]).unwrap_err();
        assert!(matches!(err, AnalysisError::Degenerate { .. }));
    }

    #[test]
    fn test_one_sided_zero_variance_is_fine() {
        assert!(effect_size(&[5.0, 5.0], &[6.0, 8.0]).unwrap().is_finite());
    }
}
