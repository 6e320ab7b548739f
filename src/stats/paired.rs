// Paired t-test (two-sided) on matched observations
//
// Computed in f64 with the Student t tail from distributions.rs. The f32
// `aprender::stats::hypothesis::ttest_rel` agrees on the statistic but its
// p-value is only right for df = 2 (and uses a normal tail above df = 30);
// see `test_aprender_reference_pvalue_gap`.

use serde::{Deserialize, Serialize};

use super::descriptive::describe;
use super::distributions::student_t_sf;
use crate::error::{AnalysisError, Result};

/// Result of a paired t-test
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PairedTTest {
    pub statistic: f64,
    /// Two-sided p-value
    pub pvalue: f64,
    pub df: usize,
    pub mean_difference: f64,
}

/// Paired t-test of `first - second`
///
/// # Example
/// ```
/// use emsrt::stats::paired_t_test;
///
/// let test = paired_t_test(&[10.0, 12.0, 14.0], &[9.0, 10.0, 11.0]).unwrap();
/// assert!((test.statistic - 12f64.sqrt()).abs() < 1e-9);
/// assert_eq!(test.df, 2);
/// ```
pub fn paired_t_test(first: &[f64], second: &[f64]) -> Result<PairedTTest> {
    if first.len() != second.len() {
        return Err(AnalysisError::Degenerate {
            context: "paired t-test".to_string(),
            reason: format!(
                "samples are not paired ({} vs {} observations)",
                first.len(),
                second.len()
            ),
        });
    }

    let differences: Vec<f64> = first.iter().zip(second).map(|(a, b)| a - b).collect();
    let summary = describe(&differences, "paired t-test")?;

    if summary.is_constant() {
        return Err(AnalysisError::Degenerate {
            context: "paired t-test".to_string(),
            reason: "all paired differences are identical".to_string(),
        });
    }

    let n = summary.n as f64;
    let statistic = summary.mean / (summary.sd / n.sqrt());
    let df = summary.n - 1;
    let pvalue = (2.0 * student_t_sf(statistic.abs(), df as f64)).min(1.0);

    Ok(PairedTTest {
        statistic,
        pvalue,
        df,
        mean_difference: summary.mean,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Two-sided p for df = 4: F(t) = 1/2 + 3/8 (t / sqrt(u)) (1 - t^2 / (12 u)), u = 1 + t^2 / 4
    fn two_sided_p_df4(t: f64) -> f64 {
        let u = 1.0 + t * t / 4.0;
        let cdf = 0.5 + 0.375 * (t / u.sqrt()) * (1.0 - t * t / (12.0 * u));
        2.0 * (1.0 - cdf)
    }

    #[test]
    fn test_known_paired_example() {
        let test = paired_t_test(&[10.0, 12.0, 14.0], &[9.0, 10.0, 11.0]).unwrap();
        // d = [1, 2, 3]: mean 2, sd 1, t = 2 sqrt(3); df = 2: p = 1 - t / sqrt(t^2 + 2)
        let t = 2.0 * 3f64.sqrt();
        assert!((test.statistic - t).abs() < 1e-12);
        assert!((test.pvalue - (1.0 - t / (t * t + 2.0).sqrt())).abs() < 1e-9);
        assert_eq!(test.mean_difference, 2.0);
    }

    #[test]
    fn test_five_subject_changes() {
        let baseline = [330.0, 300.0, 322.0, 318.0, 325.0];
        let post = [310.0, 300.0, 310.0, 310.0, 310.0];
        let test = paired_t_test(&baseline, &post).unwrap();
        // d = [20, 0, 12, 8, 15]: mean 11, sample variance 57.5
        let t = 11.0 / (57.5f64 / 5.0).sqrt();
        assert!((test.statistic - t).abs() < 1e-12);
        assert_eq!(test.df, 4);
        assert!((test.pvalue - two_sided_p_df4(t)).abs() < 1e-9);
        assert!((test.pvalue - 0.031_141_922_870_459).abs() < 1e-9);
    }

    #[test]
    fn test_aprender_reference_pvalue_gap() {
        let differences = [20.0f32, 0.0, 12.0, 8.0, 15.0];
        let zeros = [0.0f32; 5];
        let reference = aprender::stats::hypothesis::ttest_rel(&differences, &zeros).unwrap();

        let ours = paired_t_test(&[20.0, 0.0, 12.0, 8.0, 15.0], &[0.0; 5]).unwrap();
        let exact = two_sided_p_df4(ours.statistic);

        // same statistic and degrees of freedom
        assert!((f64::from(reference.statistic) - ours.statistic).abs() < 1e-5);
        assert_eq!(reference.df, 4.0);
        // its incomplete beta divides by `a` twice: half the true p at df = 4
        assert!((f64::from(reference.pvalue) - exact / 2.0).abs() < 1e-4);
        assert!((ours.pvalue - exact).abs() < 1e-9);
    }

    #[test]
    fn test_negative_statistic_same_pvalue() {
        let forward = paired_t_test(&[10.0, 12.0, 14.0], &[9.0, 10.0, 11.0]).unwrap();
        let reverse = paired_t_test(&[9.0, 10.0, 11.0], &[10.0, 12.0, 14.0]).unwrap();
        assert!((forward.statistic + reverse.statistic).abs() < 1e-12);
        assert!((forward.pvalue - reverse.pvalue).abs() < 1e-12);
    }

    #[test]
    fn test_requires_two_pairs() {
        assert!(matches!(
            paired_t_test(&[1.0], &[2.0]).unwrap_err(),
            AnalysisError::DataInsufficient { .. }
        ));
    }

    #[test]
    fn test_constant_differences_are_degenerate() {
        assert!(matches!(
            paired_t_test(&[3.0, 4.0], &[1.0, 2.0]).unwrap_err(),
            AnalysisError::Degenerate { .. }
        ));
    }

    #[test]
    fn test_length_mismatch() {
        assert!(paired_t_test(&[1.0, 2.0], &[1.0]).is_err());
    }
}
