// Descriptive statistics in f64
//
// - mean: Kahan-compensated sum
// - variance: two-pass, sample (n - 1)
// - quantiles: R-7 (h = (n - 1) * q) with the same two-sided linear
//   interpolation numpy uses, so fences computed here are bit-identical to
//   a data-frame reference on the same input
//
// Reaction times are reported to 2-3 decimals and fences are compared with
// equality at the boundary; single-precision SIMD kernels are not accurate
// enough for either.

use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, Result};

/// Summary of one series of reaction times
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Descriptive {
    pub mean: f64,
    /// Sample standard deviation (n - 1)
    pub sd: f64,
    pub median: f64,
    pub n: usize,
    pub min: f64,
    pub max: f64,
}

impl Descriptive {
    /// True when every observation is identical
    pub fn is_constant(&self) -> bool {
        self.min == self.max
    }
}

/// Lower quartile, median and upper quartile of a series
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quartiles {
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
}

impl Quartiles {
    pub fn iqr(&self) -> f64 {
        self.q3 - self.q1
    }
}

fn kahan_sum(values: &[f64]) -> f64 {
    let mut sum = 0.0;
    let mut compensation = 0.0;
    for &v in values {
        let y = v - compensation;
        let t = sum + y;
        compensation = (t - sum) - y;
        sum = t;
    }
    sum
}

fn sorted(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    sorted
}

/// R-7 quantile of already sorted, non-empty data
fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
    let h = (sorted.len() - 1) as f64 * q;
    let lo = h.floor() as usize;
    let hi = (lo + 1).min(sorted.len() - 1);
    let t = h - lo as f64;
    let (a, b) = (sorted[lo], sorted[hi]);
    let diff = b - a;
    if t >= 0.5 {
        b - diff * (1.0 - t)
    } else {
        a + diff * t
    }
}

/// Quartiles with R-7 linear interpolation
pub fn quartiles(values: &[f64]) -> Result<Quartiles> {
    if values.is_empty() {
        return Err(AnalysisError::DataInsufficient {
            context: "quartiles".to_string(),
            required: 1,
            actual: 0,
        });
    }
    if values.iter().any(|v| v.is_nan()) {
        return Err(AnalysisError::Numeric("quartiles of a series containing NaN".to_string()));
    }

    let sorted = sorted(values);
    Ok(Quartiles {
        q1: quantile_sorted(&sorted, 0.25),
        median: quantile_sorted(&sorted, 0.5),
        q3: quantile_sorted(&sorted, 0.75),
    })
}

/// Mean, sample SD, median, count and range of a series
///
/// `context` names the series in errors. Needs at least two observations
/// because the sample SD is undefined below that.
///
/// # Example
/// ```
/// use emsrt::stats::describe;
///
/// let d = describe(&[300.0, 310.0, 290.0, 305.0], "baseline").unwrap();
/// assert_eq!(d.mean, 301.25);
/// assert_eq!(d.n, 4);
/// assert!(describe(&[300.0], "baseline").is_err());
/// ```
pub fn describe(values: &[f64], context: &str) -> Result<Descriptive> {
    if values.len() < 2 {
        return Err(AnalysisError::DataInsufficient {
            context: context.to_string(),
            required: 2,
            actual: values.len(),
        });
    }

    let q = quartiles(values)?;
    let mean = mean(values, context)?;
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    let n = values.len() as f64;
    let sd = if min == max {
        0.0
    } else {
        let squares: Vec<f64> = values.iter().map(|v| (v - mean) * (v - mean)).collect();
        (kahan_sum(&squares) / (n - 1.0)).sqrt()
    };

    Ok(Descriptive {
        mean,
        sd,
        median: q.median,
        n: values.len(),
        min,
        max,
    })
}

/// Arithmetic mean of a non-empty series
pub fn mean(values: &[f64], context: &str) -> Result<f64> {
    if values.is_empty() {
        return Err(AnalysisError::DataInsufficient {
            context: context.to_string(),
            required: 1,
            actual: 0,
        });
    }
    Ok(kahan_sum(values) / values.len() as f64)
}

/// Sample standard deviation, `None` below two observations
pub fn sample_sd(values: &[f64]) -> Option<f64> {
    describe(values, "sample sd").ok().map(|d| d.sd)
}
