//! Reaction-time outlier removal
//!
//! Two filters in sequence:
//! 1. Physiological bounds: keep values in `[physio_min_ms, physio_max_ms]`
//!    (anticipatory responses below, attention lapses above).
//! 2. Tukey fences on the survivors: keep values within
//!    `[Q1 - k*IQR, Q3 + k*IQR]`, quartiles by R-7 linear interpolation.
//!
//! The result may be empty; callers needing statistics fail on that.

use serde::Serialize;

use crate::config::AnalysisConfig;
use crate::error::Result;
use crate::stats::quartiles;

/// Bounds and multiplier for [`remove_outliers`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutlierBounds {
    pub min_ms: f64,
    pub max_ms: f64,
    pub iqr_multiplier: f64,
}

impl Default for OutlierBounds {
    fn default() -> Self {
        Self {
            min_ms: 100.0,
            max_ms: 1000.0,
            iqr_multiplier: 1.5,
        }
    }
}

impl From<&AnalysisConfig> for OutlierBounds {
    fn from(config: &AnalysisConfig) -> Self {
        Self {
            min_ms: config.physio_min_ms,
            max_ms: config.physio_max_ms,
            iqr_multiplier: config.iqr_multiplier,
        }
    }
}

/// Reaction times of one phase after outlier removal
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CleanedSeries {
    pub label: String,
    /// Surviving values in recorded order
    pub values: Vec<f64>,
    pub original_n: usize,
    pub removed_physio: usize,
    pub removed_iqr: usize,
    /// Tukey fences; `None` when nothing survived the physiological filter
    pub lower_fence: Option<f64>,
    pub upper_fence: Option<f64>,
}

impl CleanedSeries {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn removed(&self) -> usize {
        self.removed_physio + self.removed_iqr
    }
}

/// Remove implausible and extreme reaction times
///
/// `label` identifies the series in diagnostics.
///
/// # Example
/// ```
/// use emsrt::outlier::{remove_outliers, OutlierBounds};
///
/// let raw = [120.0, 130.0, 125.0, 128.0, 122.0, 900.0, 121.0];
/// let cleaned = remove_outliers(&raw, "baseline", &OutlierBounds::default()).unwrap();
/// assert_eq!(cleaned.values, vec![120.0, 130.0, 125.0, 128.0, 122.0, 121.0]);
/// assert_eq!(cleaned.removed_iqr, 1);
/// ```
pub fn remove_outliers(raw: &[f64], label: &str, bounds: &OutlierBounds) -> Result<CleanedSeries> {
    let plausible: Vec<f64> = raw
        .iter()
        .copied()
        .filter(|v| *v >= bounds.min_ms && *v <= bounds.max_ms)
        .collect();
    let removed_physio = raw.len() - plausible.len();

    let (values, fences) = if plausible.is_empty() {
        (plausible, None)
    } else {
        let q = quartiles(&plausible)?;
        let lower = q.q1 - bounds.iqr_multiplier * q.iqr();
        let upper = q.q3 + bounds.iqr_multiplier * q.iqr();
        let kept: Vec<f64> = plausible
            .iter()
            .copied()
            .filter(|v| *v >= lower && *v <= upper)
            .collect();
        (kept, Some((lower, upper)))
    };

    let removed_iqr = raw.len() - removed_physio - values.len();
    if removed_physio + removed_iqr > 0 {
        tracing::info!(
            "[{}] outlier removal: {} -> {} ({} implausible, {} beyond IQR fences)",
            label,
            raw.len(),
            values.len(),
            removed_physio,
            removed_iqr
        );
    }

    Ok(CleanedSeries {
        label: label.to_string(),
        values,
        original_n: raw.len(),
        removed_physio,
        removed_iqr,
        lower_fence: fences.map(|(lower, _)| lower),
        upper_fence: fences.map(|(_, upper)| upper),
    })
}
