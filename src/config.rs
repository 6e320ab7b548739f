//! Configuration for the analysis pipeline and the waveform generator
//!
//! All knobs that used to be fixed paths or constants are explicit here and
//! passed into the entry points. Configuration can be loaded from TOML and
//! overridden from the command line.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{AnalysisError, Result};

fn invalid(message: String) -> Result<()> {
    Err(AnalysisError::InvalidConfig(message))
}

/// What to do when one subject cannot be analysed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubjectPolicy {
    /// Abort the whole run on the first failing subject
    #[default]
    Abort,
    /// Skip the subject with a warning and continue with the rest
    Exclude,
}

/// Configuration for one analysis run
///
/// # Example
/// ```
/// use emsrt::config::AnalysisConfig;
///
/// let config = AnalysisConfig::default();
/// assert_eq!(config.physio_min_ms, 100.0);
/// assert_eq!(config.physio_max_ms, 1000.0);
/// assert_eq!(config.iqr_multiplier, 1.5);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Directory holding `Data_<subject>_<EMS_ON|EMS_OFF>_<timestamp>.csv` files
    pub input_dir: PathBuf,

    /// Directory receiving the summary table and other outputs
    pub output_dir: PathBuf,

    /// Fastest plausible reaction; anything quicker is anticipatory (ms)
    pub physio_min_ms: f64,

    /// Slowest plausible reaction; anything slower is an attention lapse (ms)
    pub physio_max_ms: f64,

    /// Tukey fence multiplier applied to the interquartile range
    pub iqr_multiplier: f64,

    /// Alpha for the omnibus branch and the underpowered-test flags
    pub significance_level: f64,

    /// Number of pooled pairwise comparisons the post-hoc correction covers
    pub bonferroni_comparisons: usize,

    pub subject_policy: SubjectPolicy,

    /// Compare the `StimulusOffset` setting with the assigned phase
    pub cross_check_settings: bool,

    /// Published mean improvement used in the interpretation text (ms)
    pub literature_reference_ms: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("ExperimentData"),
            output_dir: PathBuf::from("."),
            physio_min_ms: 100.0,
            physio_max_ms: 1000.0,
            iqr_multiplier: 1.5,
            significance_level: 0.05,
            bonferroni_comparisons: 3,
            subject_policy: SubjectPolicy::Abort,
            cross_check_settings: true,
            literature_reference_ms: 8.0,
        }
    }
}

impl AnalysisConfig {
    /// Load a configuration from a TOML file; missing keys take defaults
    ///
    /// Fails with `Io` when the file cannot be read and `InvalidConfig`
    /// naming the file when it does not parse.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| AnalysisError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        toml::from_str(&content)
            .map_err(|e| AnalysisError::InvalidConfig(format!("{}: {}", path.display(), e)))
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| AnalysisError::InvalidConfig(format!("TOML configuration: {e}")))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if !self.physio_min_ms.is_finite() || !self.physio_max_ms.is_finite() {
            return invalid(format!(
                "physiological bounds must be finite, got [{}, {}]",
                self.physio_min_ms, self.physio_max_ms
            ));
        }

        if self.physio_min_ms >= self.physio_max_ms {
            return invalid(format!(
                "physio_min_ms must be below physio_max_ms, got [{}, {}]",
                self.physio_min_ms, self.physio_max_ms
            ));
        }

        if !(self.iqr_multiplier.is_finite() && self.iqr_multiplier >= 0.0) {
            return invalid(format!(
                "iqr_multiplier must be non-negative, got {}",
                self.iqr_multiplier
            ));
        }

        if !(self.significance_level > 0.0 && self.significance_level < 1.0) {
            return invalid(format!(
                "significance_level must be in (0, 1), got {}",
                self.significance_level
            ));
        }

        if self.bonferroni_comparisons == 0 {
            return invalid("bonferroni_comparisons must be at least 1".to_string());
        }

        Ok(())
    }
}

/// Parameters of the biphasic stimulation pulse
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaveformConfig {
    /// Width of each of the four segments of a cycle (µs)
    pub pulse_width_us: u32,

    /// Biphasic cycles per pulse
    pub burst_count: u32,

    /// Pulses per stimulus
    pub pulse_count: u32,

    /// Silence between consecutive pulses (µs)
    pub pulse_interval_us: u32,

    /// Sampling step (µs)
    pub dt_us: u32,

    pub output_dir: PathBuf,
}

impl Default for WaveformConfig {
    fn default() -> Self {
        Self {
            pulse_width_us: 50,
            burst_count: 3,
            pulse_count: 1,
            pulse_interval_us: 40_000,
            dt_us: 1,
            output_dir: PathBuf::from("."),
        }
    }
}

impl WaveformConfig {
    pub fn validate(&self) -> Result<()> {
        if self.dt_us == 0 {
            return invalid("dt_us must be positive".to_string());
        }
        if self.pulse_width_us == 0 || self.pulse_width_us % self.dt_us != 0 {
            return invalid(format!(
                "pulse_width_us must be a positive multiple of dt_us ({}), got {}",
                self.dt_us, self.pulse_width_us
            ));
        }
        if self.pulse_interval_us % self.dt_us != 0 {
            return invalid(format!(
                "pulse_interval_us must be a multiple of dt_us ({}), got {}",
                self.dt_us, self.pulse_interval_us
            ));
        }
        if self.burst_count == 0 || self.pulse_count == 0 {
            return invalid("burst_count and pulse_count must be at least 1".to_string());
        }
        Ok(())
    }
}
