//! CLI argument parsing for emsrt

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::config::{AnalysisConfig, SubjectPolicy, WaveformConfig};

/// Report format for the analysis
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text report on stdout (default)
    Text,
    /// Text report plus analysis_report.json in the output directory
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "emsrt")]
#[command(version)]
#[command(about = "Reaction-time statistics for EMS training experiments", long_about = None)]
pub struct Cli {
    /// Enable debug tracing output to stderr
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Analyse all subjects in a data directory
    Analyze(AnalyzeArgs),
    /// Generate the biphasic stimulation waveform
    Waveform(WaveformArgs),
}

#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// Directory with Data_<subject>_<EMS_ON|EMS_OFF>_<timestamp>.csv files
    #[arg(short, long, value_name = "DIR")]
    pub input: Option<PathBuf>,

    /// Directory receiving the CSV (and JSON) outputs
    #[arg(short, long, value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// TOML configuration file; flags override its values
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Lower physiological bound (ms)
    #[arg(long = "physio-min", value_name = "MS")]
    pub physio_min: Option<f64>,

    /// Upper physiological bound (ms)
    #[arg(long = "physio-max", value_name = "MS")]
    pub physio_max: Option<f64>,

    /// Tukey fence multiplier
    #[arg(long = "iqr-multiplier", value_name = "K")]
    pub iqr_multiplier: Option<f64>,

    /// Skip subjects that cannot be analysed instead of aborting
    #[arg(long = "exclude-failed-subjects")]
    pub exclude_failed_subjects: bool,

    /// Do not compare StimulusOffset settings with the assigned phases
    #[arg(long = "no-cross-check")]
    pub no_cross_check: bool,

    /// Output format (text or json)
    #[arg(long = "format", value_enum, default_value = "text")]
    pub format: OutputFormat,
}

impl AnalyzeArgs {
    /// Apply command-line overrides on top of a base configuration
    pub fn apply(&self, mut config: AnalysisConfig) -> AnalysisConfig {
        if let Some(input) = &self.input {
            config.input_dir = input.clone();
        }
        if let Some(output) = &self.output {
            config.output_dir = output.clone();
        }
        if let Some(min) = self.physio_min {
            config.physio_min_ms = min;
        }
        if let Some(max) = self.physio_max {
            config.physio_max_ms = max;
        }
        if let Some(k) = self.iqr_multiplier {
            config.iqr_multiplier = k;
        }
        if self.exclude_failed_subjects {
            config.subject_policy = SubjectPolicy::Exclude;
        }
        if self.no_cross_check {
            config.cross_check_settings = false;
        }
        config
    }
}

#[derive(Args, Debug, Default)]
pub struct WaveformArgs {
    /// Directory receiving ems_waveform.csv
    #[arg(short, long, value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Width of each phase of a cycle (µs)
    #[arg(long = "pulse-width", value_name = "US")]
    pub pulse_width: Option<u32>,

    /// Biphasic cycles per pulse
    #[arg(long = "burst-count", value_name = "N")]
    pub burst_count: Option<u32>,

    /// Pulses per stimulus
    #[arg(long = "pulse-count", value_name = "N")]
    pub pulse_count: Option<u32>,

    /// Silence between pulses (µs)
    #[arg(long = "pulse-interval", value_name = "US")]
    pub pulse_interval: Option<u32>,
}

impl WaveformArgs {
    pub fn to_config(&self) -> WaveformConfig {
        let defaults = WaveformConfig::default();
        WaveformConfig {
            pulse_width_us: self.pulse_width.unwrap_or(defaults.pulse_width_us),
            burst_count: self.burst_count.unwrap_or(defaults.burst_count),
            pulse_count: self.pulse_count.unwrap_or(defaults.pulse_count),
            pulse_interval_us: self.pulse_interval.unwrap_or(defaults.pulse_interval_us),
            output_dir: self.output.clone().unwrap_or(defaults.output_dir),
            ..defaults
        }
    }
}
