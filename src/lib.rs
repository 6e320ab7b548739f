//! emsrt - Reaction-time statistics for EMS training experiments
//!
//! This library loads per-session trial files, assigns them to experimental
//! phases, removes outliers, and runs per-subject and group-level rank-based
//! tests. It also generates the biphasic stimulation waveform used in the
//! protocol and draws SVG charts of both.

pub mod charts;
pub mod cli;
pub mod config;
pub mod csv_output;
pub mod error;
pub mod group;
pub mod json_output;
pub mod loader;
pub mod outlier;
pub mod phases;
pub mod pipeline;
pub mod report;
pub mod stats;
pub mod subject;
pub mod trial_file;
pub mod waveform;
