//! Trial record file parsing
//!
//! One measurement session is exported as a line-oriented text file:
//!
//! ```text
//! --- Settings ---
//! <key>,<value>
//! Trial,Direction,ReactionTime_ms[,...]
//! <int>,<label>,<float>[,...]
//! --- Summary ---
//! <ignored trailer>
//! ```
//!
//! Rows that cannot be parsed are dropped. A file without a trials header is
//! a format error.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{AnalysisError, Result};

/// Line that switches the parser into settings mode
pub const SETTINGS_MARKER: &str = "--- Settings ---";

/// Line that ends parsing
pub const SUMMARY_MARKER: &str = "--- Summary ---";

/// Leading fields of the trials header line
pub const TRIALS_HEADER: [&str; 3] = ["Trial", "Direction", "ReactionTime_ms"];

/// Whether electrical stimulation was active during a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StimulationStatus {
    On,
    Off,
}

impl StimulationStatus {
    /// Parse the file name tag (`EMS_ON` / `EMS_OFF`)
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "EMS_ON" => Some(StimulationStatus::On),
            "EMS_OFF" => Some(StimulationStatus::Off),
            _ => None,
        }
    }

    pub fn tag(&self) -> &'static str {
        match self {
            StimulationStatus::On => "EMS_ON",
            StimulationStatus::Off => "EMS_OFF",
        }
    }
}

impl fmt::Display for StimulationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// One measured trial
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialRecord {
    pub trial: i64,
    pub direction: String,
    pub reaction_time_ms: f64,
}

/// Settings and trials parsed from one file body
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrialTable {
    pub settings: BTreeMap<String, String>,
    pub trials: Vec<TrialRecord>,
}

/// One measurement session, immutable after load
#[derive(Debug, Clone)]
pub struct RawTrialFile {
    pub path: PathBuf,
    pub subject: String,
    pub status: StimulationStatus,
    /// `YYYYMMDD_HHMMSS`, sorts chronologically as a string
    pub timestamp: String,
    pub settings: BTreeMap<String, String>,
    pub trials: Vec<TrialRecord>,
}

impl RawTrialFile {
    /// File name without directory, for diagnostics
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }

    pub fn setting(&self, key: &str) -> Option<&str> {
        self.settings.get(key).map(String::as_str)
    }

    /// Reaction times in recorded order
    pub fn reaction_times(&self) -> Vec<f64> {
        self.trials.iter().map(|t| t.reaction_time_ms).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Preamble,
    Settings,
    Trials,
}

fn is_trials_header(line: &str) -> bool {
    let mut fields = line.split(',');
    TRIALS_HEADER
        .iter()
        .all(|expected| fields.next() == Some(*expected))
}

fn parse_trial_row(line: &str) -> Option<TrialRecord> {
    let parts: Vec<&str> = line.split(',').collect();
    if parts.len() < 3 {
        return None;
    }

    let trial = parts[0].trim().parse::<i64>().ok()?;
    let reaction_time_ms = parts[2]
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|rt| rt.is_finite())?;

    Some(TrialRecord {
        trial,
        direction: parts[1].to_string(),
        reaction_time_ms,
    })
}

/// Parse a trial file body held in memory
///
/// `source` only labels errors.
pub fn parse_trial_str(content: &str, source: &Path) -> Result<TrialTable> {
    let mut table = TrialTable::default();
    let mut section = Section::Preamble;
    let mut saw_header = false;

    for (line_no, raw) in content.lines().enumerate() {
        let raw = if line_no == 0 {
            raw.trim_start_matches('\u{feff}')
        } else {
            raw
        };
        let line = raw.trim();

        if line == SETTINGS_MARKER {
            section = Section::Settings;
            continue;
        }
        if line == SUMMARY_MARKER {
            break;
        }
        if is_trials_header(line) {
            section = Section::Trials;
            saw_header = true;
            continue;
        }

        match section {
            Section::Preamble => {}
            Section::Settings => {
                if let Some((key, value)) = line.split_once(',') {
                    table
                        .settings
                        .insert(key.trim().to_string(), value.trim().to_string());
                }
            }
            Section::Trials => {
                if line.is_empty() {
                    continue;
                }
                match parse_trial_row(line) {
                    Some(record) => table.trials.push(record),
                    None => tracing::debug!(
                        "{}:{}: dropping malformed trial row {:?}",
                        source.display(),
                        line_no + 1,
                        line
                    ),
                }
            }
        }
    }

    if !saw_header {
        return Err(AnalysisError::Format {
            path: source.to_path_buf(),
            reason: format!("trials header '{}' not found", TRIALS_HEADER.join(",")),
        });
    }

    Ok(table)
}

/// Read and parse a trial file from disk
pub fn parse_trial_file<P: AsRef<Path>>(path: P) -> Result<TrialTable> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|source| AnalysisError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let content = String::from_utf8(bytes).map_err(|e| AnalysisError::Format {
        path: path.to_path_buf(),
        reason: format!("not valid UTF-8 text ({e})"),
    })?;

    parse_trial_str(&content, path)
}
