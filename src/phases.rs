//! Positional phase classification
//!
//! Among a subject's EMS_ON files in chronological order the first three are
//! the EMS response measurement and the two training blocks; among EMS_OFF
//! files the first three are baseline and the two post-training measurements.
//! The assignment never looks at file contents. An optional cross-check
//! compares the `StimulusOffset` setting with the expected phase and records
//! mismatches as warnings.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::{AnalysisError, Result};
use crate::loader::SubjectFileSet;
use crate::trial_file::{RawTrialFile, StimulationStatus};

/// Settings key holding the stimulus offset of a session
pub const STIMULUS_OFFSET_KEY: &str = "StimulusOffset";

/// Number of files of each stimulation status the protocol produces
pub const FILES_PER_STATUS: usize = 3;

/// The six experimental stages
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    EmsResponse,
    TrainPhase1,
    TrainPhase2,
    Baseline,
    MeasurePhase1,
    MeasurePhase2,
}

impl Phase {
    pub const ALL: [Phase; 6] = [
        Phase::EmsResponse,
        Phase::TrainPhase1,
        Phase::TrainPhase2,
        Phase::Baseline,
        Phase::MeasurePhase1,
        Phase::MeasurePhase2,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Phase::EmsResponse => "ems_response",
            Phase::TrainPhase1 => "train_phase1",
            Phase::TrainPhase2 => "train_phase2",
            Phase::Baseline => "baseline",
            Phase::MeasurePhase1 => "measure_phase1",
            Phase::MeasurePhase2 => "measure_phase2",
        }
    }

    pub fn status(&self) -> StimulationStatus {
        match self {
            Phase::EmsResponse | Phase::TrainPhase1 | Phase::TrainPhase2 => {
                StimulationStatus::On
            }
            Phase::Baseline | Phase::MeasurePhase1 | Phase::MeasurePhase2 => {
                StimulationStatus::Off
            }
        }
    }

    /// Zero-based position among files of the same status
    pub fn position(&self) -> usize {
        match self {
            Phase::EmsResponse | Phase::Baseline => 0,
            Phase::TrainPhase1 | Phase::MeasurePhase1 => 1,
            Phase::TrainPhase2 | Phase::MeasurePhase2 => 2,
        }
    }

    fn at(status: StimulationStatus, position: usize) -> Option<Phase> {
        Phase::ALL
            .into_iter()
            .find(|p| p.status() == status && p.position() == position)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A file that could not be classified cleanly
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassificationWarning {
    /// Phase the file was assigned to; `None` for a surplus file beyond the
    /// three sessions of its status
    pub phase: Option<Phase>,
    pub file: String,
    pub message: String,
}

impl ClassificationWarning {
    /// Phase name, or `unassigned` for a surplus file
    pub fn phase_label(&self) -> &'static str {
        self.phase.map_or("unassigned", |p| p.name())
    }
}

/// Mapping from phase to session file for one subject
#[derive(Debug, Clone)]
pub struct PhaseAssignment {
    pub subject: String,
    phases: BTreeMap<Phase, RawTrialFile>,
    on_files: usize,
    off_files: usize,
    pub warnings: Vec<ClassificationWarning>,
}

impl PhaseAssignment {
    pub fn get(&self, phase: Phase) -> Option<&RawTrialFile> {
        self.phases.get(&phase)
    }

    /// Access a phase that downstream analysis cannot do without
    pub fn require(&self, phase: Phase) -> Result<&RawTrialFile> {
        self.get(phase).ok_or_else(|| AnalysisError::MissingPhase {
            subject: self.subject.clone(),
            phase,
            on_files: self.on_files,
            off_files: self.off_files,
        })
    }

    pub fn is_complete(&self) -> bool {
        Phase::ALL.iter().all(|p| self.phases.contains_key(p))
    }

    pub fn missing(&self) -> Vec<Phase> {
        Phase::ALL
            .into_iter()
            .filter(|p| !self.phases.contains_key(p))
            .collect()
    }
}

/// Assign phases to a subject's chronologically ordered files
///
/// With `cross_check` enabled the `StimulusOffset` setting is compared with
/// the assigned phase: baseline sessions run with offset 0 and the
/// post-training measurements with a non-zero offset.
pub fn classify_phases(set: &SubjectFileSet, cross_check: bool) -> PhaseAssignment {
    let mut phases = BTreeMap::new();
    let mut warnings = Vec::new();
    let mut counts = [0usize; 2];

    for file in &set.files {
        let slot = match file.status {
            StimulationStatus::On => 0,
            StimulationStatus::Off => 1,
        };
        let position = counts[slot];
        counts[slot] += 1;

        match Phase::at(file.status, position) {
            Some(phase) => {
                if cross_check {
                    if let Some(warning) = check_offset(phase, file) {
                        warnings.push(warning);
                    }
                }
                phases.insert(phase, file.clone());
            }
            None => warnings.push(ClassificationWarning {
                phase: None,
                file: file.file_name(),
                message: format!(
                    "surplus {} file ignored (more than {} sessions)",
                    file.status, FILES_PER_STATUS
                ),
            }),
        }
    }

    for warning in &warnings {
        tracing::warn!(
            "Subject {}: {} ({}): {}",
            set.subject,
            warning.phase_label(),
            warning.file,
            warning.message
        );
    }

    PhaseAssignment {
        subject: set.subject.clone(),
        phases,
        on_files: counts[0],
        off_files: counts[1],
        warnings,
    }
}

fn check_offset(phase: Phase, file: &RawTrialFile) -> Option<ClassificationWarning> {
    let raw = file.setting(STIMULUS_OFFSET_KEY)?;
    let warn = |message: String| ClassificationWarning {
        phase: Some(phase),
        file: file.file_name(),
        message,
    };

    let Ok(offset) = raw.parse::<f64>() else {
        return Some(warn(format!("unparseable {STIMULUS_OFFSET_KEY} value {raw:?}")));
    };

    match phase {
        Phase::Baseline if offset != 0.0 => Some(warn(format!(
            "baseline expected {STIMULUS_OFFSET_KEY}=0, found {raw}"
        ))),
        Phase::MeasurePhase1 | Phase::MeasurePhase2 if offset == 0.0 => Some(warn(format!(
            "post-training measurement expected non-zero {STIMULUS_OFFSET_KEY}, found {raw}"
        ))),
        _ => None,
    }
}
