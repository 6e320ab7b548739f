//! End-to-end analysis run
//!
//! discover → per subject (load, classify, clean, analyse) → group.
//! Subjects are independent; the group step waits for all of them.

use serde::Serialize;

use crate::config::{AnalysisConfig, SubjectPolicy};
use crate::error::{AnalysisError, Result};
use crate::group::{analyze_group, GroupResult};
use crate::loader::{discover_subjects, load_subject, DataFile};
use crate::phases::classify_phases;
use crate::subject::{analyze_subject, SubjectResult};

/// A subject left out of the group analysis
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExcludedSubject {
    pub subject: String,
    pub reason: String,
}

/// Everything one analysis run produces
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisOutcome {
    /// Analysed subjects in lexicographic order
    pub subjects: Vec<SubjectResult>,
    pub group: GroupResult,
    /// Subjects skipped under [`SubjectPolicy::Exclude`]
    pub excluded: Vec<ExcludedSubject>,
}

fn process_subject(subject: &str, files: &[DataFile], config: &AnalysisConfig) -> Result<SubjectResult> {
    let set = load_subject(subject, files)?;
    tracing::info!("Subject {}: {} files", subject, set.files.len());
    let assignment = classify_phases(&set, config.cross_check_settings);
    analyze_subject(&assignment, config)
}

/// Run the whole analysis over `config.input_dir`
///
/// Directory and configuration problems always abort. Errors scoped to one
/// subject abort under [`SubjectPolicy::Abort`] and exclude the subject
/// under [`SubjectPolicy::Exclude`].
pub fn run_analysis(config: &AnalysisConfig) -> Result<AnalysisOutcome> {
    config.validate()?;

    let discovered = discover_subjects(&config.input_dir)?;
    tracing::info!(
        "Found {} subjects in {}",
        discovered.len(),
        config.input_dir.display()
    );

    let mut subjects = Vec::with_capacity(discovered.len());
    let mut excluded = Vec::new();

    for (subject, files) in &discovered {
        match process_subject(subject, files, config) {
            Ok(result) => subjects.push(result),
            Err(e) if e.is_subject_scoped() && config.subject_policy == SubjectPolicy::Exclude => {
                tracing::warn!("Excluding subject {}: {}", subject, e);
                excluded.push(ExcludedSubject {
                    subject: subject.clone(),
                    reason: e.to_string(),
                });
            }
            Err(e) => return Err(e),
        }
    }

    if subjects.is_empty() {
        return Err(AnalysisError::DataInsufficient {
            context: format!("analysis of {} (analysable subjects)", config.input_dir.display()),
            required: 1,
            actual: 0,
        });
    }

    let group = analyze_group(&subjects, config)?;

    Ok(AnalysisOutcome {
        subjects,
        group,
        excluded,
    })
}
