//! Error taxonomy for the reaction-time analysis pipeline
//!
//! Malformed trial rows and non-matching file names are not errors: they are
//! skipped while loading. Everything else surfaces here with the subject,
//! file or phase it concerns.

use std::path::PathBuf;
use thiserror::Error;

use crate::phases::Phase;

/// Errors that can occur while loading or analysing experiment data
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed trial file {}: {reason}", path.display())]
    Format { path: PathBuf, reason: String },

    #[error(
        "Subject {subject}: phase '{phase}' is missing ({on_files} EMS_ON / {off_files} EMS_OFF files, need 3 of each)"
    )]
    MissingPhase {
        subject: String,
        phase: Phase,
        on_files: usize,
        off_files: usize,
    },

    #[error("Insufficient data for {context}: need at least {required} observations, got {actual}")]
    DataInsufficient {
        context: String,
        required: usize,
        actual: usize,
    },

    #[error("Degenerate data for {context}: {reason}")]
    Degenerate { context: String, reason: String },

    #[error("Numeric backend failure: {0}")]
    Numeric(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Chart rendering failed: {0}")]
    Render(String),
}

impl AnalysisError {
    /// Whether the error concerns a single subject and may be handled by
    /// excluding that subject instead of aborting the run
    pub fn is_subject_scoped(&self) -> bool {
        matches!(
            self,
            AnalysisError::Format { .. }
                | AnalysisError::MissingPhase { .. }
                | AnalysisError::DataInsufficient { .. }
                | AnalysisError::Degenerate { .. }
        )
    }

    /// Prefix the context of a statistics error with a subject or pool name
    pub fn in_context(self, prefix: &str) -> Self {
        match self {
            AnalysisError::DataInsufficient {
                context,
                required,
                actual,
            } => AnalysisError::DataInsufficient {
                context: format!("{prefix}: {context}"),
                required,
                actual,
            },
            AnalysisError::Degenerate { context, reason } => AnalysisError::Degenerate {
                context: format!("{prefix}: {context}"),
                reason,
            },
            other => other,
        }
    }
}

/// Result type for analysis operations
pub type Result<T> = std::result::Result<T, AnalysisError>;
