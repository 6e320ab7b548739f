//! Subject discovery and loading
//!
//! Data files follow `Data_<subject>_<EMS_ON|EMS_OFF>_<YYYYMMDD_HHMMSS>.csv`.
//! Anything else in the directory is ignored.

use regex::Regex;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use crate::error::{AnalysisError, Result};
use crate::trial_file::{parse_trial_file, RawTrialFile, StimulationStatus};

const FILE_NAME_PATTERN: &str = r"^Data_(\w+)_(EMS_ON|EMS_OFF)_(\d{8}_\d{6})\.csv$";

fn file_name_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(FILE_NAME_PATTERN).expect("file name pattern is valid"))
}

/// Components of a matching data file name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataFileName {
    pub subject: String,
    pub status: StimulationStatus,
    pub timestamp: String,
}

/// Match a file name against the data file convention
///
/// # Example
/// ```
/// use emsrt::loader::parse_file_name;
/// use emsrt::trial_file::StimulationStatus;
///
/// let name = parse_file_name("Data_John_Doe_EMS_OFF_20240501_093000.csv").unwrap();
/// assert_eq!(name.subject, "John_Doe");
/// assert_eq!(name.status, StimulationStatus::Off);
/// assert!(parse_file_name("notes.txt").is_none());
/// ```
pub fn parse_file_name(name: &str) -> Option<DataFileName> {
    let caps = file_name_regex().captures(name)?;
    Some(DataFileName {
        subject: caps[1].to_string(),
        status: StimulationStatus::from_tag(&caps[2])?,
        timestamp: caps[3].to_string(),
    })
}

/// A discovered, not yet parsed, data file
#[derive(Debug, Clone)]
pub struct DataFile {
    pub path: PathBuf,
    pub name: DataFileName,
}

/// All files of one subject, ordered by timestamp ascending
#[derive(Debug, Clone)]
pub struct SubjectFileSet {
    pub subject: String,
    pub files: Vec<RawTrialFile>,
}

impl SubjectFileSet {
    /// Build a set from parsed files, sorting them chronologically
    pub fn new(subject: impl Into<String>, mut files: Vec<RawTrialFile>) -> Self {
        // Fixed-width timestamps: lexicographic order is chronological
        files.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
        Self {
            subject: subject.into(),
            files,
        }
    }

    pub fn count(&self, status: StimulationStatus) -> usize {
        self.files.iter().filter(|f| f.status == status).count()
    }
}

/// Scan a directory and group matching data files by subject
///
/// Subjects come back in lexicographic order. Only directory access can
/// fail here; file contents are not read.
pub fn discover_subjects<P: AsRef<Path>>(dir: P) -> Result<BTreeMap<String, Vec<DataFile>>> {
    let dir = dir.as_ref();
    let io_err = |source| AnalysisError::Io {
        path: dir.to_path_buf(),
        source,
    };

    let mut subjects: BTreeMap<String, Vec<DataFile>> = BTreeMap::new();

    for entry in fs::read_dir(dir).map_err(io_err)? {
        let entry = entry.map_err(io_err)?;
        let file_name = entry.file_name();
        let Some(file_name) = file_name.to_str() else {
            continue;
        };

        match parse_file_name(file_name) {
            Some(name) => {
                subjects.entry(name.subject.clone()).or_default().push(DataFile {
                    path: entry.path(),
                    name,
                });
            }
            None => tracing::debug!("Ignoring non-data file {}", file_name),
        }
    }

    Ok(subjects)
}

/// Parse every file of one subject and order them chronologically
pub fn load_subject(subject: &str, files: &[DataFile]) -> Result<SubjectFileSet> {
    let mut parsed = Vec::with_capacity(files.len());

    for file in files {
        let table = parse_trial_file(&file.path)?;
        tracing::debug!(
            "Loaded {} ({} trials, {} settings)",
            file.path.display(),
            table.trials.len(),
            table.settings.len()
        );
        parsed.push(RawTrialFile {
            path: file.path.clone(),
            subject: subject.to_string(),
            status: file.name.status,
            timestamp: file.name.timestamp.clone(),
            settings: table.settings,
            trials: table.trials,
        });
    }

    Ok(SubjectFileSet::new(subject, parsed))
}

/// Discover and load every subject, failing on the first error
pub fn load_all_subjects<P: AsRef<Path>>(dir: P) -> Result<BTreeMap<String, SubjectFileSet>> {
    discover_subjects(dir)?
        .into_iter()
        .map(|(subject, files)| {
            let set = load_subject(&subject, &files)?;
            Ok((subject, set))
        })
        .collect()
}
