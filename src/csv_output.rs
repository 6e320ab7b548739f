//! CSV output for spreadsheet analysis
//!
//! - `analysis_summary.csv`: one row per subject (means/SDs/changes to 2
//!   decimals, effect sizes to 3, p-values to 4)
//! - `individual_trials.csv`: every cleaned trial of the three measurement
//!   phases, the data behind a per-trial scatter chart

use crate::phases::Phase;
use crate::subject::{SubjectResult, MEASUREMENT_PHASES};

pub const SUMMARY_FILE_NAME: &str = "analysis_summary.csv";
pub const TRIALS_FILE_NAME: &str = "individual_trials.csv";

const SUMMARY_HEADER: [&str; 16] = [
    "subject",
    "bl_mean_ms",
    "bl_sd",
    "bl_n",
    "p1_mean_ms",
    "p1_sd",
    "p1_n",
    "p2_mean_ms",
    "p2_sd",
    "p2_n",
    "change_p1_ms",
    "change_p2_ms",
    "d_p1",
    "d_p2",
    "p_bl_vs_p1",
    "p_bl_vs_p2",
];

/// Escape CSV field (handle commas, quotes, newlines)
fn escape_field(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Per-subject summary table
#[derive(Debug, Default)]
pub struct SummaryCsv {
    rows: Vec<Vec<String>>,
}

impl SummaryCsv {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_results(results: &[SubjectResult]) -> Self {
        let mut csv = Self::new();
        for result in results {
            csv.add_subject(result);
        }
        csv
    }

    /// Add one subject row
    pub fn add_subject(&mut self, r: &SubjectResult) {
        let mut row = vec![escape_field(&r.subject)];
        for d in [&r.baseline, &r.phase1, &r.phase2] {
            row.push(format!("{:.2}", d.mean));
            row.push(format!("{:.2}", d.sd));
            row.push(d.n.to_string());
        }
        row.push(format!("{:.2}", r.change_p1));
        row.push(format!("{:.2}", r.change_p2));
        row.push(format!("{:.3}", r.baseline_vs_p1.effect_size));
        row.push(format!("{:.3}", r.baseline_vs_p2.effect_size));
        row.push(format!("{:.4}", r.baseline_vs_p1.test.pvalue));
        row.push(format!("{:.4}", r.baseline_vs_p2.test.pvalue));
        self.rows.push(row);
    }

    /// Generate CSV output as string
    pub fn to_csv(&self) -> String {
        let mut output = SUMMARY_HEADER.join(",");
        output.push('\n');
        for row in &self.rows {
            output.push_str(&row.join(","));
            output.push('\n');
        }
        output
    }
}

/// One cleaned trial
#[derive(Debug, Clone, PartialEq)]
pub struct CsvTrial {
    pub subject: String,
    pub phase: Phase,
    /// 1-based position among the phase's cleaned trials
    pub ordinal: usize,
    pub reaction_time_ms: f64,
}

/// Per-trial table of cleaned reaction times
#[derive(Debug, Default)]
pub struct TrialsCsv {
    trials: Vec<CsvTrial>,
}

impl TrialsCsv {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_results(results: &[SubjectResult]) -> Self {
        let mut csv = Self::new();
        for result in results {
            csv.add_subject(result);
        }
        csv
    }

    /// Add every cleaned trial of one subject's measurement phases
    pub fn add_subject(&mut self, r: &SubjectResult) {
        for phase in MEASUREMENT_PHASES {
            let Some(series) = r.series(phase) else {
                continue;
            };
            for (i, rt) in series.values.iter().enumerate() {
                self.trials.push(CsvTrial {
                    subject: r.subject.clone(),
                    phase,
                    ordinal: i + 1,
                    reaction_time_ms: *rt,
                });
            }
        }
    }

    pub fn len(&self) -> usize {
        self.trials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trials.is_empty()
    }

    pub fn to_csv(&self) -> String {
        let mut output = String::from("subject,phase,trial,reaction_time_ms\n");
        for t in &self.trials {
            output.push_str(&format!(
                "{},{},{},{}\n",
                escape_field(&t.subject),
                t.phase,
                t.ordinal,
                t.reaction_time_ms
            ));
        }
        output
    }
}
