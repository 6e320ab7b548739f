//! Per-subject analysis of the three measurement phases
//!
//! Baseline, post-training phase 1 and post-training phase 2 are cleaned,
//! summarised and compared pairwise with one-sided rank-sum tests
//! (alternative: the earlier phase is slower) and the equal-weight effect
//! size. Change scores are `baseline mean - post mean`, positive when the
//! subject reacts faster after training.

use serde::Serialize;

use crate::config::AnalysisConfig;
use crate::error::Result;
use crate::outlier::{remove_outliers, CleanedSeries, OutlierBounds};
use crate::phases::{ClassificationWarning, Phase, PhaseAssignment};
use crate::stats::{describe, effect_size_from, mann_whitney_u, Alternative, Descriptive, RankSumTest};

/// One pairwise phase comparison
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PhaseComparison {
    /// One-sided rank-sum test, first phase greater
    pub test: RankSumTest,
    pub effect_size: f64,
}

/// Analysis of one subject
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubjectResult {
    pub subject: String,

    pub baseline: Descriptive,
    pub phase1: Descriptive,
    pub phase2: Descriptive,

    /// Baseline mean minus post-phase-1 mean (ms)
    pub change_p1: f64,
    /// Baseline mean minus post-phase-2 mean (ms)
    pub change_p2: f64,

    pub baseline_vs_p1: PhaseComparison,
    pub baseline_vs_p2: PhaseComparison,
    pub p1_vs_p2: PhaseComparison,

    /// Cleaned series, kept for the pooled group analysis
    pub baseline_series: CleanedSeries,
    pub phase1_series: CleanedSeries,
    pub phase2_series: CleanedSeries,

    pub warnings: Vec<ClassificationWarning>,
}

impl SubjectResult {
    /// Cleaned series of one measurement phase
    pub fn series(&self, phase: Phase) -> Option<&CleanedSeries> {
        match phase {
            Phase::Baseline => Some(&self.baseline_series),
            Phase::MeasurePhase1 => Some(&self.phase1_series),
            Phase::MeasurePhase2 => Some(&self.phase2_series),
            _ => None,
        }
    }
}

/// Phases taking part in the per-subject analysis, in comparison order
pub const MEASUREMENT_PHASES: [Phase; 3] = [Phase::Baseline, Phase::MeasurePhase1, Phase::MeasurePhase2];

fn compare(first: &CleanedSeries, a: &Descriptive, second: &CleanedSeries, b: &Descriptive) -> Result<PhaseComparison> {
    let test = mann_whitney_u(&first.values, &second.values, Alternative::Greater)?;
    let effect_size = effect_size_from(a, b)?;
    Ok(PhaseComparison { test, effect_size })
}

/// Analyse three already-cleaned measurement series
pub fn analyze_cleaned(
    subject: &str,
    baseline_series: CleanedSeries,
    phase1_series: CleanedSeries,
    phase2_series: CleanedSeries,
) -> Result<SubjectResult> {
    let scope = format!("subject {subject}");

    let baseline = describe(&baseline_series.values, &format!("{scope} {}", Phase::Baseline))?;
    let phase1 = describe(&phase1_series.values, &format!("{scope} {}", Phase::MeasurePhase1))?;
    let phase2 = describe(&phase2_series.values, &format!("{scope} {}", Phase::MeasurePhase2))?;

    let baseline_vs_p1 = compare(&baseline_series, &baseline, &phase1_series, &phase1)
        .map_err(|e| e.in_context(&format!("{scope} baseline vs phase 1")))?;
    let baseline_vs_p2 = compare(&baseline_series, &baseline, &phase2_series, &phase2)
        .map_err(|e| e.in_context(&format!("{scope} baseline vs phase 2")))?;
    let p1_vs_p2 = compare(&phase1_series, &phase1, &phase2_series, &phase2)
        .map_err(|e| e.in_context(&format!("{scope} phase 1 vs phase 2")))?;

    Ok(SubjectResult {
        subject: subject.to_string(),
        change_p1: baseline.mean - phase1.mean,
        change_p2: baseline.mean - phase2.mean,
        baseline,
        phase1,
        phase2,
        baseline_vs_p1,
        baseline_vs_p2,
        p1_vs_p2,
        baseline_series,
        phase1_series,
        phase2_series,
        warnings: Vec::new(),
    })
}

/// Clean and analyse the measurement phases of one subject
///
/// Fails with `MissingPhase` when a measurement phase has no file and with
/// `DataInsufficient` when a cleaned phase keeps fewer than two trials.
pub fn analyze_subject(assignment: &PhaseAssignment, config: &AnalysisConfig) -> Result<SubjectResult> {
    let bounds = OutlierBounds::from(config);
    let subject = assignment.subject.as_str();

    let clean = |phase: Phase| -> Result<CleanedSeries> {
        let file = assignment.require(phase)?;
        remove_outliers(&file.reaction_times(), &format!("{subject}/{phase}"), &bounds)
    };
    let baseline = clean(Phase::Baseline)?;
    let phase1 = clean(Phase::MeasurePhase1)?;
    let phase2 = clean(Phase::MeasurePhase2)?;

    let mut result = analyze_cleaned(subject, baseline, phase1, phase2)?;
    result.warnings = assignment.warnings.clone();

    tracing::info!(
        "Subject {}: baseline {:.1} ms, change p1 {:+.1} ms, change p2 {:+.1} ms",
        subject,
        result.baseline.mean,
        result.change_p1,
        result.change_p2
    );

    Ok(result)
}
