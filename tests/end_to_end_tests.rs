//! End-to-end analysis over synthetic experiment directories
//!
//! Each subject gets six correctly named sessions written in the on-disk
//! trial format; the full pipeline runs from directory scan to group result.

mod utils;

use emsrt::config::{AnalysisConfig, SubjectPolicy};
use emsrt::error::AnalysisError;
use emsrt::group::{PostHoc, TestOutcome};
use emsrt::pipeline::run_analysis;
use std::fs;
use std::path::Path;
use tempfile::TempDir;
use utils::{session_values, write_session, write_subject};

fn config_for(dir: &Path) -> AnalysisConfig {
    AnalysisConfig {
        input_dir: dir.to_path_buf(),
        output_dir: dir.to_path_buf(),
        ..AnalysisConfig::default()
    }
}

#[test]
fn test_two_subjects_one_improving() {
    let tmp = TempDir::new().unwrap();
    write_subject(tmp.path(), "A", 320.0, 310.0, 300.0);
    write_subject(tmp.path(), "B", 305.0, 305.0, 305.0);

    let outcome = run_analysis(&config_for(tmp.path())).unwrap();
    assert_eq!(outcome.subjects.len(), 2);

    let a = &outcome.subjects[0];
    assert_eq!(a.subject, "A");
    assert!((a.change_p2 - 20.0).abs() < 0.01, "A change_p2 = {}", a.change_p2);
    assert!((a.change_p1 - 10.0).abs() < 0.01);
    assert_eq!(a.baseline.n, 12);
    assert!(a.baseline_vs_p2.test.pvalue < 0.01);

    let b = &outcome.subjects[1];
    assert!(b.change_p2.abs() < 0.01);
    assert!(b.baseline_vs_p2.test.pvalue > 0.05);
    assert!(b.baseline_vs_p2.effect_size.abs() < 1e-6);

    let group = &outcome.group;
    assert!((group.change_p2.mean - 10.0).abs() < 0.01);
    let sd = group.change_p2.sd.unwrap();
    assert!((sd - 200f64.sqrt()).abs() < 0.01, "sd = {sd}");
    assert_eq!(group.pooled.baseline_n, 24);
    assert!(group.interpretation.consistent_with_literature);
}

#[test]
fn test_clear_group_effect_takes_corrected_post_hoc() {
    let tmp = TempDir::new().unwrap();
    write_subject(tmp.path(), "S1", 400.0, 300.0, 301.0);
    write_subject(tmp.path(), "S2", 402.0, 302.0, 299.0);
    write_subject(tmp.path(), "S3", 398.0, 298.0, 300.0);

    let outcome = run_analysis(&config_for(tmp.path())).unwrap();
    let pooled = &outcome.group.pooled;
    assert!(pooled.omnibus.pvalue < 0.05);
    let PostHoc::Corrected(pairs) = &pooled.post_hoc else {
        panic!("expected corrected post-hoc");
    };
    assert_eq!(pairs.len(), 3);
    assert!(pairs
        .iter()
        .all(|p| p.corrected_pvalue.is_some_and(|c| c <= 1.0)));

    // three subjects: one-sided signed-rank cannot go below 0.125
    let signed = outcome.group.signed_rank_p2.computed().unwrap();
    assert!(signed.underpowered);
    assert!(matches!(outcome.group.paired_t_p2, TestOutcome::Computed(_)));
}

#[test]
fn test_outliers_are_removed_from_files() {
    let tmp = TempDir::new().unwrap();
    write_subject(tmp.path(), "A", 320.0, 310.0, 300.0);
    let mut baseline = session_values(320.0);
    baseline.extend([45.0, 1450.0, 900.0]);
    write_session(tmp.path(), "A", "EMS_OFF", "20240501_091500", 0, &baseline);

    let outcome = run_analysis(&config_for(tmp.path())).unwrap();
    let series = &outcome.subjects[0].baseline_series;
    assert_eq!(series.original_n, 15);
    assert_eq!(series.removed_physio, 2);
    assert_eq!(series.removed_iqr, 1);
    assert_eq!(series.len(), 12);
}

#[test]
fn test_stimulus_offset_mismatch_is_warning_only() {
    let tmp = TempDir::new().unwrap();
    write_subject(tmp.path(), "A", 320.0, 310.0, 300.0);
    write_session(tmp.path(), "A", "EMS_OFF", "20240501_091500", 40, &session_values(320.0));

    let outcome = run_analysis(&config_for(tmp.path())).unwrap();
    let a = &outcome.subjects[0];
    assert_eq!(a.warnings.len(), 1);
    assert!(a.warnings[0].message.contains("StimulusOffset"));
    assert!((a.change_p2 - 20.0).abs() < 0.01);

    let mut config = config_for(tmp.path());
    config.cross_check_settings = false;
    let outcome = run_analysis(&config).unwrap();
    assert!(outcome.subjects[0].warnings.is_empty());
}

#[test]
fn test_subject_without_trials_header() {
    let tmp = TempDir::new().unwrap();
    write_subject(tmp.path(), "A", 320.0, 310.0, 300.0);
    write_subject(tmp.path(), "Broken", 320.0, 310.0, 300.0);
    fs::write(
        tmp.path().join("Data_Broken_EMS_OFF_20240501_103000.csv"),
        "--- Settings ---\nStimulusOffset,40\n1,Left,300\n",
    )
    .unwrap();

    let err = run_analysis(&config_for(tmp.path())).unwrap_err();
    assert!(matches!(err, AnalysisError::Format { .. }));
    assert!(err.to_string().contains("Data_Broken_EMS_OFF_20240501_103000.csv"));

    let mut config = config_for(tmp.path());
    config.subject_policy = SubjectPolicy::Exclude;
    let outcome = run_analysis(&config).unwrap();
    assert_eq!(outcome.subjects.len(), 1);
    assert_eq!(outcome.excluded[0].subject, "Broken");
}

#[test]
fn test_custom_physiological_bounds() {
    let tmp = TempDir::new().unwrap();
    write_subject(tmp.path(), "A", 320.0, 310.0, 300.0);

    let mut config = config_for(tmp.path());
    config.physio_min_ms = 300.0;
    let outcome = run_analysis(&config).unwrap();
    // the negative half of the jitter around 300 ms falls below the bound
    assert_eq!(outcome.subjects[0].phase2.n, 6);
    assert!(outcome.subjects[0].phase2.min >= 300.0);
    assert_eq!(outcome.subjects[0].baseline.n, 12);
}
