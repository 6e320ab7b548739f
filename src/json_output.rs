//! JSON output format for a full analysis run
//!
//! `--format json`: every subject result, the group result and the
//! configuration that produced them, written to `analysis_report.json`.

use serde::Serialize;

use crate::config::AnalysisConfig;
use crate::group::GroupResult;
use crate::pipeline::{AnalysisOutcome, ExcludedSubject};
use crate::subject::SubjectResult;

pub const REPORT_FILE_NAME: &str = "analysis_report.json";

/// Root JSON output structure
#[derive(Debug, Clone, Serialize)]
pub struct JsonReport<'a> {
    /// Format version identifier
    pub version: String,
    /// Format name
    pub format: String,
    pub config: &'a AnalysisConfig,
    pub subjects: &'a [SubjectResult],
    pub group: &'a GroupResult,
    #[serde(skip_serializing_if = "none_excluded")]
    pub excluded: &'a [ExcludedSubject],
}

fn none_excluded(excluded: &&[ExcludedSubject]) -> bool {
    excluded.is_empty()
}

impl<'a> JsonReport<'a> {
    pub fn new(outcome: &'a AnalysisOutcome, config: &'a AnalysisConfig) -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            format: "emsrt-json-v1".to_string(),
            config,
            subjects: &outcome.subjects,
            group: &outcome.group,
            excluded: &outcome.excluded,
        }
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::group::analyze_group;
    use crate::outlier::{remove_outliers, OutlierBounds};
    use crate::subject::analyze_cleaned;

    fn outcome(excluded: Vec<ExcludedSubject>) -> AnalysisOutcome {
        let clean = |v: &[f64]| remove_outliers(v, "t", &OutlierBounds::default()).unwrap();
        let subjects = vec![analyze_cleaned(
            "A",
            clean(&[300.0, 310.0, 290.0, 305.0]),
            clean(&[295.0, 300.0, 288.0, 296.0]),
            clean(&[280.0, 275.0, 285.0, 270.0]),
        )
        .unwrap()];
        let group = analyze_group(&subjects, &AnalysisConfig::default()).unwrap();
        AnalysisOutcome {
            subjects,
            group,
            excluded,
        }
    }

    #[test]
    fn test_report_structure() {
        let outcome = outcome(Vec::new());
        let config = AnalysisConfig::default();
        let json = JsonReport::new(&outcome, &config).to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["format"], "emsrt-json-v1");
        assert_eq!(value["subjects"][0]["subject"], "A");
        assert_eq!(value["subjects"][0]["baseline"]["n"], 4);
        assert_eq!(value["group"]["subjects"], 1);
        assert_eq!(value["config"]["physio_min_ms"], 100.0);
        assert!(value.get("excluded").is_none());
    }

    #[test]
    fn test_not_computable_tests_are_tagged() {
        let outcome = outcome(Vec::new());
        let config = AnalysisConfig::default();
        let json = JsonReport::new(&outcome, &config).to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert!(value["group"]["paired_t_p1"]["not_computable"]["reason"]
            .as_str()
            .unwrap()
            .contains("2 subjects"));
        assert_eq!(
            value["group"]["signed_rank_p2"]["computed"]["underpowered"],
            true
        );
        assert!(value["group"]["pooled"]["post_hoc"].is_object());
    }

    #[test]
    fn test_excluded_subjects_listed() {
        let outcome = outcome(vec![ExcludedSubject {
            subject: "C".to_string(),
            reason: "missing phase".to_string(),
        }]);
        let config = AnalysisConfig::default();
        let json = JsonReport::new(&outcome, &config).to_json().unwrap();
        assert!(json.contains("\"excluded\""));
        assert!(json.contains("missing phase"));
    }
}
