//! Group-level aggregation across subjects
//!
//! Two views of the same experiment:
//! - Subject level: per-subject means, change scores and effect sizes are
//!   summarised; paired t-tests and signed-rank tests run on them. With the
//!   handful of subjects in one session these are informational only.
//! - Trial level: every cleaned trial is pooled per phase, ignoring subject
//!   identity, and compared with a Kruskal-Wallis omnibus test. A
//!   significant omnibus result is followed by Bonferroni-corrected
//!   two-sided pairwise tests over all three pairs; otherwise one-sided
//!   baseline comparisons are reported uncorrected as supplementary
//!   information.

use serde::Serialize;

use crate::config::AnalysisConfig;
use crate::error::{AnalysisError, Result};
use crate::phases::Phase;
use crate::stats::{
    bonferroni, effect_size_population, kruskal_wallis, mann_whitney_u, mean, paired_t_test, sample_sd,
    wilcoxon_signed_rank, Alternative, KruskalWallisTest, PairedTTest, RankSumTest, SignedRankTest,
};
use crate::subject::SubjectResult;

/// Mean and spread of one per-subject quantity across subjects
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GroupStat {
    pub mean: f64,
    /// Sample SD across subjects; `None` with fewer than two subjects
    pub sd: Option<f64>,
}

impl GroupStat {
    fn of(values: &[f64], context: &str) -> Result<Self> {
        Ok(GroupStat {
            mean: mean(values, context)?,
            sd: sample_sd(values),
        })
    }
}

/// A group test that may not be computable for the available subjects
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TestOutcome<T> {
    Computed(T),
    NotComputable { reason: String },
}

impl<T> TestOutcome<T> {
    pub fn computed(&self) -> Option<&T> {
        match self {
            TestOutcome::Computed(value) => Some(value),
            TestOutcome::NotComputable { .. } => None,
        }
    }

    /// Why the test was skipped, if it was
    pub fn reason(&self) -> Option<&str> {
        match self {
            TestOutcome::Computed(_) => None,
            TestOutcome::NotComputable { reason } => Some(reason),
        }
    }

    fn from_result(result: Result<T>) -> Self {
        match result {
            Ok(value) => TestOutcome::Computed(value),
            Err(e) => TestOutcome::NotComputable {
                reason: e.to_string(),
            },
        }
    }
}

/// Signed-rank test on change scores with its power flag
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SignedRankOutcome {
    pub test: SignedRankTest,
    /// The smallest achievable p-value does not reach the significance level
    pub underpowered: bool,
}

/// One pairwise comparison of pooled phases
///
/// The rank-sum test and the effect size are computed independently; either
/// can be degenerate (e.g. both pools constant) without dropping the other
/// or the rest of the group analysis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PooledComparison {
    pub first: Phase,
    pub second: Phase,
    pub test: TestOutcome<RankSumTest>,
    /// Bonferroni-adjusted p-value; `None` for uncorrected comparisons or
    /// when the test was not computable
    pub corrected_pvalue: Option<f64>,
    /// Equal-weight effect size with population SDs of the pooled trials
    pub effect_size: TestOutcome<f64>,
}

/// Follow-up to the omnibus test
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PostHoc {
    /// Omnibus significant: two-sided tests on all pairs, Bonferroni-corrected
    Corrected(Vec<PooledComparison>),
    /// Omnibus not significant: one-sided baseline comparisons, uncorrected
    Supplementary(Vec<PooledComparison>),
}

impl PostHoc {
    pub fn comparisons(&self) -> &[PooledComparison] {
        match self {
            PostHoc::Corrected(c) | PostHoc::Supplementary(c) => c,
        }
    }
}

/// Trial-level analysis over the pooled phases
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PooledAnalysis {
    pub baseline_n: usize,
    pub phase1_n: usize,
    pub phase2_n: usize,
    pub omnibus: KruskalWallisTest,
    pub post_hoc: PostHoc,
}

/// Plain-language reading of the group change after phase 2
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Interpretation {
    pub mean_change_p2: f64,
    pub literature_reference_ms: f64,
    /// Faster after training, the direction reported in the literature
    pub consistent_with_literature: bool,
    pub subjects: usize,
}

impl Interpretation {
    pub fn lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        if self.consistent_with_literature {
            lines.push(format!(
                "Group mean reaction time improved by {:.1} ms after training phase 2.",
                self.mean_change_p2
            ));
            lines.push(format!(
                "The direction matches the {:.0} ms improvement reported in prior work.",
                self.literature_reference_ms
            ));
        } else {
            lines.push(format!(
                "No group mean improvement after training phase 2 ({:+.1} ms).",
                self.mean_change_p2
            ));
        }
        lines.push(format!(
            "With n = {} subjects statistical significance is hard to claim; interpret effect sizes first.",
            self.subjects
        ));
        lines
    }
}

/// Aggregate result over all analysed subjects
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupResult {
    pub subjects: usize,

    pub baseline_mean: GroupStat,
    pub phase1_mean: GroupStat,
    pub phase2_mean: GroupStat,
    pub change_p1: GroupStat,
    pub change_p2: GroupStat,

    /// Average per-subject effect sizes
    pub mean_d_p1: f64,
    pub mean_d_p2: f64,
    pub mean_d_p1_p2: f64,

    /// Paired t-tests of per-subject baseline means against post means
    pub paired_t_p1: TestOutcome<PairedTTest>,
    pub paired_t_p2: TestOutcome<PairedTTest>,

    /// One-sided signed-rank tests of the change scores against zero
    pub signed_rank_p1: TestOutcome<SignedRankOutcome>,
    pub signed_rank_p2: TestOutcome<SignedRankOutcome>,

    pub pooled: PooledAnalysis,
    pub interpretation: Interpretation,
}

fn paired(subjects: usize, first: &[f64], second: &[f64]) -> TestOutcome<PairedTTest> {
    if subjects < 2 {
        return TestOutcome::NotComputable {
            reason: format!("paired t-test needs at least 2 subjects, have {subjects}"),
        };
    }
    TestOutcome::from_result(paired_t_test(first, second))
}

fn signed_rank(changes: &[f64], label: &str, alpha: f64) -> TestOutcome<SignedRankOutcome> {
    let outcome = TestOutcome::from_result(wilcoxon_signed_rank(changes, Alternative::Greater).map(|test| {
        SignedRankOutcome {
            underpowered: test.min_achievable_p >= alpha,
            test,
        }
    }));

    match &outcome {
        TestOutcome::Computed(o) if o.underpowered => tracing::warn!(
            "Signed-rank test {} is underpowered: n={} gives minimum p={:.4} >= {}",
            label,
            o.test.n,
            o.test.min_achievable_p,
            alpha
        ),
        TestOutcome::NotComputable { reason } => {
            tracing::warn!("Signed-rank test {} not computable: {}", label, reason)
        }
        _ => {}
    }
    outcome
}

fn pooled_comparison(
    pools: &[(Phase, &[f64])],
    first: usize,
    second: usize,
    alternative: Alternative,
    comparisons: Option<usize>,
) -> PooledComparison {
    let (first_phase, a) = pools[first];
    let (second_phase, b) = pools[second];
    let context = format!("pooled {first_phase} vs {second_phase}");

    let test = TestOutcome::from_result(mann_whitney_u(a, b, alternative).map_err(|e| e.in_context(&context)));
    let effect_size = TestOutcome::from_result(effect_size_population(a, b).map_err(|e| e.in_context(&context)));

    for (what, outcome) in [("rank-sum test", test.reason()), ("effect size", effect_size.reason())] {
        if let Some(reason) = outcome {
            tracing::warn!("{} {} not computable: {}", context, what, reason);
        }
    }

    PooledComparison {
        first: first_phase,
        second: second_phase,
        corrected_pvalue: match (comparisons, test.computed()) {
            (Some(m), Some(t)) => Some(bonferroni(t.pvalue, m)),
            _ => None,
        },
        test,
        effect_size,
    }
}

/// Pool trials per phase and run the omnibus test with its follow-up
pub fn analyze_pooled(subjects: &[SubjectResult], config: &AnalysisConfig) -> Result<PooledAnalysis> {
    let concat = |select: fn(&SubjectResult) -> &[f64]| -> Vec<f64> {
        subjects.iter().flat_map(|s| select(s).iter().copied()).collect()
    };
    let all_baseline = concat(|s| s.baseline_series.values.as_slice());
    let all_p1 = concat(|s| s.phase1_series.values.as_slice());
    let all_p2 = concat(|s| s.phase2_series.values.as_slice());

    let omnibus = kruskal_wallis(&[&all_baseline, &all_p1, &all_p2]).map_err(|e| e.in_context("pooled omnibus"))?;

    let pools = [
        (Phase::Baseline, all_baseline.as_slice()),
        (Phase::MeasurePhase1, all_p1.as_slice()),
        (Phase::MeasurePhase2, all_p2.as_slice()),
    ];

    let post_hoc = if omnibus.pvalue < config.significance_level {
        tracing::info!(
            "Pooled omnibus significant (H={:.3}, p={:.4}); running corrected pairwise tests",
            omnibus.h,
            omnibus.pvalue
        );
        let m = Some(config.bonferroni_comparisons);
        PostHoc::Corrected(vec![
            pooled_comparison(&pools, 0, 1, Alternative::TwoSided, m),
            pooled_comparison(&pools, 0, 2, Alternative::TwoSided, m),
            pooled_comparison(&pools, 1, 2, Alternative::TwoSided, m),
        ])
    } else {
        tracing::info!(
            "Pooled omnibus not significant (H={:.3}, p={:.4}); reporting one-sided baseline comparisons",
            omnibus.h,
            omnibus.pvalue
        );
        PostHoc::Supplementary(vec![
            pooled_comparison(&pools, 0, 1, Alternative::Greater, None),
            pooled_comparison(&pools, 0, 2, Alternative::Greater, None),
        ])
    };

    Ok(PooledAnalysis {
        baseline_n: all_baseline.len(),
        phase1_n: all_p1.len(),
        phase2_n: all_p2.len(),
        omnibus,
        post_hoc,
    })
}

/// Aggregate per-subject results
///
/// Fails with `DataInsufficient` when there are no subjects. Tests that
/// cannot be computed for the available subjects are reported as
/// [`TestOutcome::NotComputable`] rather than failing the run.
pub fn analyze_group(subjects: &[SubjectResult], config: &AnalysisConfig) -> Result<GroupResult> {
    if subjects.is_empty() {
        return Err(AnalysisError::DataInsufficient {
            context: "group analysis (subjects)".to_string(),
            required: 1,
            actual: 0,
        });
    }

    let column = |f: fn(&SubjectResult) -> f64| -> Vec<f64> { subjects.iter().map(f).collect() };
    let bl_means = column(|s| s.baseline.mean);
    let p1_means = column(|s| s.phase1.mean);
    let p2_means = column(|s| s.phase2.mean);
    let changes_p1 = column(|s| s.change_p1);
    let changes_p2 = column(|s| s.change_p2);

    let n = subjects.len();
    let alpha = config.significance_level;
    let change_p2 = GroupStat::of(&changes_p2, "group change p2")?;

    let result = GroupResult {
        subjects: n,
        baseline_mean: GroupStat::of(&bl_means, "group baseline means")?,
        phase1_mean: GroupStat::of(&p1_means, "group phase 1 means")?,
        phase2_mean: GroupStat::of(&p2_means, "group phase 2 means")?,
        change_p1: GroupStat::of(&changes_p1, "group change p1")?,
        change_p2,
        mean_d_p1: mean(&column(|s| s.baseline_vs_p1.effect_size), "group d p1")?,
        mean_d_p2: mean(&column(|s| s.baseline_vs_p2.effect_size), "group d p2")?,
        mean_d_p1_p2: mean(&column(|s| s.p1_vs_p2.effect_size), "group d p1 vs p2")?,
        paired_t_p1: paired(n, &bl_means, &p1_means),
        paired_t_p2: paired(n, &bl_means, &p2_means),
        signed_rank_p1: signed_rank(&changes_p1, "baseline vs phase 1", alpha),
        signed_rank_p2: signed_rank(&changes_p2, "baseline vs phase 2", alpha),
        pooled: analyze_pooled(subjects, config)?,
        interpretation: Interpretation {
            mean_change_p2: change_p2.mean,
            literature_reference_ms: config.literature_reference_ms,
            consistent_with_literature: change_p2.mean > 0.0,
            subjects: n,
        },
    };

    Ok(result)
}
