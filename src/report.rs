//! Human-readable console report

use crate::group::{GroupResult, GroupStat, PooledComparison, PostHoc, SignedRankOutcome, TestOutcome};
use crate::pipeline::AnalysisOutcome;
use crate::stats::{Descriptive, PairedTTest};
use crate::subject::{PhaseComparison, SubjectResult};

const RULE: &str = "============================================================";

fn section(report: &mut String, title: &str) {
    report.push_str(&format!("\n{}\n  {}\n{}\n", RULE, title, RULE));
}

fn sd_text(sd: Option<f64>) -> String {
    match sd {
        Some(sd) => format!("{:.2}", sd),
        None => "n/a".to_string(),
    }
}

fn descriptive_row(label: &str, d: &Descriptive) -> String {
    format!(
        "  {:<16} {:>10.2} {:>10.2} {:>10.2} {:>5}\n",
        label, d.mean, d.sd, d.median, d.n
    )
}

fn comparison_row(label: &str, c: &PhaseComparison) -> String {
    format!(
        "  {:<22} U={:.1}, p={:.4}, d={:.3}\n",
        label, c.test.u, c.test.pvalue, c.effect_size
    )
}

/// Report section for one subject
pub fn subject_section(r: &SubjectResult) -> String {
    let mut report = String::new();
    section(&mut report, &format!("Subject: {}", r.subject));

    report.push_str("\n  [Descriptive statistics]\n");
    report.push_str(&format!(
        "  {:<16} {:>10} {:>10} {:>10} {:>5}\n",
        "Phase", "Mean(ms)", "SD", "Median", "n"
    ));
    report.push_str(&format!("  {}\n", "-".repeat(55)));
    report.push_str(&descriptive_row("Baseline", &r.baseline));
    report.push_str(&descriptive_row("After phase 1", &r.phase1));
    report.push_str(&descriptive_row("After phase 2", &r.phase2));

    let removed: Vec<String> = [&r.baseline_series, &r.phase1_series, &r.phase2_series]
        .iter()
        .filter(|s| s.removed() > 0)
        .map(|s| format!("{}: {} -> {}", s.label, s.original_n, s.len()))
        .collect();
    if !removed.is_empty() {
        report.push_str(&format!("  Outliers removed ({})\n", removed.join(", ")));
    }

    report.push_str("\n  [Change from baseline]\n");
    report.push_str(&format!("  Baseline -> after phase 1: {:+.2} ms\n", r.change_p1));
    report.push_str(&format!("  Baseline -> after phase 2: {:+.2} ms\n", r.change_p2));

    report.push_str("\n  [Mann-Whitney U (one-sided: earlier phase slower)]\n");
    report.push_str(&comparison_row("BL vs after phase 1:", &r.baseline_vs_p1));
    report.push_str(&comparison_row("BL vs after phase 2:", &r.baseline_vs_p2));
    report.push_str(&comparison_row("Phase 1 vs phase 2:", &r.p1_vs_p2));

    if !r.warnings.is_empty() {
        report.push_str("\n  [Classification warnings]\n");
        for w in &r.warnings {
            report.push_str(&format!("  WARNING {} ({}): {}\n", w.phase_label(), w.file, w.message));
        }
    }

    report
}

fn group_stat_row(label: &str, stat: &GroupStat, signed: bool) -> String {
    if signed {
        format!("  {}: {:+.2} ± {} ms\n", label, stat.mean, sd_text(stat.sd))
    } else {
        format!("  {}: {:.2} ± {} ms\n", label, stat.mean, sd_text(stat.sd))
    }
}

fn paired_row(label: &str, outcome: &TestOutcome<PairedTTest>) -> String {
    match outcome {
        TestOutcome::Computed(t) => format!("  {}: t={:.3}, p={:.4}\n", label, t.statistic, t.pvalue),
        TestOutcome::NotComputable { reason } => format!("  {}: not computable ({})\n", label, reason),
    }
}

fn signed_rank_row(label: &str, outcome: &TestOutcome<SignedRankOutcome>) -> String {
    match outcome {
        TestOutcome::Computed(o) => {
            let mut row = format!("  {}: W={}, p={:.4}", label, o.test.statistic, o.test.pvalue);
            if o.underpowered {
                row.push_str(&format!(
                    " (underpowered: minimum achievable p={:.4})",
                    o.test.min_achievable_p
                ));
            }
            row.push('\n');
            row
        }
        TestOutcome::NotComputable { reason } => format!("  {}: not computable ({})\n", label, reason),
    }
}

fn pooled_row(c: &PooledComparison, p_label: &str) -> String {
    let test = match c.test.computed() {
        Some(t) => format!("U={:.1}, {}={:.4}", t.u, p_label, c.corrected_pvalue.unwrap_or(t.pvalue)),
        None => format!("U=n/a ({})", c.test.reason().unwrap_or_default()),
    };
    let d = match c.effect_size.computed() {
        Some(d) => format!("d={:.3}", d),
        None => "d=n/a".to_string(),
    };
    format!("    {} vs {}: {}, {}\n", c.first, c.second, test, d)
}

/// Report section for the group analysis
pub fn group_section(g: &GroupResult) -> String {
    let mut report = String::new();
    section(&mut report, &format!("Group analysis (n={})", g.subjects));

    report.push_str("\n  [Group means]\n");
    report.push_str(&group_stat_row("Baseline mean", &g.baseline_mean, false));
    report.push_str(&group_stat_row("After phase 1 mean", &g.phase1_mean, false));
    report.push_str(&group_stat_row("After phase 2 mean", &g.phase2_mean, false));

    report.push_str("\n  [Group change]\n");
    report.push_str(&group_stat_row("BL -> after phase 1", &g.change_p1, true));
    report.push_str(&group_stat_row("BL -> after phase 2", &g.change_p2, true));

    report.push_str("\n  [Group effect size]\n");
    report.push_str(&format!("  BL vs after phase 1: d={:.3}\n", g.mean_d_p1));
    report.push_str(&format!("  BL vs after phase 2: d={:.3}\n", g.mean_d_p2));
    report.push_str(&format!("  Phase 1 vs phase 2:  d={:.3}\n", g.mean_d_p1_p2));

    report.push_str(&format!(
        "\n  [Paired t-test (informational, underpowered at n={})]\n",
        g.subjects
    ));
    report.push_str(&paired_row("BL vs after phase 1", &g.paired_t_p1));
    report.push_str(&paired_row("BL vs after phase 2", &g.paired_t_p2));

    report.push_str("\n  [Wilcoxon signed-rank on change scores (one-sided)]\n");
    report.push_str(&signed_rank_row("BL vs after phase 1", &g.signed_rank_p1));
    report.push_str(&signed_rank_row("BL vs after phase 2", &g.signed_rank_p2));

    let pooled = &g.pooled;
    report.push_str("\n  [Pooled trials: Kruskal-Wallis]\n");
    report.push_str(&format!(
        "  n = {} / {} / {} (baseline / phase 1 / phase 2)\n",
        pooled.baseline_n, pooled.phase1_n, pooled.phase2_n
    ));
    report.push_str(&format!(
        "  H={:.3}, p={:.4}\n",
        pooled.omnibus.h, pooled.omnibus.pvalue
    ));

    match &pooled.post_hoc {
        PostHoc::Corrected(pairs) => {
            report.push_str("  -> Significant. Post-hoc Mann-Whitney U (two-sided, Bonferroni):\n");
            for c in pairs {
                report.push_str(&pooled_row(c, "p(corrected)"));
            }
        }
        PostHoc::Supplementary(pairs) => {
            report.push_str(&format!(
                "  -> Not significant (p={:.4})\n",
                pooled.omnibus.pvalue
            ));
            report.push_str("  [Supplementary: pooled Mann-Whitney U (one-sided, uncorrected)]\n");
            for c in pairs {
                report.push_str(&pooled_row(c, "p"));
            }
        }
    }

    report
}

/// Full console report for one analysis run
pub fn render_report(outcome: &AnalysisOutcome) -> String {
    let mut report = String::new();
    section(&mut report, "Reaction-time analysis of EMS training");
    report.push_str(&format!("\nSubjects analysed: {}\n", outcome.subjects.len()));

    for subject in &outcome.subjects {
        report.push_str(&subject_section(subject));
    }

    if !outcome.excluded.is_empty() {
        report.push_str(&format!("\nExcluded subjects ({}):\n", outcome.excluded.len()));
        for e in &outcome.excluded {
            report.push_str(&format!("  - {}: {}\n", e.subject, e.reason));
        }
    }

    report.push_str(&group_section(&outcome.group));

    report.push_str("\n[Interpretation]\n");
    for line in outcome.group.interpretation.lines() {
        report.push_str(&format!("  {}\n", line));
    }

    report
}
