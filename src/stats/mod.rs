// Statistical kernels for reaction-time analysis
//
// Everything here is computed in f64, with tail probabilities from
// distributions.rs. The tests and their reference distributions:
//
// - Mann-Whitney U: per-subject and pooled pairwise comparisons
// - Wilcoxon signed-rank: per-subject change scores against zero
// - Kruskal-Wallis H: pooled omnibus test across the three phases
// - Paired t-test: informational group comparison
//
// Effect sizes use the equal-weight pooled SD (see effect_size.rs).

mod descriptive;
pub mod distributions;
mod effect_size;
mod paired;

pub use descriptive::{describe, mean, quartiles, sample_sd, Descriptive, Quartiles};
pub use effect_size::{effect_size, effect_size_from, effect_size_population};
pub use paired::{paired_t_test, PairedTTest};
pub use rank_tests::{
    kruskal_wallis, mann_whitney_u, rank_average, wilcoxon_signed_rank, Alternative,
    KruskalWallisTest, PValueMethod, RankSumTest, SignedRankTest, MWU_EXACT_MAX_N,
    WILCOXON_EXACT_MAX_N,
};

/// Bonferroni adjustment of one p-value for `comparisons` tests
///
/// # Example
/// ```
/// use emsrt::stats::bonferroni;
///
/// assert_eq!(bonferroni(0.01, 3), 0.03);
/// assert_eq!(bonferroni(0.5, 3), 1.0);
/// ```
pub fn bonferroni(pvalue: f64, comparisons: usize) -> f64 {
    (pvalue * comparisons as f64).min(1.0)
}
