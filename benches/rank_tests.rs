//! Rank test benchmark
//!
//! Measures the hypothesis tests on pooled-trial sizes: a subject contributes
//! about 12 trials per phase, so pools range from tens to a few hundred.
//!
//! # Run Instructions
//!
//! ```bash
//! cargo bench --bench rank_tests
//! ```

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use emsrt::outlier::{remove_outliers, OutlierBounds};
use emsrt::stats::{kruskal_wallis, mann_whitney_u, wilcoxon_signed_rank, Alternative};

/// Deterministic reaction times in [200, 600) with ties
fn reaction_times(n: usize, seed: usize) -> Vec<f64> {
    (0..n)
        .map(|i| 200.0 + ((i * 7919 + seed * 104_729) % 400) as f64)
        .collect()
}

fn bench_mann_whitney(c: &mut Criterion) {
    let mut group = c.benchmark_group("mann_whitney_u");

    // 8 per side takes the exact path, larger pools the normal approximation
    for n in [8, 12, 36, 120, 360] {
        let x = reaction_times(n, 1);
        let y = reaction_times(n, 2);
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter(|| mann_whitney_u(black_box(&x), black_box(&y), Alternative::Greater))
        });
    }

    group.finish();
}

fn bench_wilcoxon(c: &mut Criterion) {
    let mut group = c.benchmark_group("wilcoxon_signed_rank");

    for n in [5, 20, 50, 200] {
        // distinct magnitudes keep n <= 50 on the exact path
        let diffs: Vec<f64> = (1..=n)
            .map(|i| if i % 3 == 0 { -(i as f64) } else { i as f64 })
            .collect();
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter(|| wilcoxon_signed_rank(black_box(&diffs), Alternative::Greater))
        });
    }

    group.finish();
}

fn bench_kruskal_wallis(c: &mut Criterion) {
    let mut group = c.benchmark_group("kruskal_wallis");

    for n in [12, 120, 360] {
        let a = reaction_times(n, 1);
        let b2 = reaction_times(n, 2);
        let c3 = reaction_times(n, 3);
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter(|| kruskal_wallis(black_box(&[a.as_slice(), b2.as_slice(), c3.as_slice()])))
        });
    }

    group.finish();
}

fn bench_outlier_removal(c: &mut Criterion) {
    let raw = reaction_times(360, 4);
    let bounds = OutlierBounds::default();

    c.bench_function("remove_outliers_360", |b| {
        b.iter(|| remove_outliers(black_box(&raw), "bench", &bounds))
    });
}

criterion_group!(
    benches,
    bench_mann_whitney,
    bench_wilcoxon,
    bench_kruskal_wallis,
    bench_outlier_removal
);
criterion_main!(benches);
