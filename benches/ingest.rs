//! Ingestion hot-path benchmarks.
//!
//! Benchmarks the two O-sensitive paths: window insertion (per-frame) and
//! statistics computation (per-UI-refresh) at realistic window sizes.
//!
//! Run with: cargo bench --bench ingest
//! Results saved to: target/criterion/

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};

use pulse_relay::{Sample, SampleAggregator, compute_stats};

// ============================================================================
// Benchmark Parameters
// ============================================================================

const WINDOW_CAPACITIES: &[usize] = &[1_000, 10_000];
const SNAPSHOT_SIZES: &[usize] = &[100, 1_000, 10_000];

// ============================================================================
// Benchmark: Window Insertion
// ============================================================================

fn bench_window_add(c: &mut Criterion) {
    let mut group = c.benchmark_group("window_add");

    for &capacity in WINDOW_CAPACITIES {
        group.bench_with_input(
            BenchmarkId::new("add", capacity),
            &capacity,
            |b, &capacity| {
                let aggregator = SampleAggregator::new(capacity);
                let mut i = 0u32;
                b.iter(|| {
                    i = i.wrapping_add(1);
                    aggregator.add(Sample::at(60 + (i % 60), f64::from(i)));
                });
            },
        );
    }

    group.finish();
}

// ============================================================================
// Benchmark: Statistics Computation
// ============================================================================

fn bench_compute_stats(c: &mut Criterion) {
    let mut group = c.benchmark_group("compute_stats");

    for &size in SNAPSHOT_SIZES {
        let samples: Vec<Sample> = (0..size)
            .map(|i| Sample::at(55 + (i % 90) as u32, i as f64))
            .collect();

        group.bench_with_input(BenchmarkId::new("stats", size), &samples, |b, samples| {
            b.iter(|| black_box(compute_stats(black_box(samples))));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_window_add, bench_compute_stats);
criterion_main!(benches);
