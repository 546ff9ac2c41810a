//! Dataset generation and algorithm benchmarks
//!
//! Baseline cost of the inputs and the built-in implementations at the
//! default experiment sizes, without the profiler in the loop.
//!
//! Run with: cargo bench --bench dataset_benchmarks

use carbon_optimizer::algorithms::{Algorithm, AlgorithmCategory, AlgorithmHandle};
use carbon_optimizer::config::DEFAULT_DATASET_SIZES;
use carbon_optimizer::dataset::generate;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

const SEED: u64 = 42;

fn bench_generate(c: &mut Criterion) {
    let mut group = c.benchmark_group("generate");

    for category in AlgorithmCategory::ALL {
        for size in DEFAULT_DATASET_SIZES {
            group.bench_with_input(BenchmarkId::new(category.as_str(), size), &size, |b, &size| {
                b.iter(|| generate(category, black_box(size), SEED));
            });
        }
    }

    group.finish();
}

fn bench_algorithms(c: &mut Criterion) {
    let mut group = c.benchmark_group("algorithms");
    group.sample_size(10);

    // Bubble sort at 10k dominates the whole suite; 5k is enough for a baseline
    let sizes = [1_000, 5_000];

    for algorithm in Algorithm::ALL {
        let handle = AlgorithmHandle::from(algorithm);
        for size in sizes {
            let Ok(input) = generate(algorithm.category(), size, SEED) else {
                continue;
            };
            group.bench_with_input(BenchmarkId::new(algorithm.name(), size), &input, |b, input| {
                b.iter(|| {
                    let mut copy = input.clone();
                    handle.invoke(black_box(&mut copy))
                });
            });
        }
    }

    group.finish();
}

criterion_group!(benches, bench_generate, bench_algorithms);
criterion_main!(benches);
