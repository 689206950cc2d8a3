// Performance benchmarks for distance metrics, top-k retrieval and the sharded export
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use metallo_core::retrieval::nearest_neighbors;
use metallo_core::{export, Corpus, ExportOptions, MemoryOutput, Metric, Record, Vector};
use rand::prelude::*;
use std::num::NonZeroUsize;

fn generate_topic_vector(rng: &mut StdRng, dim: usize) -> Vector {
    let raw: Vec<f64> = (0..dim).map(|_| rng.random_range(0.001..1.0)).collect();
    let total: f64 = raw.iter().sum();
    Vector::new(raw.into_iter().map(|w| w / total).collect())
}

fn generate_corpus(n: usize, dim: usize) -> Corpus {
    let mut rng = StdRng::seed_from_u64(42);
    let records = (0..n)
        .map(|i| {
            Record::new(
                format!("urn:doc:{}", i),
                format!("passage number {}", i),
                generate_topic_vector(&mut rng, dim),
            )
        })
        .collect();
    Corpus::from_records(records).unwrap()
}

fn benchmark_metrics(c: &mut Criterion) {
    let mut group = c.benchmark_group("metric");
    let mut rng = StdRng::seed_from_u64(7);

    for dim in [20, 100, 500].iter() {
        let x = generate_topic_vector(&mut rng, *dim);
        let y = generate_topic_vector(&mut rng, *dim);

        group.bench_with_input(BenchmarkId::new("manhattan", dim), dim, |b, _| {
            b.iter(|| Metric::Manhattan.distance(black_box(x.as_slice()), black_box(y.as_slice())));
        });
        group.bench_with_input(BenchmarkId::new("jsd", dim), dim, |b, _| {
            b.iter(|| Metric::Jsd.distance(black_box(x.as_slice()), black_box(y.as_slice())));
        });
    }

    group.finish();
}

fn benchmark_nearest(c: &mut Criterion) {
    let mut group = c.benchmark_group("nearest");
    let corpus = generate_corpus(10_000, 50);

    for count in [5, 20, 100].iter() {
        group.bench_with_input(BenchmarkId::new("manhattan", count), count, |b, &count| {
            b.iter(|| {
                nearest_neighbors(&corpus, black_box("urn:doc:1234"), count, &Metric::Manhattan)
                    .unwrap()
            });
        });
    }

    group.finish();
}

fn benchmark_export(c: &mut Criterion) {
    let mut group = c.benchmark_group("export");
    group.sample_size(10);

    for size in [200, 1000].iter() {
        let corpus = generate_corpus(*size, 50);
        for workers in [1, 4].iter() {
            let options = ExportOptions {
                metric: Metric::Jsd,
                threshold: 0.2,
                shard_capacity: NonZeroUsize::new(*size).unwrap(),
                workers: *workers,
            };
            group.bench_with_input(
                BenchmarkId::new(format!("workers_{}", workers), size),
                size,
                |b, _| {
                    b.iter(|| {
                        let output = MemoryOutput::new();
                        export(&corpus, &output, &options).unwrap()
                    });
                },
            );
        }
    }

    group.finish();
}

criterion_group!(benches, benchmark_metrics, benchmark_nearest, benchmark_export);
criterion_main!(benches);
