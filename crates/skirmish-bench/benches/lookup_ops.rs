//! Criterion micro-benchmarks for feature lookup and unit lifecycle.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use skirmish_bench::{unit_chain, Payload};

fn bench_feature_lookup(c: &mut Criterion) {
    let mut group = c.benchmark_group("feature_lookup");
    for depth in [1usize, 4, 16] {
        let chain = unit_chain(depth).unwrap();
        let leaf = chain.last().cloned().unwrap();
        leaf.init().unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(depth), &leaf, |b, leaf| {
            b.iter(|| black_box(leaf.feature::<Payload>()));
        });
    }
    group.finish();
}

fn bench_lookup_miss(c: &mut Criterion) {
    struct Missing;
    impl skirmish_unit::Feature for Missing {}

    let chain = unit_chain(16).unwrap();
    let leaf = chain.last().cloned().unwrap();
    leaf.init().unwrap();
    c.bench_function("feature_lookup_miss_depth_16", |b| {
        b.iter(|| black_box(leaf.feature::<Missing>()));
    });
}

fn bench_chain_lifecycle(c: &mut Criterion) {
    c.bench_function("chain_8_init_post_init_clear", |b| {
        b.iter(|| {
            let chain = unit_chain(8).unwrap();
            let leaf = chain.last().unwrap();
            leaf.init().unwrap();
            leaf.post_init().unwrap();
            leaf.clear().unwrap();
            black_box(chain.len())
        });
    });
}

criterion_group!(
    benches,
    bench_feature_lookup,
    bench_lookup_miss,
    bench_chain_lifecycle
);
criterion_main!(benches);
