use criterion::{criterion_group, criterion_main, Criterion};
use hcp_core::rng::RngHandle;
use hcp_graph::{canonical_hash, planted_partition};

fn bench_build(c: &mut Criterion) {
    c.bench_function("planted_partition_200", |b| {
        b.iter(|| {
            let mut rng = RngHandle::from_seed(42);
            let graph = planted_partition(4, 50, 0.3, 0.02, &mut rng).unwrap();
            canonical_hash(&graph)
        })
    });
}

criterion_group!(benches, bench_build);
criterion_main!(benches);
