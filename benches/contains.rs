use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use cuckoo_filters::{CuckooFilter, HashStrategy};
use rand::{thread_rng, Rng};

fn random_items(count: usize) -> Vec<Vec<u8>> {
    let mut rng = thread_rng();
    (0..count)
        .map(|_| rng.gen::<u64>().to_le_bytes().to_vec())
        .collect()
}

fn bench(c: &mut Criterion) {
    let mut group = c.benchmark_group("lookup");
    for strategy in [
        HashStrategy::Fnv1a,
        HashStrategy::Crc32c,
        HashStrategy::XxHash64,
    ] {
        let mut filter = CuckooFilter::builder()
            .hash_strategy(strategy)
            .build(10_000)
            .unwrap();
        let items = random_items(1000);
        for item in &items {
            filter.insert(item);
        }

        group.bench_with_input(
            BenchmarkId::new("scalar", strategy),
            &strategy,
            |b, _| {
                b.iter(|| {
                    items.iter().filter(|item| filter.lookup(item)).count()
                })
            },
        );
        group.bench_with_input(
            BenchmarkId::new("batch", strategy),
            &strategy,
            |b, _| b.iter(|| filter.lookup_batch(&items)),
        );
    }
    group.finish();
}

criterion_group!(benches, bench);
criterion_main!(benches);
