use std::hint::black_box;

use criterion::{BatchSize, Criterion, Throughput, criterion_group, criterion_main};
use freqcache::cache::byte_budget::ByteBudgetCache;
use freqcache::cache::frequency::FrequencyCache;
use freqcache::config::ByteBudgetConfig;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const OPS: u64 = 4096;

/// Skewed key stream: 80% of accesses hit the first 20% of the universe.
fn hotset_keys(universe: u64, seed: u64) -> Vec<u64> {
    let mut rng = StdRng::seed_from_u64(seed);
    let hot = (universe / 5).max(1);
    (0..OPS)
        .map(|_| {
            if rng.random_bool(0.8) {
                rng.random_range(0..hot)
            } else {
                rng.random_range(0..universe)
            }
        })
        .collect()
}

fn bench_frequency_cache(c: &mut Criterion) {
    let mut group = c.benchmark_group("frequency_cache");
    group.throughput(Throughput::Elements(OPS));
    let keys = hotset_keys(4096, 42);

    group.bench_function("get_or_put_hotset", |b| {
        b.iter_batched(
            || FrequencyCache::new(1024),
            |mut cache| {
                for key in &keys {
                    if cache.get(black_box(key)).is_none() {
                        cache.put(*key, *key);
                    }
                }
                cache
            },
            BatchSize::SmallInput,
        )
    });

    group.bench_function("put_evicting", |b| {
        b.iter_batched(
            || {
                let mut cache = FrequencyCache::new(1024);
                for i in 0..1024u64 {
                    cache.put(i, i);
                }
                cache
            },
            |mut cache| {
                for i in 0..OPS {
                    cache.put(black_box(i + 10_000), i);
                }
                cache
            },
            BatchSize::SmallInput,
        )
    });
    group.finish();
}

fn bench_byte_budget_cache(c: &mut Criterion) {
    let mut group = c.benchmark_group("byte_budget_cache");
    group.throughput(Throughput::Elements(OPS));
    let keys = hotset_keys(4096, 7);

    group.bench_function("get_or_load_hotset", |b| {
        b.iter_batched(
            || ByteBudgetCache::<u64, Vec<u8>>::new(ByteBudgetConfig::new(64 * 1024)),
            |cache| {
                for key in &keys {
                    let len = 16 + (*key as usize % 112);
                    let _ = black_box(cache.get_or_load(key, |_| Ok(vec![0u8; len])));
                }
                cache
            },
            BatchSize::SmallInput,
        )
    });
    group.finish();
}

criterion_group!(benches, bench_frequency_cache, bench_byte_budget_cache);
criterion_main!(benches);
