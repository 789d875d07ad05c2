use aseq::buffering::buffer_by_count;
use aseq::cache::cache;
use aseq::constructors::from_iter;
use aseq::fan_in::{merge, zip};
use aseq::parallel::map_async_parallel;
use aseq::sequential::{filter, fold, map, to_vec};
use aseq::{ParallelConfig, TokioWorkerPool, WorkerPool};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Runtime;

fn bench_sequential(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let mut group = c.benchmark_group("sequential");

    for size in [1_000u64, 10_000, 100_000] {
        let data: Vec<u64> = (0..size).collect();
        group.bench_with_input(BenchmarkId::new("map_filter_fold", size), &data, |b, data| {
            b.to_async(&rt).iter(|| async {
                let seq = filter(map(from_iter(data.clone()), |x| x * 2), |x| x % 3 == 0);
                black_box(fold(&seq, 0u64, |acc, x| acc + x).await)
            });
        });
    }

    group.finish();
}

fn bench_fan_in(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let mut group = c.benchmark_group("fan_in");
    let left: Vec<u32> = (0..10_000).collect();
    let right: Vec<u32> = (10_000..20_000).collect();

    group.bench_function("merge", |b| {
        b.to_async(&rt).iter(|| async {
            let merged = merge(from_iter(left.clone()), from_iter(right.clone()));
            black_box(to_vec(&merged).await)
        });
    });

    group.bench_function("zip", |b| {
        b.to_async(&rt).iter(|| async {
            let zipped = zip(from_iter(left.clone()), from_iter(right.clone()));
            black_box(to_vec(&zipped).await)
        });
    });

    group.finish();
}

fn bench_buffer_and_cache(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let mut group = c.benchmark_group("buffer_and_cache");
    let data: Vec<u32> = (0..50_000).collect();

    for size in [16usize, 256] {
        group.bench_with_input(BenchmarkId::new("buffer_by_count", size), &size, |b, size| {
            b.to_async(&rt).iter(|| async {
                black_box(to_vec(&buffer_by_count(from_iter(data.clone()), *size)).await)
            });
        });
    }

    group.bench_function("cache_four_readers", |b| {
        b.to_async(&rt).iter(|| async {
            let cached = cache(from_iter(data.clone()));
            let (a, b2, c2, d) = tokio::join!(
                to_vec(&cached),
                to_vec(&cached),
                to_vec(&cached),
                to_vec(&cached)
            );
            black_box((a, b2, c2, d))
        });
    });

    group.finish();
}

fn bench_parallel(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let mut group = c.benchmark_group("map_async_parallel");
    group.measurement_time(Duration::from_secs(10));
    let data: Vec<u64> = (0..500).collect();

    for limit in [1usize, 4, 16] {
        group.bench_with_input(BenchmarkId::new("io_bound", limit), &limit, |b, limit| {
            b.to_async(&rt).iter(|| async {
                let pool: Arc<dyn WorkerPool> = Arc::new(TokioWorkerPool::new(16));
                let results = map_async_parallel(
                    from_iter(data.clone()),
                    |x| async move {
                        tokio::time::sleep(Duration::from_micros(50)).await;
                        x + 1
                    },
                    pool,
                    ParallelConfig::new().max_in_flight(*limit),
                );
                black_box(to_vec(&results).await)
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_sequential,
    bench_fan_in,
    bench_buffer_and_cache,
    bench_parallel
);
criterion_main!(benches);
