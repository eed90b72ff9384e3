use criterion::{criterion_group, criterion_main, Criterion, BenchmarkId, Throughput};
use limited_scheduler::{
    pool::ThreadPool,
    scheduler::{Config, Scheduler},
    work::WorkItem,
};
use std::{
    hint::black_box,
    sync::Arc,
};

fn create_runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(num_cpus::get())
        .enable_all()
        .build()
        .unwrap()
}

// Benchmark 1: submit + drain на blocking-пуле tokio
fn bench_submit_drain(c: &mut Criterion) {
    let mut group = c.benchmark_group("submit_drain");
    let rt = create_runtime();

    for max in [1, 4, num_cpus::get()] {
        group.throughput(Throughput::Elements(10_000));

        group.bench_with_input(
            BenchmarkId::new("tokio_pool", max),
            &max,
            |b, &max| {
                let scheduler = rt.block_on(async {
                    Scheduler::with_tokio(Config::default().with_max_concurrency(max)).unwrap()
                });

                b.to_async(&rt).iter(|| {
                    let scheduler = &scheduler;
                    async move {
                        for i in 0..10_000 {
                            scheduler.submit(WorkItem::new(move |_| {
                                black_box(i);
                            }));
                        }
                        scheduler.wait_idle().await;
                    }
                });
            },
        );
    }

    group.finish();
}

// Benchmark 2: то же на собственном пуле потоков
fn bench_thread_pool(c: &mut Criterion) {
    let mut group = c.benchmark_group("thread_pool");
    let pool = Arc::new(ThreadPool::new(num_cpus::get()).unwrap());

    for max in [1, 4] {
        group.throughput(Throughput::Elements(10_000));

        group.bench_with_input(
            BenchmarkId::new("submit_drain", max),
            &max,
            |b, &max| {
                let scheduler = Scheduler::new(Config::default().with_max_concurrency(max), pool.clone());

                b.iter(|| {
                    for i in 0..10_000 {
                        scheduler.submit(WorkItem::new(move |_| {
                            black_box(i);
                        }));
                    }
                    futures::executor::block_on(scheduler.wait_idle());
                });
            },
        );
    }

    group.finish();
}

// Benchmark 3: spawn с handles
fn bench_spawn_handles(c: &mut Criterion) {
    let mut group = c.benchmark_group("spawn_handles");
    let rt = create_runtime();

    for size in [100, 1_000] {
        group.throughput(Throughput::Elements(size as u64));

        group.bench_with_input(
            BenchmarkId::new("join_handles", size),
            &size,
            |b, &size| {
                let scheduler = rt.block_on(async {
                    Scheduler::with_tokio(Config::io_bound()).unwrap()
                });

                b.to_async(&rt).iter(|| {
                    let scheduler = &scheduler;
                    async move {
                        let handles: Vec<_> = (0..size)
                            .map(|i| scheduler.spawn(move |_| black_box(i)))
                            .collect();
                        black_box(scheduler.join_handles(handles).await);
                    }
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_submit_drain, bench_thread_pool, bench_spawn_handles);
criterion_main!(benches);
