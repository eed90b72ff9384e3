#[cfg(test)]
mod tests {
    use limited_scheduler::{
        pool::ThreadPool,
        scheduler::{Config, Scheduler},
        work::WorkItem,
        DispatchContext,
    };
    use std::{
        future::Future,
        sync::{
            atomic::{AtomicUsize, Ordering},
            Arc,
        },
        time::{Duration, Instant},
    };

    async fn measure<F, Fut, T>(name: &str, f: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let start = Instant::now();
        let result = f().await;
        let elapsed = start.elapsed();
        println!("✓ {}: {:?}", name, elapsed);
        result
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn load_test_1_small_fast_items() {
        println!("\n=== LOAD TEST 1: 50k мгновенных задач ===");
        let scheduler = Scheduler::with_tokio(Config::io_bound()).unwrap();
        let counter = Arc::new(AtomicUsize::new(0));

        measure("50k items", || async {
            for _ in 0..50_000 {
                let counter = counter.clone();
                scheduler.submit(WorkItem::new(move |_| {
                    counter.fetch_add(1, Ordering::Relaxed);
                }));
            }
            assert!(scheduler.wait_idle_timeout(Duration::from_secs(30)).await);
        }).await;

        let metrics = scheduler.metrics();
        assert_eq!(counter.load(Ordering::Relaxed), 50_000);
        assert_eq!(metrics.executed, 50_000);
        println!("  Диспетчеров запущено: {}", metrics.dispatchers_spawned);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn load_test_2_blocking_items_limited() {
        println!("\n=== LOAD TEST 2: 200 блокирующих задач, max=8 ===");
        let scheduler = Scheduler::with_tokio(Config::default().with_max_concurrency(8)).unwrap();
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..200)
            .map(|i| {
                let running = running.clone();
                let peak = peak.clone();
                scheduler.spawn(move |_| {
                    let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    std::thread::sleep(Duration::from_millis(2));
                    running.fetch_sub(1, Ordering::SeqCst);
                    i
                })
            })
            .collect();

        let results = measure("200 blocking items", || scheduler.join_handles(handles)).await;

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 200);
        assert!(peak.load(Ordering::SeqCst) <= 8);
        println!("  Пик параллелизма: {}", peak.load(Ordering::SeqCst));
    }

    fn fan_out(ctx: &DispatchContext, depth: usize, counter: Arc<AtomicUsize>) {
        counter.fetch_add(1, Ordering::Relaxed);
        if depth == 0 {
            return;
        }
        for branch in 0..2 {
            let counter = counter.clone();
            let child = WorkItem::new(move |ctx| fan_out(ctx, depth - 1, counter));
            // левую ветку выполняем сразу, правую отдаём в очередь
            if branch == 1 || !ctx.try_execute_inline(&child, false) {
                ctx.scheduler().submit(child);
            }
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn load_test_3_recursive_fan_out() {
        println!("\n=== LOAD TEST 3: Рекурсивное дерево задач ===");
        let scheduler = Scheduler::with_tokio(Config::cpu_bound()).unwrap();
        let counter = Arc::new(AtomicUsize::new(0));

        {
            let counter = counter.clone();
            scheduler.submit(WorkItem::new(move |ctx| fan_out(ctx, 12, counter)));
        }

        measure("tree of depth 12", || scheduler.wait_idle()).await;

        let metrics = scheduler.metrics();
        assert_eq!(counter.load(Ordering::Relaxed), (1 << 13) - 1);
        assert_eq!(metrics.executed + metrics.executed_inline, (1 << 13) - 1);
        assert!(metrics.executed_inline > 0);
        println!("  Inline: {}, через очередь: {}", metrics.executed_inline, metrics.executed);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn load_test_4_shared_pool() {
        println!("\n=== LOAD TEST 4: Два планировщика на одном пуле ===");
        let pool = Arc::new(ThreadPool::new(4).unwrap());
        let fast = Scheduler::new(Config::default().with_name("fast").with_max_concurrency(3), pool.clone());
        let slow = Scheduler::new(Config::serial().with_name("slow"), pool.clone());
        let counter = Arc::new(AtomicUsize::new(0));

        for i in 0..1_000 {
            let target = if i % 10 == 0 { &slow } else { &fast };
            let counter = counter.clone();
            target.submit(WorkItem::new(move |_| {
                counter.fetch_add(1, Ordering::Relaxed);
            }));
        }

        measure("1k items on shared pool", || async {
            assert!(fast.wait_idle_timeout(Duration::from_secs(10)).await);
            assert!(slow.wait_idle_timeout(Duration::from_secs(10)).await);
        }).await;

        assert_eq!(counter.load(Ordering::Relaxed), 1_000);
        assert_eq!(slow.metrics().executed, 100);
        assert_eq!(fast.metrics().executed, 900);
    }
}
