use limited_scheduler::{Config, Scheduler};
use tokio::runtime::Builder;
use std::time::{Duration, Instant};
use tracing::info;
use tracing_subscriber::EnvFilter;


fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let rt = Builder::new_multi_thread()
        .worker_threads(4)
        .enable_all()
        .build()
        .expect("failed to build tokio runtime");

    rt.block_on(async {
        let now = Instant::now();
        let scheduler = Scheduler::with_tokio(Config::default().with_name("projects").with_max_concurrency(4))
            .expect("tokio runtime is running");

        let handles: Vec<_> = (0..32)
            .map(|project| scheduler.spawn(move |_ctx| {
                // имитация разбора проекта
                std::thread::sleep(Duration::from_millis(20));
                format!("project_{}: {} commands", project, project * 3)
            }))
            .collect();

        let results = scheduler.join_handles(handles).await;
        scheduler.wait_idle().await;

        let metrics = scheduler.metrics();
        info!(
            processed = results.iter().filter(|r| r.is_ok()).count(),
            dispatchers = metrics.dispatchers_spawned,
            queue_pressure = metrics.queue_pressure(),
            success_rate = metrics.success_rate(),
            elapsed = ?now.elapsed(),
            "all projects processed"
        );
    });
}
