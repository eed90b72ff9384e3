use super::{
    dispatcher::{self, DispatchContext},
    errors::SpawnError,
    handle::JoinHandle,
    model::SchedulerMetrics,
    pool::{panic_message, PoolConfig, ThreadPool, TokioPool, WorkerPool},
    queue::{Admission, PendingQueue},
    result::{PoolResult, SnapshotResult, SpawnResult},
    work::WorkItem,
};
use std::{
    fmt,
    panic::{catch_unwind, AssertUnwindSafe},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};
use futures::stream::{FuturesUnordered, StreamExt};
use tokio::{
    sync::{oneshot, Notify},
    time::Duration,
};
use tokio_util::sync::CancellationToken;
use tracing::trace;


/// Конфигурация планировщика
#[derive(Debug, Clone)]
pub struct Config {
    pub name: String,
    pub max_concurrency: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            name: "scheduler".to_string(),
            max_concurrency: num_cpus::get(),
        }
    }
}

impl Config {
    pub fn cpu_bound() -> Self {
        Self {
            max_concurrency: num_cpus::get(),
            ..Default::default()
        }
    }

    pub fn io_bound() -> Self {
        Self {
            max_concurrency: num_cpus::get() * 2,
            ..Default::default()
        }
    }

    /// Строго последовательное выполнение в порядке постановки
    pub fn serial() -> Self {
        Self {
            max_concurrency: 1,
            ..Default::default()
        }
    }

    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency;
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}


#[derive(Default)]
pub(crate) struct Counters {
    pub(crate) submitted: AtomicUsize,
    pub(crate) executed: AtomicUsize,
    pub(crate) executed_inline: AtomicUsize,
    pub(crate) cancelled: AtomicUsize,
    pub(crate) panicked: AtomicUsize,
    pub(crate) dispatchers_spawned: AtomicUsize,
}

pub(crate) struct SchedulerInner {
    pub(crate) name: String,
    pub(crate) queue: PendingQueue,
    pub(crate) pool: Arc<dyn WorkerPool>,
    pub(crate) counters: Counters,
    idle: Notify,
}

impl SchedulerInner {
    pub(crate) fn notify_if_idle(&self) {
        if self.queue.is_idle() {
            self.idle.notify_waiters();
        }
    }
}


/// Планировщик с ограниченным числом одновременно выполняемых задач.
///
/// Собственных потоков нет: на каждый допущенный слот у [`WorkerPool`]
/// одалживается поток, на котором диспетчер выбирает очередь до пустоты.
/// Ёмкость ограничивает только параллелизм, приём задач не ограничен.
#[derive(Clone)]
pub struct Scheduler {
    inner: Arc<SchedulerInner>,
}

impl Scheduler {
    pub fn new<P: WorkerPool>(config: Config, pool: P) -> Self {
        Self::with_shared_pool(config, Arc::new(pool))
    }

    pub fn with_shared_pool(config: Config, pool: Arc<dyn WorkerPool>) -> Self {
        Self {
            inner: Arc::new(SchedulerInner {
                name: config.name,
                queue: PendingQueue::new(config.max_concurrency),
                pool,
                counters: Counters::default(),
                idle: Notify::new(),
            }),
        }
    }

    /// Потоки одалживаются у блокирующего пула текущего tokio-рантайма
    pub fn with_tokio(config: Config) -> PoolResult<Self> {
        Ok(Self::new(config, TokioPool::current()?))
    }

    /// Собственный [`ThreadPool`] по числу слотов
    pub fn with_threads(config: Config) -> PoolResult<Self> {
        let pool = ThreadPool::with_config(PoolConfig {
            num_threads: config.max_concurrency.max(1),
            thread_name: config.name.clone(),
        })?;
        Ok(Self::new(config, pool))
    }

    #[inline]
    pub(crate) fn inner(&self) -> &SchedulerInner {
        &self.inner
    }

    #[inline]
    pub(crate) fn same_as(&self, other: &Scheduler) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn max_concurrency(&self) -> usize {
        self.inner.queue.max_concurrency()
    }

    /// Ставит задачу в очередь; при свободном слоте запускает диспетчер.
    /// Никогда не блокируется и не отказывает.
    pub fn submit(&self, item: WorkItem) {
        self.inner.counters.submitted.fetch_add(1, Ordering::Relaxed);
        let id = item.id();
        match self.inner.queue.enqueue_and_admit(item) {
            Admission::Admitted => {
                trace!(scheduler = %self.inner.name, item = %id, "admitted new dispatcher");
                dispatcher::spawn(self.clone());
            }
            Admission::Queued => {
                trace!(scheduler = %self.inner.name, item = %id, "queued behind running dispatchers");
            }
        }
    }

    /// Выполняет задачу прямо на потоке диспетчера, из которого пришёл вызов.
    ///
    /// `false`, если `ctx` отсутствует или принадлежит другому планировщику,
    /// если ранее поставленную задачу уже забрал диспетчер, или если тело
    /// задачи уже было забрано. Задача никогда не выполняется дважды.
    pub fn try_execute_inline(
        &self,
        ctx: Option<&DispatchContext>,
        item: &WorkItem,
        was_previously_queued: bool,
    ) -> bool {
        let Some(ctx) = ctx.filter(|ctx| ctx.belongs_to(self)) else {
            trace!(scheduler = %self.inner.name, item = %item.id(), "inline refused, not a dispatcher");
            return false;
        };

        if was_previously_queued && !self.inner.queue.remove(item) {
            trace!(scheduler = %self.inner.name, item = %item.id(), "inline refused, already claimed");
            return false;
        }

        match item.take() {
            Some(job) => {
                if !was_previously_queued {
                    // задача могла стоять в очереди, хотя вызывающий об этом не сказал
                    self.inner.queue.remove(item);
                }
                self.inner.counters.executed_inline.fetch_add(1, Ordering::Relaxed);
                job(ctx);
                true
            }
            None => false,
        }
    }

    /// `true`, если задача ещё ждала в очереди и теперь не будет выполнена
    pub fn cancel(&self, item: &WorkItem) -> bool {
        if !self.inner.queue.remove(item) {
            return false;
        }
        // тело могли уже забрать inline, не снимая задачу с очереди
        if !item.discard() {
            return false;
        }
        self.inner.counters.cancelled.fetch_add(1, Ordering::Relaxed);
        trace!(scheduler = %self.inner.name, item = %item.id(), "cancelled");
        true
    }

    /// Содержимое очереди без блокировки; только для диагностики
    pub fn snapshot(&self) -> SnapshotResult {
        self.inner.queue.try_snapshot()
    }

    /// Ставит функцию в очередь и возвращает handle на её результат.
    ///
    /// Паника в `f` перехватывается и приходит в handle как
    /// [`SpawnError::Panic`], диспетчер продолжает работу.
    pub fn spawn<T, F>(&self, f: F) -> JoinHandle<T>
    where
        T: Send + 'static,
        F: FnOnce(&DispatchContext) -> T + Send + 'static,
    {
        let (tx, rx) = oneshot::channel::<SpawnResult<T>>();

        let item = WorkItem::new(move |ctx| {
            let result = catch_unwind(AssertUnwindSafe(|| f(ctx))).map_err(|panic_info| {
                ctx.scheduler()
                    .inner()
                    .counters
                    .panicked
                    .fetch_add(1, Ordering::Relaxed);
                SpawnError::Panic(panic_message(&*panic_info))
            });
            let _ = tx.send(result);
        });

        self.submit(item.clone());
        JoinHandle::new(self.clone(), item, rx)
    }

    /// Ожидание набора handles, результаты в порядке завершения
    pub async fn join_handles<T>(&self, handles: Vec<JoinHandle<T>>) -> Vec<SpawnResult<T>>
    where
        T: Send + 'static,
    {
        if handles.is_empty() {
            return Vec::new();
        }

        let len = handles.len();
        let mut futures = FuturesUnordered::from_iter(handles);
        let mut results = Vec::with_capacity(len);

        while let Some(result) = futures.next().await {
            results.push(result);
        }

        results
    }

    pub fn is_idle(&self) -> bool {
        self.inner.queue.is_idle()
    }

    /// Ждёт, пока очередь опустеет и все диспетчеры завершатся
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.inner.idle.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.is_idle() {
                return;
            }
            notified.await;
        }
    }

    pub async fn wait_idle_timeout(&self, timeout: Duration) -> bool {
        tokio::time::timeout(timeout, self.wait_idle()).await.is_ok()
    }

    pub fn metrics(&self) -> SchedulerMetrics {
        let (queued_items, active_dispatchers) = self.inner.queue.counts();
        let counters = &self.inner.counters;
        SchedulerMetrics {
            active_dispatchers,
            max_concurrency: self.max_concurrency(),
            queued_items,
            total_submitted: counters.submitted.load(Ordering::Relaxed),
            executed: counters.executed.load(Ordering::Relaxed),
            executed_inline: counters.executed_inline.load(Ordering::Relaxed),
            cancelled: counters.cancelled.load(Ordering::Relaxed),
            panicked: counters.panicked.load(Ordering::Relaxed),
            dispatchers_spawned: counters.dispatchers_spawned.load(Ordering::Relaxed),
        }
    }

    /// Периодический вызов `callback` с метриками на tokio-рантайме.
    /// ВАЖНО: вызовите `token.cancel()`, чтобы остановить мониторинг и отпустить планировщик.
    pub fn start_monitoring<F>(&self, interval: Duration, callback: F) -> CancellationToken
    where
        F: Fn(SchedulerMetrics) + Send + 'static,
    {
        let scheduler = self.clone();
        let token = CancellationToken::new();
        let token_clone = token.clone();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = tokio::time::sleep(interval) => {
                        callback(scheduler.metrics());
                    }
                    _ = token_clone.cancelled() => {
                        drop(scheduler);
                        break;
                    }
                }
            }
        });

        token
    }
}

impl fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (queued, active) = self.inner.queue.counts();
        f.debug_struct("Scheduler")
            .field("name", &self.inner.name)
            .field("max_concurrency", &self.max_concurrency())
            .field("active", &active)
            .field("queued", &queued)
            .finish()
    }
}
