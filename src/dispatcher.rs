use super::{
    queue::Handoff,
    scheduler::Scheduler,
    work::WorkItem,
};
use std::{
    cell::Cell,
    fmt,
    marker::PhantomData,
    sync::atomic::Ordering,
    thread,
};
use tracing::{debug, trace, warn};


/// Контекст диспетчера, одалживаемый каждой выполняемой задаче.
///
/// Только через него задача может выполнить вложенную задачу inline.
/// Значение не `Send` и не `Sync`: ссылка на него не покидает поток
/// диспетчера и не переживает вызов задачи.
pub struct DispatchContext {
    scheduler: Scheduler,
    draining: Cell<bool>,
    _not_send: PhantomData<*const ()>,
}

impl DispatchContext {
    fn enter(scheduler: Scheduler) -> Self {
        Self {
            scheduler,
            draining: Cell::new(true),
            _not_send: PhantomData,
        }
    }

    #[inline]
    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    #[inline]
    pub fn is_draining(&self) -> bool {
        self.draining.get()
    }

    pub(crate) fn belongs_to(&self, scheduler: &Scheduler) -> bool {
        self.is_draining() && self.scheduler.same_as(scheduler)
    }

    /// То же, что [`Scheduler::try_execute_inline`] с этим контекстом
    pub fn try_execute_inline(&self, item: &WorkItem, was_previously_queued: bool) -> bool {
        self.scheduler.try_execute_inline(Some(self), item, was_previously_queued)
    }
}

impl fmt::Debug for DispatchContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatchContext")
            .field("scheduler", &self.scheduler.name())
            .field("draining", &self.draining.get())
            .finish()
    }
}


/// Снимает флаг диспетчера при любом выходе из цикла.
///
/// При размотке после паники задачи слот либо освобождается (очередь пуста),
/// либо передаётся новому диспетчеру.
struct DrainGuard<'a> {
    ctx: &'a DispatchContext,
}

impl Drop for DrainGuard<'_> {
    fn drop(&mut self) {
        self.ctx.draining.set(false);
        if !thread::panicking() {
            return;
        }

        let scheduler = &self.ctx.scheduler;
        let inner = scheduler.inner();
        inner.counters.panicked.fetch_add(1, Ordering::Relaxed);

        match inner.queue.handoff_after_panic() {
            Handoff::Released => {
                warn!(scheduler = %inner.name, "work item panicked, dispatcher retired");
                inner.notify_if_idle();
            }
            Handoff::Replace => {
                warn!(scheduler = %inner.name, "work item panicked, handing slot to a new dispatcher");
                spawn(scheduler.clone());
            }
        }
    }
}


/// Запуск диспетчера, ещё не принятый пулом к выполнению.
///
/// Если пул уничтожит задачу, так и не вызвав её (например, рантайм tokio
/// уже остановлен), слот освобождается, иначе он занят навсегда.
struct Launch {
    scheduler: Option<Scheduler>,
}

impl Launch {
    fn start(mut self) {
        if let Some(scheduler) = self.scheduler.take() {
            run(scheduler);
        }
    }
}

impl Drop for Launch {
    fn drop(&mut self) {
        if let Some(scheduler) = self.scheduler.take() {
            let inner = scheduler.inner();
            warn!(scheduler = %inner.name, "worker pool dropped a dispatcher without running it");
            inner.queue.release_slot();
            inner.notify_if_idle();
        }
    }
}

/// Запускает новый диспетчер на одолженном потоке. Слот должен быть уже занят.
pub(crate) fn spawn(scheduler: Scheduler) {
    let inner = scheduler.inner();
    inner.counters.dispatchers_spawned.fetch_add(1, Ordering::Relaxed);
    let pool = inner.pool.clone();
    let launch = Launch {
        scheduler: Some(scheduler),
    };
    pool.execute(Box::new(move || launch.start()));
}

fn run(scheduler: Scheduler) {
    let ctx = DispatchContext::enter(scheduler);
    let guard = DrainGuard { ctx: &ctx };
    let inner = ctx.scheduler.inner();
    debug!(scheduler = %inner.name, "dispatcher started");

    while let Some(item) = inner.queue.pop_or_retire() {
        trace!(scheduler = %inner.name, item = %item.id(), "executing");
        if let Some(job) = item.take() {
            inner.counters.executed.fetch_add(1, Ordering::Relaxed);
            job(&ctx);
        }
    }

    drop(guard);
    debug!(scheduler = %inner.name, "dispatcher retired");
    inner.notify_if_idle();
}
