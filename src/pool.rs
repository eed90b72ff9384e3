use super::result::PoolResult;
use std::{
    any::Any,
    panic::{catch_unwind, AssertUnwindSafe},
    sync::Arc,
    thread,
};
use crossbeam::channel::{self, Receiver, Sender};
use tokio::runtime::Handle;
use tracing::{debug, error};


pub type PoolJob = Box<dyn FnOnce() + Send + 'static>;

/// Пул, у которого планировщик одалживает потоки.
///
/// Fire-and-forget: без уведомления о завершении и без гарантий порядка
/// между вызовами `execute`.
pub trait WorkerPool: Send + Sync + 'static {
    fn execute(&self, job: PoolJob);
}

impl<P: WorkerPool + ?Sized> WorkerPool for Arc<P> {
    #[inline]
    fn execute(&self, job: PoolJob) {
        (**self).execute(job)
    }
}


/// Блокирующий пул tokio-рантайма.
///
/// После остановки рантайма `spawn_blocking` выбрасывает задачи не запуская;
/// планировщик тогда освобождает слот, но ожидающие задачи стоят до
/// следующего `submit` на живом пуле.
#[derive(Debug, Clone)]
pub struct TokioPool {
    handle: Handle,
}

impl TokioPool {
    pub fn new(handle: Handle) -> Self {
        Self { handle }
    }

    /// Пул текущего рантайма; ошибка вне контекста tokio
    pub fn current() -> PoolResult<Self> {
        Ok(Self::new(Handle::try_current()?))
    }
}

impl WorkerPool for TokioPool {
    #[inline]
    fn execute(&self, job: PoolJob) {
        // JoinHandle не нужен: о завершении планировщик узнаёт сам
        drop(self.handle.spawn_blocking(job));
    }
}


/// Конфигурация собственного пула потоков
#[derive(Debug, Clone)]
pub struct PoolConfig {
    pub num_threads: usize,
    pub thread_name: String,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            num_threads: num_cpus::get(),
            thread_name: "limited-worker".to_string(),
        }
    }
}

/// Фиксированная группа потоков с общим каналом задач.
///
/// Паника в задаче перехватывается на границе потока, поток продолжает
/// работу. При `drop` канал закрывается и потоки дожидаются.
pub struct ThreadPool {
    sender: Option<Sender<PoolJob>>,
    workers: Vec<thread::JoinHandle<()>>,
}

impl ThreadPool {
    pub fn new(num_threads: usize) -> PoolResult<Self> {
        Self::with_config(PoolConfig {
            num_threads,
            ..Default::default()
        })
    }

    pub fn with_config(config: PoolConfig) -> PoolResult<Self> {
        let (sender, receiver) = channel::unbounded::<PoolJob>();
        let num_threads = config.num_threads.max(1);
        let mut workers = Vec::with_capacity(num_threads);

        for idx in 0..num_threads {
            let rx = receiver.clone();
            let worker = thread::Builder::new()
                .name(format!("{}-{}", config.thread_name, idx))
                .spawn(move || worker_loop(rx))?;
            workers.push(worker);
        }

        debug!(threads = num_threads, "thread pool started");
        Ok(Self {
            sender: Some(sender),
            workers,
        })
    }

    #[inline]
    pub fn num_threads(&self) -> usize {
        self.workers.len()
    }
}

fn worker_loop(rx: Receiver<PoolJob>) {
    for job in rx.iter() {
        if let Err(panic_info) = catch_unwind(AssertUnwindSafe(job)) {
            error!(
                thread = thread::current().name().unwrap_or("unnamed"),
                panic = %panic_message(&*panic_info),
                "job panicked on pool worker"
            );
        }
    }
}

impl WorkerPool for ThreadPool {
    fn execute(&self, job: PoolJob) {
        if let Some(sender) = &self.sender {
            if sender.send(job).is_err() {
                error!("thread pool channel closed, job dropped");
            }
        }
    }
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        drop(self.sender.take());
        let current = thread::current().id();
        for worker in self.workers.drain(..) {
            // последний владелец может оказаться собственным воркером пула
            if worker.thread().id() != current {
                let _ = worker.join();
            }
        }
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
