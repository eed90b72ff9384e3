//! Планировщик с ограниченным параллелизмом поверх чужого пула потоков
//! 
//! # Features
//! - Не больше `max_concurrency` одновременно выполняемых задач
//! - Потоки одалживаются у внешнего пула (tokio blocking pool или свой `ThreadPool`)
//! - FIFO-очередь с отменой ещё не начатых задач
//! - Inline-выполнение вложенных задач на потоке диспетчера
//! - Handles с результатом, ожидание простоя, метрики и мониторинг

pub mod dispatcher;
pub mod errors;
pub mod gate;
pub mod handle;
pub mod model;
pub mod pool;
pub mod queue;
pub mod result;
pub mod scheduler;
pub mod work;

pub use dispatcher::DispatchContext;
pub use pool::{ThreadPool, TokioPool, WorkerPool};
pub use scheduler::{Config, Scheduler};
pub use work::{WorkItem, WorkItemId};
