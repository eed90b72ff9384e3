use thiserror::Error;


/// Ошибки, которые получает владелец [`crate::handle::JoinHandle`]
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum SpawnError {
    #[error("work item panicked: {0}")]
    Panic(String),
    #[error("work item was cancelled before it started")]
    Cancelled,
    #[error("timed out waiting for work item result")]
    Timeout,
}

/// Очередь занята другим потоком, снимок можно запросить повторно
#[derive(Debug, Error, PartialEq, Eq, Clone, Copy)]
pub enum SnapshotError {
    #[error("pending queue is busy, retry later")]
    Busy,
}

#[derive(Debug, Error)]
pub enum PoolError {
    #[error("failed to spawn worker thread: {0}")]
    ThreadSpawn(#[from] std::io::Error),
    #[error("no tokio runtime available: {0}")]
    NoRuntime(#[from] tokio::runtime::TryCurrentError),
}
