use super::{
    errors::{PoolError, SnapshotError, SpawnError},
    work::WorkItem,
};


pub type SpawnResult<T> = Result<T, SpawnError>;

pub type SnapshotResult = Result<Vec<WorkItem>, SnapshotError>;

pub type PoolResult<T> = Result<T, PoolError>;
