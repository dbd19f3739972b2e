use tasklane_model::{TaskId, WorkerId};
use thiserror::Error;

/// Failure reported by a history backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("task not found: {0}")]
    TaskNotFound(TaskId),

    #[error("worker not found: {0}")]
    WorkerNotFound(WorkerId),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// Returns `true` for ids that are stale or were evicted from the store.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::TaskNotFound(_) | StoreError::WorkerNotFound(_))
    }
}

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}
