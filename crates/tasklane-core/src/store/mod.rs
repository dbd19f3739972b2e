//! Read contract towards the task queue's persisted state.

mod memory;
pub use memory::MemoryStore;

use std::{collections::BTreeMap, ops::Range};

use tasklane_model::{TaskId, TaskRecord, WorkerId, WorkerRecord};

use crate::error::StoreError;

/// History registries kept by the queue, each ordered oldest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Registry {
    Finished,
    Failed,
}

/// Read-only access to the queue's task history and worker registry.
///
/// Calls are independent reads: a backend gives no atomicity across them.
pub trait HistoryBackend {
    /// Tasks of `registry` within the inclusive index range `start..=end`.
    ///
    /// Negative indices count from the end (`-1` is the most recent entry).
    fn registry_tasks(
        &self,
        registry: Registry,
        start: isize,
        end: isize,
    ) -> Result<Vec<TaskRecord>, StoreError>;

    /// Tasks currently executing, keyed by the worker running them.
    fn running_tasks(&self) -> Result<BTreeMap<WorkerId, TaskId>, StoreError>;

    fn fetch_task(&self, id: &TaskId) -> Result<TaskRecord, StoreError>;

    fn fetch_worker(&self, id: &WorkerId) -> Result<WorkerRecord, StoreError>;
}

/// Resolve an inclusive, possibly negative index range against a list of `len` items.
///
/// Out-of-range bounds are clamped; an inverted range is empty.
pub fn resolve_range(len: usize, start: isize, end: isize) -> Range<usize> {
    let len = len as isize;
    let norm = |i: isize| if i < 0 { len + i } else { i };

    let start = norm(start).max(0);
    let end = norm(end).min(len - 1);
    if start > end {
        return 0..0;
    }
    start as usize..(end + 1) as usize
}
