use std::{
    collections::{BTreeMap, HashMap},
    sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use tasklane_model::{HistorySeed, TaskId, TaskRecord, TaskStatus, WorkerId, WorkerRecord};
use time::OffsetDateTime;

use super::{HistoryBackend, Registry, resolve_range};
use crate::error::StoreError;

/// In-memory queue history.
///
/// Mirrors the layout of a real queue store: task records by id, worker records by id,
/// two append-only history registries and a worker -> task map for in-flight work.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<MemoryStoreInner>>,
}

#[derive(Default)]
struct MemoryStoreInner {
    tasks: HashMap<TaskId, TaskRecord>,
    workers: HashMap<WorkerId, WorkerRecord>,
    /// Registry of finished task ids, oldest first.
    finished: Vec<TaskId>,
    /// Registry of failed task ids, oldest first.
    failed: Vec<TaskId>,
    running: BTreeMap<WorkerId, TaskId>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store holding the given history.
    pub fn from_seed(seed: HistorySeed) -> Self {
        let store = Self::new();
        for task in seed.finished {
            store.record(Registry::Finished, task);
        }
        for task in seed.failed {
            store.record(Registry::Failed, task);
        }
        for entry in seed.running {
            let worker_id = entry.worker.id.clone();
            store.add_worker(entry.worker);
            store.start_task(&worker_id, entry.task);
        }
        store
    }

    /// Register a worker (or replace its description).
    pub fn add_worker(&self, worker: WorkerRecord) {
        self.write().workers.insert(worker.id.clone(), worker);
    }

    /// Drop a worker record. Its running entry is left in place, like a crashed worker.
    pub fn remove_worker(&self, id: &WorkerId) {
        self.write().workers.remove(id);
    }

    /// Mark `task` as executing on `worker`.
    pub fn start_task(&self, worker: &WorkerId, mut task: TaskRecord) {
        let mut inner = self.write();

        task.status = TaskStatus::Started;
        task.ended_at = None;
        inner.running.insert(worker.clone(), task.id.clone());
        inner.tasks.insert(task.id.clone(), task);
    }

    /// Move the task running on `worker` into the history registry matching `status`.
    ///
    /// Returns the id of the completed task, or `None` if the worker was idle.
    pub fn complete(
        &self,
        worker: &WorkerId,
        status: TaskStatus,
        ended_at: OffsetDateTime,
    ) -> Option<TaskId> {
        let mut inner = self.write();

        let id = inner.running.remove(worker)?;
        if let Some(task) = inner.tasks.get_mut(&id) {
            task.status = status;
            task.ended_at = Some(ended_at);
        }
        match status {
            TaskStatus::Failed => inner.failed.push(id.clone()),
            _ => inner.finished.push(id.clone()),
        }
        Some(id)
    }

    /// Append an already completed task to a history registry.
    pub fn record(&self, registry: Registry, task: TaskRecord) {
        let mut inner = self.write();

        let id = task.id.clone();
        inner.tasks.insert(id.clone(), task);
        match registry {
            Registry::Finished => inner.finished.push(id),
            Registry::Failed => inner.failed.push(id),
        }
    }

    /// Forget a task record while leaving registry references intact, like an expired key.
    pub fn evict_task(&self, id: &TaskId) {
        self.write().tasks.remove(id);
    }

    fn read(&self) -> RwLockReadGuard<'_, MemoryStoreInner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, MemoryStoreInner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl HistoryBackend for MemoryStore {
    fn registry_tasks(
        &self,
        registry: Registry,
        start: isize,
        end: isize,
    ) -> Result<Vec<TaskRecord>, StoreError> {
        let inner = self.read();
        let ids = match registry {
            Registry::Finished => &inner.finished,
            Registry::Failed => &inner.failed,
        };

        // Registry entries whose record has expired are skipped.
        Ok(ids[resolve_range(ids.len(), start, end)]
            .iter()
            .filter_map(|id| inner.tasks.get(id).cloned())
            .collect())
    }

    fn running_tasks(&self) -> Result<BTreeMap<WorkerId, TaskId>, StoreError> {
        Ok(self.read().running.clone())
    }

    fn fetch_task(&self, id: &TaskId) -> Result<TaskRecord, StoreError> {
        self.read()
            .tasks
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::TaskNotFound(id.clone()))
    }

    fn fetch_worker(&self, id: &WorkerId) -> Result<WorkerRecord, StoreError> {
        self.read()
            .workers
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::WorkerNotFound(id.clone()))
    }
}
