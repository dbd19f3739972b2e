use serde::{Deserialize, Serialize};

use crate::{TaskRecord, WorkerRecord};

/// A worker together with the task it is executing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunningEntry {
    pub worker: WorkerRecord,
    pub task: TaskRecord,
}

/// Serializable dump of queue history, used to fill an in-memory store.
///
/// `finished` and `failed` are ordered oldest first, the way the registries keep them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HistorySeed {
    #[serde(default)]
    pub finished: Vec<TaskRecord>,
    #[serde(default)]
    pub failed: Vec<TaskRecord>,
    #[serde(default)]
    pub running: Vec<RunningEntry>,
}
