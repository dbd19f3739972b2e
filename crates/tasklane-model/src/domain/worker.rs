use serde::{Deserialize, Serialize};

use crate::WorkerId;

/// Entry of the worker registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerRecord {
    pub id: WorkerId,
    /// Human-readable description, e.g. `host:pid`.
    pub description: String,
}

impl WorkerRecord {
    pub fn new(id: impl Into<WorkerId>, description: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
        }
    }
}
