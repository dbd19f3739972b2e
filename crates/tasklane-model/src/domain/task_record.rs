use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

use crate::{TaskId, TaskStatus};

/// Read-only view of one task in the queue's history.
///
/// Records are rebuilt from the store on every refresh and never written back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRecord {
    /// Unique task identifier.
    pub id: TaskId,
    /// Name of the function the task executes; tasks are grouped into lanes by it.
    pub func_name: String,
    /// Status at snapshot time.
    pub status: TaskStatus,
    /// When a worker picked the task up.
    #[serde(with = "time::serde::rfc3339")]
    pub started_at: OffsetDateTime,
    /// When the task ended.
    ///
    /// `None` while the task is in flight; the snapshot fetcher fills it with the snapshot time.
    #[serde(
        default,
        with = "time::serde::rfc3339::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub ended_at: Option<OffsetDateTime>,
    /// Description of the worker executing the task (in-flight tasks only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub running_on: Option<String>,
    /// Human-readable label.
    #[serde(default)]
    pub description: String,
}

impl TaskRecord {
    pub fn new(
        id: impl Into<TaskId>,
        func_name: impl Into<String>,
        status: TaskStatus,
        started_at: OffsetDateTime,
    ) -> Self {
        Self {
            id: id.into(),
            func_name: func_name.into(),
            status,
            started_at,
            ended_at: None,
            running_on: None,
            description: String::new(),
        }
    }

    pub fn with_ended_at(mut self, ended_at: OffsetDateTime) -> Self {
        self.ended_at = Some(ended_at);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// End of the task's interval, treating an open interval as ending at `now`.
    ///
    /// Never earlier than `started_at`: a skewed end is clamped to the start.
    pub fn end_or(&self, now: OffsetDateTime) -> OffsetDateTime {
        let end = self.ended_at.unwrap_or(now);
        end.max(self.started_at)
    }

    /// Duration of the (clamped) interval.
    pub fn duration_until(&self, now: OffsetDateTime) -> Duration {
        self.end_or(now) - self.started_at
    }

    /// Returns `true` if the recorded end lies before the start.
    pub fn is_skewed(&self) -> bool {
        self.ended_at.is_some_and(|end| end < self.started_at)
    }
}
