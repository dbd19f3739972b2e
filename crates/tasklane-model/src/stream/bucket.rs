use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

use crate::{TaskRecord, TaskStatus};

/// Column-oriented table of tasks, ready for a plotting layer.
///
/// Every column holds one entry per task; entries are aligned by position.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayBucket {
    #[serde(with = "super::serde_ext::rfc3339_seq")]
    pub start: Vec<OffsetDateTime>,
    #[serde(with = "super::serde_ext::rfc3339_seq")]
    pub end: Vec<OffsetDateTime>,
    pub duration: Vec<String>,
    pub task_func: Vec<String>,
    pub status: Vec<TaskStatus>,
    pub key: Vec<String>,
    pub description: Vec<String>,
    pub running_on: Vec<Option<String>>,
}

impl DisplayBucket {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one row for `task`, drawn from its start to `ended_at`.
    pub fn push(&mut self, task: &TaskRecord, ended_at: OffsetDateTime) {
        self.start.push(task.started_at);
        self.end.push(ended_at);
        self.duration.push(format_duration(ended_at - task.started_at));
        self.task_func.push(task.func_name.clone());
        self.status.push(task.status);
        self.key.push(task.id.to_string());
        self.description.push(task.description.clone());
        self.running_on.push(task.running_on.clone());
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.key.is_empty()
    }
}

/// Render a duration as `H:MM:SS`, with a `.ffffff` suffix when there are sub-second microseconds.
///
/// Hours are not folded into days. Negative durations render as zero.
pub fn format_duration(d: Duration) -> String {
    let d = if d.is_negative() { Duration::ZERO } else { d };
    let total = d.whole_seconds();
    let (h, m, s) = (total / 3600, (total % 3600) / 60, total % 60);
    let micros = d.subsec_microseconds();

    if micros == 0 {
        format!("{h}:{m:02}:{s:02}")
    } else {
        format!("{h}:{m:02}:{s:02}.{micros:06}")
    }
}
