use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::ModelError;

/// Lifecycle state of a task as reported by the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TaskStatus {
    /// Task is enqueued and waiting for a worker.
    Queued,
    /// Task has been picked up by a worker and is executing.
    Started,
    /// Task completed successfully.
    Finished,
    /// Task raised an error.
    Failed,
    /// Task was canceled before it completed.
    Canceled,
}

impl TaskStatus {
    /// Every status, in lifecycle order. Renderers use it as the legend factor list.
    pub const ALL: [TaskStatus; 5] = [
        TaskStatus::Queued,
        TaskStatus::Started,
        TaskStatus::Finished,
        TaskStatus::Failed,
        TaskStatus::Canceled,
    ];

    /// Returns `true` if the task reached a state it will not leave.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskStatus::Finished | TaskStatus::Failed | TaskStatus::Canceled
        )
    }

    /// Returns `true` if the task is still queued or executing.
    pub fn is_active(&self) -> bool {
        matches!(self, TaskStatus::Queued | TaskStatus::Started)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Queued => "queued",
            TaskStatus::Started => "started",
            TaskStatus::Finished => "finished",
            TaskStatus::Failed => "failed",
            TaskStatus::Canceled => "canceled",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let norm = s.trim().to_ascii_lowercase();
        TaskStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == norm)
            .ok_or_else(|| ModelError::InvalidStatus(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_states() {
        assert!(TaskStatus::Finished.is_terminal());
        assert!(TaskStatus::Failed.is_terminal());
        assert!(TaskStatus::Canceled.is_terminal());

        assert!(!TaskStatus::Queued.is_terminal());
        assert!(!TaskStatus::Started.is_terminal());
    }

    #[test]
    fn active_states() {
        assert!(TaskStatus::Queued.is_active());
        assert!(TaskStatus::Started.is_active());

        assert!(!TaskStatus::Finished.is_active());
        assert!(!TaskStatus::Failed.is_active());
    }

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!("FAILED".parse::<TaskStatus>().unwrap(), TaskStatus::Failed);
        assert_eq!(" started ".parse::<TaskStatus>().unwrap(), TaskStatus::Started);
        assert!("running".parse::<TaskStatus>().is_err());
    }

    #[test]
    fn serde_uses_lowercase_names() {
        let json = serde_json::to_string(&TaskStatus::Finished).unwrap();
        assert_eq!(json, r#""finished""#);

        let back: TaskStatus = serde_json::from_str(r#""canceled""#).unwrap();
        assert_eq!(back, TaskStatus::Canceled);
    }
}
