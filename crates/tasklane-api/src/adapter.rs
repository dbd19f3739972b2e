use std::sync::Arc;

use async_trait::async_trait;
use tasklane_core::{RefreshStats, StreamState};
use tasklane_model::TaskStream;

use crate::error::ApiError;
use crate::handler::ApiHandler;

/// Adapter that serves whatever the refresh loop last published into a `StreamState`.
#[derive(Clone)]
pub struct StreamStateAdapter {
    state: StreamState,
}

impl StreamStateAdapter {
    pub fn new(state: StreamState) -> Self {
        Self { state }
    }
}

#[async_trait]
impl ApiHandler for StreamStateAdapter {
    async fn stream(&self) -> Result<Arc<TaskStream>, ApiError> {
        self.state.latest().ok_or(ApiError::NotReady)
    }

    async fn functions(&self) -> Result<Vec<String>, ApiError> {
        Ok(self.stream().await?.functions())
    }

    async fn stats(&self) -> Result<RefreshStats, ApiError> {
        Ok(self.state.stats())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tasklane_model::{LaneKey, TaskRecord, TaskStatus};
    use time::OffsetDateTime;

    fn at(secs: i64) -> OffsetDateTime {
        OffsetDateTime::from_unix_timestamp(secs).unwrap()
    }

    #[tokio::test]
    async fn not_ready_until_first_publish() {
        let adapter = StreamStateAdapter::new(StreamState::new());
        assert!(matches!(adapter.stream().await, Err(ApiError::NotReady)));
        assert!(matches!(adapter.functions().await, Err(ApiError::NotReady)));
        assert_eq!(adapter.stats().await.unwrap().passes, 0);
    }

    #[tokio::test]
    async fn serves_latest_stream() {
        let state = StreamState::new();
        let adapter = StreamStateAdapter::new(state.clone());

        let mut stream = TaskStream::new(at(100));
        let task = TaskRecord::new("t1", "reports.build", TaskStatus::Finished, at(0));
        stream.lane_mut(LaneKey::new("reports.build", 0)).push(&task, at(30));
        state.publish(stream);

        assert_eq!(adapter.stream().await.unwrap().len(), 1);
        assert_eq!(adapter.functions().await.unwrap(), vec!["reports.build"]);
        assert_eq!(adapter.stats().await.unwrap().passes, 1);
    }
}
