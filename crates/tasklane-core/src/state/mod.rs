use std::{
    fmt,
    sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use tasklane_model::TaskStream;

/// Holder of the latest computed stream, shared between the refresh loop and readers.
#[derive(Clone, Default)]
pub struct StreamState {
    inner: Arc<RwLock<StreamStateInner>>,
}

#[derive(Default)]
struct StreamStateInner {
    /// Result of the last successful pass.
    latest: Option<Arc<TaskStream>>,
    /// Error of the last pass, cleared by the next success.
    last_error: Option<String>,
    passes: u64,
    failures: u64,
}

/// Counters describing the refresh loop so far.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefreshStats {
    pub passes: u64,
    pub failures: u64,
    pub last_error: Option<String>,
}

impl StreamState {
    /// Create empty stream state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the current stream with the result of a successful pass.
    pub fn publish(&self, stream: TaskStream) {
        let mut inner = self.write();
        inner.latest = Some(Arc::new(stream));
        inner.last_error = None;
        inner.passes += 1;
    }

    /// Record a failed pass. The previous stream stays visible.
    pub fn record_failure(&self, err: impl fmt::Display) {
        let mut inner = self.write();
        inner.last_error = Some(err.to_string());
        inner.passes += 1;
        inner.failures += 1;
    }

    /// Stream of the last successful pass, if any.
    pub fn latest(&self) -> Option<Arc<TaskStream>> {
        self.read().latest.clone()
    }

    pub fn stats(&self) -> RefreshStats {
        let inner = self.read();
        RefreshStats {
            passes: inner.passes,
            failures: inner.failures,
            last_error: inner.last_error.clone(),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, StreamStateInner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, StreamStateInner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::OffsetDateTime;

    fn stream_at(secs: i64) -> TaskStream {
        TaskStream::new(OffsetDateTime::from_unix_timestamp(secs).unwrap())
    }

    #[test]
    fn starts_empty() {
        let state = StreamState::new();
        assert!(state.latest().is_none());
        assert_eq!(state.stats(), RefreshStats::default());
    }

    #[test]
    fn publish_replaces_stream() {
        let state = StreamState::new();
        state.publish(stream_at(1));
        state.publish(stream_at(2));

        let latest = state.latest().unwrap();
        assert_eq!(latest.generated_at.unix_timestamp(), 2);
        assert_eq!(state.stats().passes, 2);
    }

    #[test]
    fn failure_keeps_previous_stream() {
        let state = StreamState::new();
        state.publish(stream_at(1));
        state.record_failure("store unavailable: connection refused");

        assert_eq!(state.latest().unwrap().generated_at.unix_timestamp(), 1);
        let stats = state.stats();
        assert_eq!(stats.failures, 1);
        assert_eq!(
            stats.last_error.as_deref(),
            Some("store unavailable: connection refused")
        );

        state.publish(stream_at(3));
        assert!(state.stats().last_error.is_none());
    }

    #[test]
    fn clones_share_state() {
        let state = StreamState::new();
        let reader = state.clone();
        state.publish(stream_at(5));
        assert!(reader.latest().is_some());
    }
}
