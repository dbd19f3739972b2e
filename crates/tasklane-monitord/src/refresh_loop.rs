use std::sync::Arc;

use tasklane_core::{HistoryBackend, Refresher, StreamState};
use time::OffsetDateTime;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Run one refresh pass per tick until `cancel` fires.
///
/// A pass that overruns the interval makes the loop skip the ticks it missed.
pub async fn run_refresh_loop<B>(
    backend: Arc<B>,
    refresher: Refresher,
    state: StreamState,
    interval: std::time::Duration,
    cancel: CancellationToken,
) where
    B: HistoryBackend + Send + Sync + 'static,
{
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    info!(interval_ms = interval.as_millis() as u64, "refresh loop started");

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                debug!("refresh loop stopped");
                return;
            }
            _ = ticker.tick() => {}
        }

        match refresher.refresh(backend.as_ref(), OffsetDateTime::now_utc()) {
            Ok(stream) => state.publish(stream),
            Err(e) => {
                error!(reason = %e, "refresh pass failed; keeping previous stream");
                state.record_failure(e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{
        collections::BTreeMap,
        sync::atomic::{AtomicUsize, Ordering},
        time::Duration,
    };

    use super::*;
    use tasklane_core::{MemoryStore, Registry, StoreError};
    use tasklane_model::{TaskId, TaskRecord, TaskStatus, WorkerId, WorkerRecord};

    fn seeded_store() -> MemoryStore {
        let store = MemoryStore::new();
        let now = OffsetDateTime::now_utc();
        store.record(
            Registry::Finished,
            TaskRecord::new("t1", "f", TaskStatus::Finished, now - time::Duration::minutes(5))
                .with_ended_at(now - time::Duration::minutes(1)),
        );
        store
    }

    /// Store that goes away on every `fail_every`-th registry read.
    struct Flaky {
        inner: MemoryStore,
        reads: AtomicUsize,
        fail_every: usize,
    }

    impl HistoryBackend for Flaky {
        fn registry_tasks(
            &self,
            registry: Registry,
            start: isize,
            end: isize,
        ) -> Result<Vec<TaskRecord>, StoreError> {
            let n = self.reads.fetch_add(1, Ordering::SeqCst) + 1;
            if n % self.fail_every == 0 {
                return Err(StoreError::Unavailable("connection reset".into()));
            }
            self.inner.registry_tasks(registry, start, end)
        }

        fn running_tasks(&self) -> Result<BTreeMap<WorkerId, TaskId>, StoreError> {
            self.inner.running_tasks()
        }

        fn fetch_task(&self, id: &TaskId) -> Result<TaskRecord, StoreError> {
            self.inner.fetch_task(id)
        }

        fn fetch_worker(&self, id: &WorkerId) -> Result<WorkerRecord, StoreError> {
            self.inner.fetch_worker(id)
        }
    }

    #[tokio::test]
    async fn publishes_until_cancelled() {
        let store = seeded_store();

        let state = StreamState::new();
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run_refresh_loop(
            Arc::new(store),
            Refresher::default(),
            state.clone(),
            Duration::from_millis(10),
            cancel.clone(),
        ));

        tokio::time::sleep(Duration::from_millis(60)).await;
        cancel.cancel();
        handle.await.unwrap();

        let stats = state.stats();
        assert!(stats.passes >= 1);
        assert_eq!(stats.failures, 0);
        assert_eq!(state.latest().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn failed_pass_keeps_previous_stream() {
        // Two registry reads per pass: every second pass fails.
        let backend = Flaky {
            inner: seeded_store(),
            reads: AtomicUsize::new(0),
            fail_every: 4,
        };

        let state = StreamState::new();
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run_refresh_loop(
            Arc::new(backend),
            Refresher::default(),
            state.clone(),
            Duration::from_millis(5),
            cancel.clone(),
        ));

        for _ in 0..200 {
            if state.stats().failures >= 1 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        cancel.cancel();
        handle.await.unwrap();

        let stats = state.stats();
        assert!(stats.failures >= 1);
        assert!(stats.passes > stats.failures);
        assert_eq!(state.latest().unwrap().len(), 1);
    }
}
