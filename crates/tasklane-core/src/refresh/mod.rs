//! One refresh pass: snapshot the store, rebuild lanes, bucket for display.

use tasklane_model::TaskStream;
use time::{Duration, OffsetDateTime};
use tracing::{debug, instrument};

use crate::{
    error::CoreError,
    fetch::{FetchConfig, SnapshotFetcher},
    lanes::{DEFAULT_SHORT_THRESHOLD, LaneReconstructor},
    store::HistoryBackend,
};

/// How far back tasks are drawn by default.
pub const DEFAULT_TIME_WINDOW: Duration = Duration::hours(48);

#[derive(Debug, Clone)]
pub struct RefreshConfig {
    /// Tasks that ended longer ago than this are left out of the buckets.
    pub time_window: Duration,
    pub short_threshold: Duration,
    pub fetch: FetchConfig,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            time_window: DEFAULT_TIME_WINDOW,
            short_threshold: DEFAULT_SHORT_THRESHOLD,
            fetch: FetchConfig::default(),
        }
    }
}

/// Stateless driver of refresh passes. Nothing carries over from one pass to the next.
#[derive(Debug, Clone)]
pub struct Refresher {
    fetcher: SnapshotFetcher,
    reconstructor: LaneReconstructor,
    time_window: Duration,
}

impl Default for Refresher {
    fn default() -> Self {
        Self::new(RefreshConfig::default())
    }
}

impl Refresher {
    pub fn new(cfg: RefreshConfig) -> Self {
        Self {
            fetcher: SnapshotFetcher::new(cfg.fetch),
            reconstructor: LaneReconstructor::new(cfg.short_threshold),
            time_window: cfg.time_window,
        }
    }

    /// Oldest end time still drawn for a pass computed at `now`.
    pub fn cutoff(&self, now: OffsetDateTime) -> Option<OffsetDateTime> {
        now.checked_sub(self.time_window)
    }

    #[instrument(level = "debug", skip_all, fields(now = %now))]
    pub fn refresh<B>(&self, backend: &B, now: OffsetDateTime) -> Result<TaskStream, CoreError>
    where
        B: HistoryBackend + ?Sized,
    {
        let tasks = self.fetcher.fetch(backend, now)?;
        let stream = self.reconstructor.reconstruct(&tasks, self.cutoff(now), now);

        debug!(
            tasks = tasks.len(),
            drawn = stream.len(),
            lanes = stream.lanes.len(),
            short = stream.short.len(),
            "refresh pass complete"
        );
        Ok(stream)
    }
}
