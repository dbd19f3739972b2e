//! History snapshot assembly: finished, failed and in-flight tasks in one flat list.

use std::collections::HashMap;

use tasklane_model::{TaskId, TaskRecord, WorkerId};
use time::OffsetDateTime;
use tracing::{debug, instrument, warn};

use crate::{
    error::{CoreError, StoreError},
    store::{HistoryBackend, Registry},
};

/// Default number of most recent entries read from each history registry.
pub const DEFAULT_HISTORY_LIMIT: usize = 1000;

/// What to do when a running entry points at a task or worker the store no longer has.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MissingPolicy {
    /// Fail the whole snapshot.
    Abort,
    /// Log and drop the entry; the task most likely ended between the two reads.
    #[default]
    Skip,
}

/// How to treat a task id seen in more than one source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DedupPolicy {
    /// Keep every record as read.
    KeepAll,
    /// Keep one record per id: terminal beats in-flight, later end beats earlier.
    #[default]
    PreferTerminal,
}

#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub max_finished: usize,
    pub max_failed: usize,
    pub missing: MissingPolicy,
    pub dedup: DedupPolicy,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_finished: DEFAULT_HISTORY_LIMIT,
            max_failed: DEFAULT_HISTORY_LIMIT,
            missing: MissingPolicy::default(),
            dedup: DedupPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SnapshotFetcher {
    cfg: FetchConfig,
}

impl SnapshotFetcher {
    pub fn new(cfg: FetchConfig) -> Self {
        Self { cfg }
    }

    pub fn config(&self) -> &FetchConfig {
        &self.cfg
    }

    /// Read one snapshot of task history.
    ///
    /// In-flight tasks get `ended_at = now` and the description of the worker running them.
    #[instrument(level = "trace", skip(self, backend))]
    pub fn fetch<B>(&self, backend: &B, now: OffsetDateTime) -> Result<Vec<TaskRecord>, CoreError>
    where
        B: HistoryBackend + ?Sized,
    {
        let finished = recent(backend, Registry::Finished, self.cfg.max_finished)?;
        let failed = recent(backend, Registry::Failed, self.cfg.max_failed)?;
        let running = self.running(backend, now)?;
        debug!(
            finished = finished.len(),
            failed = failed.len(),
            running = running.len(),
            "history snapshot read"
        );

        let mut tasks = failed;
        tasks.extend(finished);
        tasks.extend(running);

        Ok(match self.cfg.dedup {
            DedupPolicy::KeepAll => tasks,
            DedupPolicy::PreferTerminal => dedup_prefer_terminal(tasks),
        })
    }

    fn running<B>(&self, backend: &B, now: OffsetDateTime) -> Result<Vec<TaskRecord>, CoreError>
    where
        B: HistoryBackend + ?Sized,
    {
        let mut out = Vec::new();
        for (worker_id, task_id) in backend.running_tasks()? {
            match running_entry(backend, &worker_id, &task_id, now) {
                Ok(task) => out.push(task),
                Err(e) if e.is_not_found() && self.cfg.missing == MissingPolicy::Skip => {
                    warn!(
                        worker = %worker_id,
                        task = %task_id,
                        reason = %e,
                        "running entry vanished before it could be read; skipping"
                    );
                }
                Err(e) => return Err(e.into()),
            }
        }
        Ok(out)
    }
}

fn recent<B>(backend: &B, registry: Registry, max: usize) -> Result<Vec<TaskRecord>, CoreError>
where
    B: HistoryBackend + ?Sized,
{
    if max == 0 {
        return Ok(Vec::new());
    }
    let start = -isize::try_from(max).unwrap_or(isize::MAX);
    Ok(backend.registry_tasks(registry, start, -1)?)
}

fn running_entry<B>(
    backend: &B,
    worker_id: &WorkerId,
    task_id: &TaskId,
    now: OffsetDateTime,
) -> Result<TaskRecord, StoreError>
where
    B: HistoryBackend + ?Sized,
{
    let mut task = backend.fetch_task(task_id)?;
    let worker = backend.fetch_worker(worker_id)?;
    task.ended_at = Some(now);
    task.running_on = Some(worker.description);
    Ok(task)
}

/// Collapse records sharing an id, keeping the position of the first occurrence.
fn dedup_prefer_terminal(tasks: Vec<TaskRecord>) -> Vec<TaskRecord> {
    let mut index: HashMap<TaskId, usize> = HashMap::with_capacity(tasks.len());
    let mut out: Vec<TaskRecord> = Vec::with_capacity(tasks.len());

    for task in tasks {
        if let Some(&i) = index.get(&task.id) {
            debug!(task = %task.id, "task seen in more than one source");
            if supersedes(&task, &out[i]) {
                out[i] = task;
            }
            continue;
        }
        index.insert(task.id.clone(), out.len());
        out.push(task);
    }
    out
}

fn supersedes(candidate: &TaskRecord, current: &TaskRecord) -> bool {
    match (candidate.status.is_terminal(), current.status.is_terminal()) {
        (true, false) => true,
        (true, true) => candidate.ended_at > current.ended_at,
        _ => false,
    }
}
