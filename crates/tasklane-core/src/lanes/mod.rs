//! Lane reconstruction.
//!
//! The queue does not persist which worker slot ran a task, so lanes are rebuilt from
//! the intervals alone: per function, tasks are walked in start order and each one takes
//! the lowest lane whose previous occupant has already ended. Walking intervals by start
//! and reusing the lowest free lane needs exactly as many lanes as the largest number of
//! tasks overlapping at one instant.

use std::collections::BTreeMap;

use tasklane_model::{Lane, LaneKey, TaskRecord, TaskStream};
use time::{Duration, OffsetDateTime};
use tracing::{debug, trace};

/// Tasks lasting at most this long are drawn in the shared short-task bucket.
pub const DEFAULT_SHORT_THRESHOLD: Duration = Duration::SECOND;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LaneSlot {
    Free,
    Occupied { ends_at: OffsetDateTime },
}

#[derive(Debug, Clone)]
pub struct LaneReconstructor {
    short_threshold: Duration,
}

impl Default for LaneReconstructor {
    fn default() -> Self {
        Self::new(DEFAULT_SHORT_THRESHOLD)
    }
}

impl LaneReconstructor {
    pub fn new(short_threshold: Duration) -> Self {
        Self { short_threshold }
    }

    pub fn short_threshold(&self) -> Duration {
        self.short_threshold
    }

    /// Lane of every task, aligned with `tasks`.
    ///
    /// Open intervals end at `now`.
    pub fn assign_lanes(&self, tasks: &[TaskRecord], now: OffsetDateTime) -> Vec<Lane> {
        assign_in_order(tasks, &start_order(tasks), now)
    }

    /// Assign lanes and split the tasks into display buckets.
    ///
    /// Tasks that ended before `cutoff` still take part in lane assignment but are not
    /// bucketed. A task longer than the short threshold goes to its `(function, lane)`
    /// bucket, anything else to the shared short bucket. Rows follow global start order.
    pub fn reconstruct(
        &self,
        tasks: &[TaskRecord],
        cutoff: Option<OffsetDateTime>,
        now: OffsetDateTime,
    ) -> TaskStream {
        let order = start_order(tasks);
        let lanes = assign_in_order(tasks, &order, now);
        let mut stream = TaskStream::new(now);

        for i in order {
            let task = &tasks[i];
            if task.is_skewed() {
                debug!(task = %task.id, "task ends before it starts; clamping to zero duration");
            }

            let ended_at = task.end_or(now);
            if cutoff.is_some_and(|cutoff| ended_at < cutoff) {
                continue;
            }

            if ended_at - task.started_at > self.short_threshold {
                stream
                    .lane_mut(LaneKey::new(task.func_name.as_str(), lanes[i]))
                    .push(task, ended_at);
            } else {
                stream.short.push(task, ended_at);
            }
        }
        stream
    }
}

/// Indices of `tasks` sorted by start; ties keep input order.
fn start_order(tasks: &[TaskRecord]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..tasks.len()).collect();
    order.sort_by_key(|&i| tasks[i].started_at);
    order
}

fn assign_in_order(tasks: &[TaskRecord], order: &[usize], now: OffsetDateTime) -> Vec<Lane> {
    let mut groups: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for &i in order {
        groups.entry(tasks[i].func_name.as_str()).or_default().push(i);
    }

    let mut lanes = vec![0; tasks.len()];
    for (func_name, members) in groups {
        let mut slots: Vec<LaneSlot> = Vec::new();

        for i in members {
            let task = &tasks[i];
            for slot in slots.iter_mut() {
                if let LaneSlot::Occupied { ends_at } = *slot
                    && ends_at <= task.started_at
                {
                    *slot = LaneSlot::Free;
                }
            }

            let lane = match slots.iter().position(|slot| *slot == LaneSlot::Free) {
                Some(lane) => lane,
                None => {
                    slots.push(LaneSlot::Free);
                    slots.len() - 1
                }
            };
            slots[lane] = LaneSlot::Occupied {
                ends_at: task.end_or(now),
            };
            lanes[i] = lane;
        }
        trace!(func = func_name, lanes = slots.len(), "lanes assigned");
    }
    lanes
}
