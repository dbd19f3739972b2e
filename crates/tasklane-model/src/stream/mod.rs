mod bucket;
pub use bucket::{DisplayBucket, format_duration};

mod serde_ext;

use std::{collections::BTreeMap, collections::BTreeSet, fmt};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::Lane;

/// Address of a lane bucket: function group first, then lane index.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LaneKey {
    pub func_name: String,
    pub lane: Lane,
}

impl LaneKey {
    pub fn new(func_name: impl Into<String>, lane: Lane) -> Self {
        Self {
            func_name: func_name.into(),
            lane,
        }
    }
}

impl fmt::Display for LaneKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.func_name, self.lane)
    }
}

/// Output of one reconstruction pass.
///
/// Long tasks live in one bucket per function/lane pair; all short tasks share `short`.
/// A stream is rebuilt wholesale on every refresh and never patched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskStream {
    /// The `now` the pass was computed for.
    #[serde(with = "time::serde::rfc3339")]
    pub generated_at: OffsetDateTime,
    #[serde(with = "serde_ext::lane_entries")]
    pub lanes: BTreeMap<LaneKey, DisplayBucket>,
    pub short: DisplayBucket,
}

impl TaskStream {
    pub fn new(generated_at: OffsetDateTime) -> Self {
        Self {
            generated_at,
            lanes: BTreeMap::new(),
            short: DisplayBucket::new(),
        }
    }

    /// Bucket for `key`, created empty on first use.
    pub fn lane_mut(&mut self, key: LaneKey) -> &mut DisplayBucket {
        self.lanes.entry(key).or_default()
    }

    /// Lane buckets of one function, in lane order.
    pub fn lanes_for<'a>(
        &'a self,
        func_name: &'a str,
    ) -> impl Iterator<Item = (Lane, &'a DisplayBucket)> + 'a {
        self.lanes
            .iter()
            .filter(move |(key, _)| key.func_name == func_name)
            .map(|(key, bucket)| (key.lane, bucket))
    }

    /// Number of lane buckets holding tasks of `func_name`.
    pub fn lane_count(&self, func_name: &str) -> usize {
        self.lanes_for(func_name).count()
    }

    /// Function names present in any bucket, sorted descending.
    ///
    /// This is the category order of a chart's y axis, top row first.
    pub fn functions(&self) -> Vec<String> {
        let names: BTreeSet<&str> = self
            .lanes
            .values()
            .chain(std::iter::once(&self.short))
            .flat_map(|bucket| bucket.task_func.iter().map(String::as_str))
            .collect();
        names.into_iter().rev().map(str::to_string).collect()
    }

    /// Total number of rows across all buckets.
    pub fn len(&self) -> usize {
        self.lanes.values().map(DisplayBucket::len).sum::<usize>() + self.short.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
