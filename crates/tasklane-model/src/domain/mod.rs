mod ids;
pub use ids::{TaskId, WorkerId};

mod task_status;
pub use task_status::TaskStatus;

mod task_record;
pub use task_record::TaskRecord;

mod worker;
pub use worker::WorkerRecord;

mod seed;
pub use seed::{HistorySeed, RunningEntry};

/// Index of a lane within one function group. Lanes are numbered from 0.
pub type Lane = usize;
