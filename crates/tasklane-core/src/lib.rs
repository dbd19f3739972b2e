pub mod error;
pub use error::{CoreError, StoreError};

pub mod store;
pub use store::{HistoryBackend, MemoryStore, Registry};

pub mod fetch;
pub use fetch::{DedupPolicy, FetchConfig, MissingPolicy, SnapshotFetcher};

pub mod lanes;
pub use lanes::LaneReconstructor;

pub mod refresh;
pub use refresh::{RefreshConfig, Refresher};

mod state;
pub use state::{RefreshStats, StreamState};
