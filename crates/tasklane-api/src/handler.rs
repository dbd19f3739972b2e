use std::sync::Arc;

use async_trait::async_trait;
use tasklane_core::RefreshStats;
use tasklane_model::TaskStream;

use crate::error::ApiError;

/// Read side of the task stream feed.
///
/// This trait abstracts where streams come from, allowing users to:
/// - Use the provided `StreamStateAdapter` over the refresh loop's state
/// - Implement custom handlers (filtering by function, access control, etc.)
#[async_trait]
pub trait ApiHandler: Send + Sync + 'static {
    /// Stream computed by the most recent successful refresh.
    async fn stream(&self) -> Result<Arc<TaskStream>, ApiError>;

    /// Function names of the current stream, in chart row order.
    async fn functions(&self) -> Result<Vec<String>, ApiError>;

    /// Refresh loop counters.
    async fn stats(&self) -> Result<RefreshStats, ApiError>;
}
