use std::sync::Arc;

use axum::{Json, Router, extract::State, response::IntoResponse, routing::get};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::trace;

use crate::{error::ApiError, handler::ApiHandler};

/// HTTP API service builder.
pub struct HttpApi<H> {
    handler: Arc<H>,
}

impl<H> HttpApi<H>
where
    H: ApiHandler,
{
    /// Create new HTTP API with the given handler.
    pub fn new(handler: Arc<H>) -> Self {
        Self { handler }
    }

    /// Build axum router with mounted endpoints.
    ///
    /// Routes:
    /// - GET /api/v1/stream - Lane and short-task buckets of the latest pass
    /// - GET /api/v1/stream/functions - Function names in chart row order
    /// - GET /api/v1/health - Refresh loop counters
    pub fn router(self) -> Router {
        Router::new()
            .route("/api/v1/stream", get(get_stream::<H>))
            .route("/api/v1/stream/functions", get(get_functions::<H>))
            .route("/api/v1/health", get(get_health::<H>))
            .with_state(self.handler)
    }
}

// ============================================================================
// Response types
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
struct FunctionsResponse {
    functions: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct HealthResponse {
    passes: u64,
    failures: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_error: Option<String>,
    #[serde(
        default,
        with = "time::serde::rfc3339::option",
        skip_serializing_if = "Option::is_none"
    )]
    generated_at: Option<OffsetDateTime>,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/v1/stream
async fn get_stream<H>(State(handler): State<Arc<H>>) -> Result<impl IntoResponse, ApiError>
where
    H: ApiHandler,
{
    let stream = handler.stream().await?;
    trace!(rows = stream.len(), "serving task stream");

    Ok(Json(stream.as_ref().clone()))
}

/// GET /api/v1/stream/functions
async fn get_functions<H>(State(handler): State<Arc<H>>) -> Result<impl IntoResponse, ApiError>
where
    H: ApiHandler,
{
    let functions = handler.functions().await?;

    Ok(Json(FunctionsResponse { functions }))
}

/// GET /api/v1/health
async fn get_health<H>(State(handler): State<Arc<H>>) -> Result<impl IntoResponse, ApiError>
where
    H: ApiHandler,
{
    let stats = handler.stats().await?;
    let generated_at = handler.stream().await.ok().map(|s| s.generated_at);

    let response = HealthResponse {
        passes: stats.passes,
        failures: stats.failures,
        last_error: stats.last_error,
        generated_at,
    };

    Ok(Json(response))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StreamStateAdapter;
    use axum::{body::to_bytes, http::StatusCode, response::Response};
    use tasklane_core::StreamState;
    use tasklane_model::{LaneKey, TaskRecord, TaskStatus, TaskStream};

    fn at(secs: i64) -> OffsetDateTime {
        OffsetDateTime::from_unix_timestamp(secs).unwrap()
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn published_state() -> StreamState {
        let state = StreamState::new();
        let mut stream = TaskStream::new(at(1_000));
        let long = TaskRecord::new("t1", "mail.send", TaskStatus::Finished, at(0));
        let short = TaskRecord::new("t2", "cache.warm", TaskStatus::Failed, at(5));
        stream.lane_mut(LaneKey::new("mail.send", 0)).push(&long, at(60));
        stream.short.push(&short, at(5));
        state.publish(stream);
        state
    }

    #[tokio::test]
    async fn stream_is_unavailable_before_first_pass() {
        let handler = Arc::new(StreamStateAdapter::new(StreamState::new()));
        let response = get_stream(State(handler)).await.into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let body = body_json(response).await;
        assert_eq!(body["error"], "no refresh pass has completed yet");
    }

    #[tokio::test]
    async fn stream_body_carries_buckets() {
        let handler = Arc::new(StreamStateAdapter::new(published_state()));
        let response = get_stream(State(handler)).await.into_response();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["lanes"][0]["func_name"], "mail.send");
        assert_eq!(body["lanes"][0]["bucket"]["duration"][0], "0:01:00");
        assert_eq!(body["short"]["key"][0], "t2");
    }

    #[tokio::test]
    async fn functions_are_sorted_descending() {
        let handler = Arc::new(StreamStateAdapter::new(published_state()));
        let response = get_functions(State(handler)).await.into_response();

        let body = body_json(response).await;
        assert_eq!(body["functions"], serde_json::json!(["mail.send", "cache.warm"]));
    }

    #[tokio::test]
    async fn health_reports_last_error() {
        let state = published_state();
        state.record_failure("store unavailable: timeout");
        let handler = Arc::new(StreamStateAdapter::new(state));

        let body = body_json(get_health(State(handler)).await.into_response()).await;
        assert_eq!(body["passes"], 2);
        assert_eq!(body["failures"], 1);
        assert_eq!(body["last_error"], "store unavailable: timeout");
        assert_eq!(body["generated_at"], "1970-01-01T00:16:40Z");
    }
}
