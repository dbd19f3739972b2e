use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("no refresh pass has completed yet")]
    NotReady,
}

#[cfg(feature = "http")]
impl axum::response::IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        use axum::http::StatusCode;

        let status = match self {
            ApiError::NotReady => StatusCode::SERVICE_UNAVAILABLE,
        };
        let body = serde_json::json!({ "error": self.to_string() });
        (status, axum::Json(body)).into_response()
    }
}
