use std::time::Duration;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::errors::ApiError;

/// Fails a request that runs longer than `timeout` with the JSON error
/// envelope. The handler future is dropped, which cancels any storage call it
/// was waiting on.
pub async fn request_timeout(
    State(timeout): State<Duration>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    match tokio::time::timeout(timeout, next.run(request)).await {
        Ok(response) => Ok(response),
        Err(_) => {
            tracing::warn!(timeout_ms = timeout.as_millis() as u64, "Request timed out");
            Err(ApiError::Timeout)
        }
    }
}
