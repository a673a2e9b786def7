use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("email is required.")]
    MissingEmail,

    #[error("You did not provide any fields to update")]
    NoFieldsToUpdate,

    #[error("invalid form data: {0}")]
    InvalidForm(String),

    #[error("user not found")]
    NotFound,

    #[error("request timed out")]
    Timeout,

    /// Carries the driver's own message to the caller.
    #[error("{0}")]
    Storage(#[from] anyhow::Error),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::MissingEmail
            | ApiError::NoFieldsToUpdate
            | ApiError::InvalidForm(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Timeout => StatusCode::REQUEST_TIMEOUT,
            ApiError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(json!({
            "ok": false,
            "message": self.to_string(),
        }));

        (status, body).into_response()
    }
}
