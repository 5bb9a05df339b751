use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Multipart error: {0}")]
    Multipart(#[from] axum::extract::multipart::MultipartError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            // Required-field failures are reported as a plain-text 400 before
            // any PDF bytes are produced.
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg).into_response(),
            AppError::Multipart(err) => (
                StatusCode::BAD_REQUEST,
                format!("Malformed multipart request: {err}"),
            )
                .into_response(),
            AppError::Internal(err) => {
                tracing::error!("Internal error: {err:?}");
                let body = Json(json!({
                    "error": {
                        "code": "INTERNAL_ERROR",
                        "message": "An internal server error occurred"
                    }
                }));
                (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
            }
        }
    }
}
