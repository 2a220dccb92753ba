use crate::models::StoreError;
use crate::storage::StorageError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    NotFound(#[from] StoreError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("Template error: {0}")]
    Render(#[from] liquid::Error),
    #[error("{0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::NotFound(err) => {
                tracing::info!(error = ?err, "not found");
                (StatusCode::NOT_FOUND, format!("404 Not Found: {}", err)).into_response()
            }
            other => {
                tracing::error!(error = %other, "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "500 Internal Server Error").into_response()
            }
        }
    }
}
