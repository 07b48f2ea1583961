use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::storage::StorageError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub detail: String,
}

/// Failures a gateway operation reports to its caller.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Bucket '{0}' already exists.")]
    BucketExists(String),

    #[error("Bucket '{0}' does not exist.")]
    BucketMissing(String),

    #[error("File '{file}' does not exist in bucket '{bucket}'.")]
    FileMissing { bucket: String, file: String },

    #[error("{0}")]
    InvalidRequest(String),

    /// Anything that went wrong while receiving or storing an upload
    #[error("{0}")]
    Upload(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            // Conflicts are reported as 404 too; existing clients depend on it
            ApiError::BucketExists(_) => StatusCode::NOT_FOUND,
            ApiError::BucketMissing(_) | ApiError::FileMissing { .. } => StatusCode::NOT_FOUND,
            ApiError::InvalidRequest(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Upload(_) | ApiError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn category(&self) -> &'static str {
        match self {
            ApiError::BucketExists(_) | ApiError::BucketMissing(_) | ApiError::FileMissing { .. } => {
                "Not found"
            }
            ApiError::InvalidRequest(_) => "Invalid request",
            ApiError::Upload(_) => "Upload failed",
            ApiError::Storage(_) => "Storage error",
        }
    }

    /// Wrap any failure on the upload path, keeping only its message.
    pub(crate) fn upload(err: impl ToString) -> Self {
        ApiError::Upload(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            warn!(%status, error = %self, "request failed");
        }

        let body = ErrorResponse {
            error: self.category().to_string(),
            detail: self.to_string(),
        };

        (status, Json(body)).into_response()
    }
}
