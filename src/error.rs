use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::db::StoreError;
use crate::media::MediaError;
use crate::routes::ErrorResponse;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("Authorization required")]
    Unauthorized,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Admin role required")]
    Forbidden,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error(transparent)]
    Upload(#[from] MediaError),

    #[error(transparent)]
    Database(#[from] StoreError),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized | ApiError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Upload(e) if e.is_rejection() => StatusCode::BAD_REQUEST,
            ApiError::Upload(_) => StatusCode::BAD_GATEWAY,
            ApiError::Database(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show to clients; storage details stay in the logs.
    fn public_message(&self) -> String {
        match self {
            ApiError::Upload(e) if !e.is_rejection() => "Image upload failed".to_string(),
            ApiError::Database(_) => "Database error".to_string(),
            ApiError::Internal(_) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            tracing::error!(status = %status, error = %self, "request failed");
        } else {
            tracing::debug!(status = %status, error = %self, "request rejected");
        }

        let body = ErrorResponse {
            success: false,
            error: status
                .canonical_reason()
                .unwrap_or("Error")
                .to_string(),
            message: Some(self.public_message()),
        };

        (status, Json(body)).into_response()
    }
}
