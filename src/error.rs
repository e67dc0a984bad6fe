use axum::{
    extract::rejection::PathRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::db::StoreError;

/// Failure of a single feed; never leaves the aggregator.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("feed parsing error: {0}")]
    Parse(#[from] feed_rs::parser::ParseFeedError),
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),
    #[error("Unauthorized: Invalid password")]
    Unauthorized,
    #[error("Article not found")]
    NotFound,
    #[error("Only image files are allowed (jpeg, jpg, png, gif, webp)")]
    UnsupportedMediaType,
    #[error("File too large (max {limit} bytes)")]
    PayloadTooLarge { limit: usize },
    #[error("storage error: {0}")]
    Storage(#[source] sqlx::Error),
    #[error("upload write failed: {0}")]
    Upload(#[from] std::io::Error),
    #[error("news aggregation failed: {0}")]
    Aggregation(#[from] tokio::task::JoinError),
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Validation(msg) => ApiError::Validation(msg.to_string()),
            StoreError::Database(e) => ApiError::Storage(e),
        }
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_)
            | ApiError::UnsupportedMediaType
            | ApiError::PayloadTooLarge { .. } => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Storage(_) | ApiError::Upload(_) | ApiError::Aggregation(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Message shown to the caller. Internal failures only get a generic line.
    fn public_message(&self) -> String {
        match self {
            ApiError::Storage(_) => "Failed to access articles".to_string(),
            ApiError::Upload(_) => "Failed to upload image".to_string(),
            ApiError::Aggregation(_) => "Failed to fetch news".to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, "request failed");
        }
        (status, Json(json!({ "error": self.public_message() }))).into_response()
    }
}
