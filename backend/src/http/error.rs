//! HTTP error handling and response types.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::db::RepositoryError;
use crate::error::TrackingError;

/// API error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

/// Application error type for HTTP handlers.
#[derive(Debug)]
pub enum AppError {
    NotFound(String),
    /// Engine failure, mapped by kind.
    Tracking(TrackingError),
}

impl AppError {
    fn status_and_body(self) -> (StatusCode, ApiError) {
        match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, ApiError::new("NOT_FOUND", msg)),
            AppError::Tracking(err) => {
                let msg = err.to_string();
                match err {
                    TrackingError::Validation(_) => {
                        (StatusCode::BAD_REQUEST, ApiError::new("VALIDATION_ERROR", msg))
                    }
                    TrackingError::InvalidInterval(_) => {
                        (StatusCode::BAD_REQUEST, ApiError::new("INVALID_INTERVAL", msg))
                    }
                    TrackingError::TimestampParse { input, .. } => (
                        StatusCode::BAD_REQUEST,
                        ApiError::new("INVALID_TIMESTAMP", msg).with_details(input),
                    ),
                    TrackingError::Oracle { object_id, .. } => (
                        StatusCode::UNPROCESSABLE_ENTITY,
                        ApiError::new("ORACLE_ERROR", msg).with_details(object_id),
                    ),
                    TrackingError::Timeout(_) => {
                        (StatusCode::GATEWAY_TIMEOUT, ApiError::new("TIMEOUT", msg))
                    }
                    TrackingError::Distribution(e) => (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        ApiError::new("DISTRIBUTION_ERROR", msg).with_details(e.context().to_string()),
                    ),
                    TrackingError::Internal(_) => (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        ApiError::new("INTERNAL_ERROR", msg),
                    ),
                }
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error) = self.status_and_body();
        if status.is_server_error() {
            tracing::error!(code = %error.code, message = %error.message, "request failed");
        }
        (status, Json(error)).into_response()
    }
}

impl From<TrackingError> for AppError {
    fn from(err: TrackingError) -> Self {
        AppError::Tracking(err)
    }
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        AppError::Tracking(TrackingError::Distribution(err))
    }
}
