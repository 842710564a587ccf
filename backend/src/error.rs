//! Error taxonomy for the sampling, visibility and distribution engine.

use thiserror::Error;

use crate::db::repository::RepositoryError;

/// Result type for engine operations.
pub type TrackingResult<T> = Result<T, TrackingError>;

/// Errors raised while validating, propagating or distributing tracking data.
#[derive(Error, Debug)]
#[allow(clippy::result_large_err)]
pub enum TrackingError {
    /// Missing or malformed request fields, rejected before any computation.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Non-positive sampling interval, rejected before sampling starts.
    #[error("Invalid interval: interval must be positive, got {0} seconds")]
    InvalidInterval(i64),

    /// Malformed ISO-8601 input.
    #[error("Invalid timestamp '{input}': {reason}")]
    TimestampParse { input: String, reason: String },

    /// The orbital oracle could not resolve an element set at an instant.
    #[error("Oracle error for object {object_id}: {message}")]
    Oracle { object_id: String, message: String },

    /// Persistence or publish failure in the distribution layer.
    #[error("Distribution error: {0}")]
    Distribution(#[from] RepositoryError),

    /// Work exceeded its configured deadline.
    #[error("Timed out after {0} seconds")]
    Timeout(u64),

    /// A background task panicked or was cancelled.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl TrackingError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn oracle(object_id: impl Into<String>, message: impl ToString) -> Self {
        Self::Oracle {
            object_id: object_id.into(),
            message: message.to_string(),
        }
    }

    /// Whether the error was caused by the caller's input.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::Validation(_) | Self::InvalidInterval(_) | Self::TimestampParse { .. }
        )
    }
}
