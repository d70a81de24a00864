//! Error types module
//!
//! This module provides the core error types used throughout the Clipdock
//! application. All errors are unified under the `AppError` enum, which covers
//! inbound-message validation, the status state machine, storage relocation,
//! and persistence failures.
//!
//! The `Database` variant wrapping `sqlx::Error` is gated behind the `sqlx`
//! feature; without it the variant carries the message as a plain string.

#[cfg(feature = "sqlx")]
use sqlx::Error as SqlxError;
use uuid::Uuid;

use crate::models::ProcessingStatus;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for rejected business operations
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata for error responses - defines how an error should be presented.
/// This trait allows errors to self-describe their HTTP response characteristics.
pub trait ErrorMetadata {
    /// HTTP status code to return
    fn http_status_code(&self) -> u16;

    /// Machine-readable error code (e.g., "DATABASE_ERROR")
    fn error_code(&self) -> &'static str;

    /// Whether this error is recoverable (can be retried)
    fn is_recoverable(&self) -> bool;

    /// Client-facing message (may differ from internal error message)
    fn client_message(&self) -> String;

    /// Whether details should be hidden in production
    fn is_sensitive(&self) -> bool;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Caller does not own the video. Presented identically to `NotFound` at
    /// the HTTP boundary so that ownership probes cannot confirm existence.
    #[error("Caller does not own video {video_id}")]
    NotOwner { video_id: Uuid },

    #[error("Illegal status transition: {from} -> {to}")]
    InvalidTransition {
        from: ProcessingStatus,
        to: ProcessingStatus,
    },

    #[error("Missing transition payload: {0}")]
    MissingPayload(String),

    #[error("File copy failed: {0}")]
    FileCopyFailed(String),

    /// The request exists but is not in a state that allows the operation
    /// (e.g. download before processing completed).
    #[error("Video not ready: current status is {status}")]
    NotReady { status: ProcessingStatus },

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[cfg(feature = "sqlx")]
    #[error("Database error: {0}")]
    Database(#[source] SqlxError),

    #[cfg(not(feature = "sqlx"))]
    #[error("Database error: {0}")]
    Database(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Internal error with source")]
    InternalWithSource {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

#[cfg(feature = "sqlx")]
impl From<SqlxError> for AppError {
    fn from(err: SqlxError) -> Self {
        AppError::Database(err)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::InternalWithSource {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::InvalidRequest(format!("JSON parsing error: {}", err))
    }
}

impl From<uuid::Error> for AppError {
    fn from(err: uuid::Error) -> Self {
        AppError::InvalidRequest(format!("UUID parsing error: {}", err))
    }
}

/// Static metadata for each variant: (http_status, error_code, recoverable, sensitive, log_level).
/// Reduces duplication in the ErrorMetadata impl; client_message stays per-variant for dynamic content.
fn app_error_static_metadata(err: &AppError) -> (u16, &'static str, bool, bool, LogLevel) {
    match err {
        AppError::InvalidRequest(_) => (400, "INVALID_REQUEST", false, false, LogLevel::Debug),
        AppError::NotFound(_) => (404, "NOT_FOUND", false, false, LogLevel::Debug),
        // Same surface as NotFound on purpose: existence must not leak to non-owners.
        AppError::NotOwner { .. } => (404, "NOT_FOUND", false, false, LogLevel::Warn),
        AppError::InvalidTransition { .. } => (409, "INVALID_TRANSITION", false, false, LogLevel::Warn),
        AppError::MissingPayload(_) => (400, "MISSING_PAYLOAD", false, false, LogLevel::Debug),
        AppError::FileCopyFailed(_) => (500, "FILE_COPY_FAILED", true, true, LogLevel::Error),
        AppError::NotReady { .. } => (409, "NOT_READY", true, false, LogLevel::Debug),
        AppError::Unauthorized(_) => (401, "UNAUTHORIZED", false, false, LogLevel::Debug),
        AppError::Database(_) => (500, "DATABASE_ERROR", true, true, LogLevel::Error),
        AppError::Storage(_) => (500, "STORAGE_ERROR", true, true, LogLevel::Error),
        AppError::Internal(_) => (500, "INTERNAL_ERROR", true, true, LogLevel::Error),
        AppError::InternalWithSource { .. } => (500, "INTERNAL_ERROR", true, true, LogLevel::Error),
    }
}

impl AppError {
    /// Get the error type name for detailed error responses
    pub fn error_type(&self) -> &'static str {
        match self {
            AppError::InvalidRequest(_) => "InvalidRequest",
            AppError::NotFound(_) => "NotFound",
            AppError::NotOwner { .. } => "NotOwner",
            AppError::InvalidTransition { .. } => "InvalidTransition",
            AppError::MissingPayload(_) => "MissingPayload",
            AppError::FileCopyFailed(_) => "FileCopyFailed",
            AppError::NotReady { .. } => "NotReady",
            AppError::Unauthorized(_) => "Unauthorized",
            AppError::Database(_) => "Database",
            AppError::Storage(_) => "Storage",
            AppError::Internal(_) => "Internal",
            AppError::InternalWithSource { .. } => "Internal",
        }
    }

    /// True when this is the same-state transition rejection the ingestion
    /// pipeline must treat as an idempotent redelivery rather than a failure.
    pub fn is_same_state_transition(&self) -> bool {
        matches!(self, AppError::InvalidTransition { from, to } if from == to)
    }

    /// Get detailed error information including the source chain
    pub fn detailed_message(&self) -> String {
        use std::error::Error;

        let mut details = self.to_string();

        let mut source = self.source();
        let mut depth = 0;
        while let Some(err) = source {
            depth += 1;
            if depth > 5 {
                details.push_str("\n  ... (truncated)");
                break;
            }
            details.push_str(&format!("\n  Caused by: {}", err));
            source = err.source();
        }

        details
    }
}

impl ErrorMetadata for AppError {
    fn http_status_code(&self) -> u16 {
        app_error_static_metadata(self).0
    }

    fn error_code(&self) -> &'static str {
        app_error_static_metadata(self).1
    }

    fn is_recoverable(&self) -> bool {
        app_error_static_metadata(self).2
    }

    fn is_sensitive(&self) -> bool {
        app_error_static_metadata(self).3
    }

    fn log_level(&self) -> LogLevel {
        app_error_static_metadata(self).4
    }

    fn client_message(&self) -> String {
        match self {
            AppError::InvalidRequest(msg) => msg.clone(),
            AppError::NotFound(msg) => msg.clone(),
            // Deliberately indistinguishable from NotFound.
            AppError::NotOwner { .. } => "Video not found".to_string(),
            AppError::InvalidTransition { from, to } => {
                format!("Cannot change status from {} to {}", from, to)
            }
            AppError::MissingPayload(msg) => msg.clone(),
            AppError::FileCopyFailed(_) => "Failed to store processed file".to_string(),
            AppError::NotReady { status } => {
                format!("Video is not ready: current status is {}", status)
            }
            AppError::Unauthorized(msg) => msg.clone(),
            AppError::Database(_) => "Failed to access database".to_string(),
            AppError::Storage(_) => "Failed to access storage".to_string(),
            AppError::Internal(_) => "Internal server error".to_string(),
            AppError::InternalWithSource { .. } => "Internal server error".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_owner_presents_as_not_found() {
        let err = AppError::NotOwner {
            video_id: Uuid::new_v4(),
        };
        assert_eq!(err.http_status_code(), 404);
        assert_eq!(err.error_code(), "NOT_FOUND");
        assert_eq!(err.client_message(), "Video not found");
    }

    #[test]
    fn test_invalid_transition_metadata() {
        let err = AppError::InvalidTransition {
            from: ProcessingStatus::Completed,
            to: ProcessingStatus::Processing,
        };
        assert_eq!(err.http_status_code(), 409);
        assert_eq!(err.error_code(), "INVALID_TRANSITION");
        assert!(!err.is_recoverable());
        assert_eq!(err.log_level(), LogLevel::Warn);
        assert!(err.client_message().contains("completed"));
        assert!(err.client_message().contains("processing"));
    }

    #[test]
    fn test_same_state_transition_detection() {
        let same = AppError::InvalidTransition {
            from: ProcessingStatus::Completed,
            to: ProcessingStatus::Completed,
        };
        assert!(same.is_same_state_transition());

        let different = AppError::InvalidTransition {
            from: ProcessingStatus::Completed,
            to: ProcessingStatus::Failed,
        };
        assert!(!different.is_same_state_transition());

        let other = AppError::NotFound("nope".to_string());
        assert!(!other.is_same_state_transition());
    }

    #[test]
    fn test_not_ready_is_non_exceptional() {
        let err = AppError::NotReady {
            status: ProcessingStatus::Processing,
        };
        assert_eq!(err.http_status_code(), 409);
        assert_eq!(err.error_code(), "NOT_READY");
        assert!(err.is_recoverable());
        assert_eq!(err.log_level(), LogLevel::Debug);
        assert!(!err.is_sensitive());
    }

    #[test]
    fn test_database_error_is_sensitive() {
        #[cfg(feature = "sqlx")]
        let err = AppError::from(sqlx::Error::PoolClosed);
        #[cfg(not(feature = "sqlx"))]
        let err = AppError::Database("pool closed".to_string());
        assert_eq!(err.http_status_code(), 500);
        assert_eq!(err.error_code(), "DATABASE_ERROR");
        assert!(err.is_recoverable());
        assert!(err.is_sensitive());
        assert_eq!(err.client_message(), "Failed to access database");
    }

    #[test]
    fn test_file_copy_failed_is_recoverable() {
        let err = AppError::FileCopyFailed("connection reset".to_string());
        assert_eq!(err.error_code(), "FILE_COPY_FAILED");
        assert!(err.is_recoverable());
        assert_eq!(err.log_level(), LogLevel::Error);
    }

    #[test]
    fn test_detailed_message_includes_source_chain() {
        let source = anyhow::anyhow!("root cause");
        let err = AppError::InternalWithSource {
            message: "wrapper".to_string(),
            source,
        };
        let details = err.detailed_message();
        assert!(details.contains("Caused by: root cause"));
    }
}
