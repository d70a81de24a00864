//! Clipdock Core Library
//!
//! This crate provides the domain models, the processing-status state machine,
//! error types, configuration, and upload validation shared across all
//! Clipdock components.

pub mod config;
pub mod constants;
pub mod error;
pub mod models;
pub mod validation;

// Re-export commonly used types
pub use config::{Config, StorageBackend};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use models::{
    ProcessingResultMessage, ProcessingStatus, ResultOutcome, StatusUpdateResponse,
    TransitionPayload, VideoMetadata, VideoProcessingRequest, VideoRequestResponse,
};
pub use validation::{validate_video_upload, UploadValidationError};
