use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;

use super::status::ProcessingStatus;

/// Descriptive attributes of the uploaded file, captured at acceptance time
/// and immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoMetadata {
    pub original_filename: String,
    pub file_size: i64,
    pub format: String,
    pub content_type: String,
    pub storage_key: String,
}

/// Extra data required by a status transition.
///
/// `Completed` carries the processed-file reference (required, non-empty) plus
/// the worker-reported frame count and duration; `Failed` carries the error
/// message (required, non-empty). Other targets take `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionPayload {
    None,
    Completed {
        processed_file_key: String,
        frame_count: Option<i64>,
        processing_duration_ms: Option<i64>,
    },
    Failed {
        error_message: String,
    },
}

/// Aggregate root tracking one uploaded video through its processing
/// lifecycle.
///
/// Invariants, enforced by [`VideoProcessingRequest::transition`]:
/// - status changes follow the legal-transition table;
/// - `processed_file_key` is set if and only if the status is `Completed`;
/// - `error_message` is set only in `Failed`;
/// - `updated_at` is refreshed on every transition, `created_at` never is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoProcessingRequest {
    pub id: Uuid,
    pub user_id: String,
    pub metadata: VideoMetadata,
    pub status: ProcessingStatus,
    pub error_message: Option<String>,
    pub processed_file_key: Option<String>,
    pub frame_count: Option<i64>,
    pub processing_duration_ms: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl VideoProcessingRequest {
    /// Create a new request in `Pending`, the only entry point of the
    /// lifecycle.
    pub fn new(user_id: impl Into<String>, metadata: VideoMetadata) -> Self {
        Self::with_id(Uuid::new_v4(), user_id, metadata)
    }

    /// Create a new request with a caller-chosen id, used when the id must be
    /// known before construction (e.g. to derive the upload storage key).
    pub fn with_id(id: Uuid, user_id: impl Into<String>, metadata: VideoMetadata) -> Self {
        let now = Utc::now();
        Self {
            id,
            user_id: user_id.into(),
            metadata,
            status: ProcessingStatus::Pending,
            error_message: None,
            processed_file_key: None,
            frame_count: None,
            processing_duration_ms: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply a status transition, returning the updated aggregate.
    ///
    /// Pure state computation: no I/O, and `self` is left untouched when the
    /// transition is rejected. Legality is checked first, then payload
    /// completeness for the terminal targets.
    pub fn transition(
        &self,
        target: ProcessingStatus,
        payload: TransitionPayload,
    ) -> Result<VideoProcessingRequest, AppError> {
        if !self.status.can_transition_to(target) {
            return Err(AppError::InvalidTransition {
                from: self.status,
                to: target,
            });
        }

        let mut next = self.clone();
        next.status = target;
        next.updated_at = Utc::now();

        match target {
            ProcessingStatus::Completed => match payload {
                TransitionPayload::Completed {
                    processed_file_key,
                    frame_count,
                    processing_duration_ms,
                } if !processed_file_key.trim().is_empty() => {
                    next.processed_file_key = Some(processed_file_key);
                    next.frame_count = frame_count;
                    next.processing_duration_ms = processing_duration_ms;
                    next.error_message = None;
                }
                _ => {
                    return Err(AppError::MissingPayload(
                        "A non-empty processed file reference is required to complete processing"
                            .to_string(),
                    ))
                }
            },
            ProcessingStatus::Failed => match payload {
                TransitionPayload::Failed { error_message }
                    if !error_message.trim().is_empty() =>
                {
                    next.error_message = Some(error_message);
                    next.processed_file_key = None;
                }
                _ => {
                    return Err(AppError::MissingPayload(
                        "A non-empty error message is required to fail processing".to_string(),
                    ))
                }
            },
            ProcessingStatus::Pending | ProcessingStatus::Processing => {}
        }

        Ok(next)
    }

    /// A request is downloadable once it completed and the processed artifact
    /// reference is recorded.
    pub fn is_downloadable(&self) -> bool {
        self.status == ProcessingStatus::Completed && self.processed_file_key.is_some()
    }
}

/// API representation of a processing request.
#[derive(Debug, Serialize)]
pub struct VideoRequestResponse {
    pub id: Uuid,
    pub filename: String,
    pub file_size: i64,
    pub format: String,
    pub content_type: String,
    pub status: ProcessingStatus,
    pub status_description: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub downloadable: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<VideoProcessingRequest> for VideoRequestResponse {
    fn from(request: VideoProcessingRequest) -> Self {
        let downloadable = request.is_downloadable();
        VideoRequestResponse {
            id: request.id,
            filename: request.metadata.original_filename,
            file_size: request.metadata.file_size,
            format: request.metadata.format,
            content_type: request.metadata.content_type,
            status: request.status,
            status_description: request.status.description(),
            error_message: request.error_message,
            downloadable,
            created_at: request.created_at,
            updated_at: request.updated_at,
        }
    }
}
