use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use crate::error::AppError;

use super::status::ProcessingStatus;

/// Metadata key under which the worker reports the original upload filename.
pub const METADATA_ORIGINAL_FILENAME: &str = "originalFileName";

/// Result message delivered by the external processing worker.
///
/// The worker speaks its own status vocabulary (`COMPLETED`, `FAILED`,
/// `ERROR`, or anything else); [`ProcessingResultMessage::target_status`]
/// maps it onto the internal status set. Messages are consumed once per
/// ingestion call and never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingResultMessage {
    pub video_id: String,
    pub user_id: String,
    pub status: String,
    #[serde(default)]
    pub output_location: Option<String>,
    #[serde(default)]
    pub frame_count: Option<i64>,
    #[serde(default)]
    pub processing_duration_ms: Option<i64>,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

fn is_blank(s: &str) -> bool {
    s.trim().is_empty()
}

impl ProcessingResultMessage {
    /// Structural validation, performed before any I/O.
    pub fn validate(&self) -> Result<(), AppError> {
        if is_blank(&self.video_id) {
            return Err(AppError::InvalidRequest(
                "Result message is missing the video id".to_string(),
            ));
        }
        if is_blank(&self.user_id) {
            return Err(AppError::InvalidRequest(
                "Result message is missing the user id".to_string(),
            ));
        }
        if is_blank(&self.status) {
            return Err(AppError::InvalidRequest(
                "Result message is missing the status".to_string(),
            ));
        }
        Ok(())
    }

    /// Map the worker status vocabulary onto the internal status set.
    ///
    /// `COMPLETED` maps to `Completed`; `FAILED` and `ERROR` map to `Failed`.
    /// Anything else is treated conservatively as a failure and logged - an
    /// unrecognized worker state must never be silently ignored.
    pub fn target_status(&self) -> ProcessingStatus {
        match self.status.to_ascii_uppercase().as_str() {
            "COMPLETED" => ProcessingStatus::Completed,
            "FAILED" | "ERROR" => ProcessingStatus::Failed,
            other => {
                tracing::warn!(
                    video_id = %self.video_id,
                    worker_status = other,
                    "Unrecognized worker status, treating as failure"
                );
                ProcessingStatus::Failed
            }
        }
    }

    /// Original filename reported by the worker, if any.
    pub fn original_filename(&self) -> Option<&str> {
        self.metadata
            .get(METADATA_ORIGINAL_FILENAME)
            .map(String::as_str)
            .filter(|name| !is_blank(name))
    }

    /// Error text to record when the result marks the video failed.
    ///
    /// Falls back to a synthesized message embedding the raw worker status so
    /// that unrecognized states remain visible on the aggregate.
    pub fn failure_reason(&self) -> String {
        match self.error_message.as_deref().filter(|msg| !is_blank(msg)) {
            Some(msg) => msg.to_string(),
            None => format!(
                "Video processing worker reported status '{}'",
                self.status
            ),
        }
    }
}

/// Uniform outcome of one ingestion call.
///
/// `acknowledged` is the transport verdict: the inbound message may be
/// removed from the queue. `applied` is the business verdict: the status
/// transition was actually written. A duplicate delivery is acknowledged but
/// not applied.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultOutcome {
    pub video_id: String,
    pub user_id: String,
    pub final_status: Option<ProcessingStatus>,
    pub output_location: Option<String>,
    pub frame_count: Option<i64>,
    pub processing_duration_ms: Option<i64>,
    pub acknowledged: bool,
    pub applied: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Response of the status-update orchestrator.
#[derive(Debug, Clone, Serialize)]
pub struct StatusUpdateResponse {
    pub video_id: Uuid,
    pub previous_status: ProcessingStatus,
    pub new_status: ProcessingStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processed_file_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(status: &str) -> ProcessingResultMessage {
        ProcessingResultMessage {
            video_id: "v1".to_string(),
            user_id: "u1".to_string(),
            status: status.to_string(),
            output_location: Some("raw/v1/out.zip".to_string()),
            frame_count: Some(42),
            processing_duration_ms: Some(1_000),
            error_message: None,
            metadata: HashMap::new(),
        }
    }

    #[test]
    fn test_validate_accepts_complete_message() {
        assert!(message("COMPLETED").validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_blank_fields() {
        let mut msg = message("COMPLETED");
        msg.video_id = " ".to_string();
        assert!(matches!(
            msg.validate().unwrap_err(),
            AppError::InvalidRequest(_)
        ));

        let mut msg = message("COMPLETED");
        msg.user_id = String::new();
        assert!(matches!(
            msg.validate().unwrap_err(),
            AppError::InvalidRequest(_)
        ));

        let mut msg = message("COMPLETED");
        msg.status = String::new();
        assert!(matches!(
            msg.validate().unwrap_err(),
            AppError::InvalidRequest(_)
        ));
    }

    #[test]
    fn test_target_status_mapping() {
        assert_eq!(
            message("COMPLETED").target_status(),
            ProcessingStatus::Completed
        );
        assert_eq!(
            message("completed").target_status(),
            ProcessingStatus::Completed
        );
        assert_eq!(message("FAILED").target_status(), ProcessingStatus::Failed);
        assert_eq!(message("ERROR").target_status(), ProcessingStatus::Failed);
        assert_eq!(message("error").target_status(), ProcessingStatus::Failed);
    }

    #[test]
    fn test_unrecognized_status_maps_to_failed() {
        assert_eq!(
            message("WEIRDSTATE").target_status(),
            ProcessingStatus::Failed
        );
    }

    #[test]
    fn test_original_filename_from_metadata() {
        let mut msg = message("COMPLETED");
        assert_eq!(msg.original_filename(), None);

        msg.metadata
            .insert(METADATA_ORIGINAL_FILENAME.to_string(), "clip.mp4".to_string());
        assert_eq!(msg.original_filename(), Some("clip.mp4"));

        msg.metadata
            .insert(METADATA_ORIGINAL_FILENAME.to_string(), "   ".to_string());
        assert_eq!(msg.original_filename(), None);
    }

    #[test]
    fn test_failure_reason_prefers_worker_message() {
        let mut msg = message("FAILED");
        msg.error_message = Some("out of memory".to_string());
        assert_eq!(msg.failure_reason(), "out of memory");
    }

    #[test]
    fn test_failure_reason_embeds_raw_status_when_missing() {
        let msg = message("WEIRDSTATE");
        assert!(msg.failure_reason().contains("WEIRDSTATE"));
    }

    #[test]
    fn test_wire_format_is_camel_case() {
        let json = r#"{
            "videoId": "v1",
            "userId": "u1",
            "status": "COMPLETED",
            "outputLocation": "raw/v1/out.zip",
            "frameCount": 12,
            "processingDurationMs": 900,
            "metadata": {"originalFileName": "clip.mp4"}
        }"#;
        let msg: ProcessingResultMessage = serde_json::from_str(json).unwrap();
        assert_eq!(msg.video_id, "v1");
        assert_eq!(msg.output_location.as_deref(), Some("raw/v1/out.zip"));
        assert_eq!(msg.frame_count, Some(12));
        assert_eq!(msg.original_filename(), Some("clip.mp4"));
    }

    #[test]
    fn test_optional_fields_default() {
        let json = r#"{"videoId": "v1", "userId": "u1", "status": "FAILED"}"#;
        let msg: ProcessingResultMessage = serde_json::from_str(json).unwrap();
        assert!(msg.output_location.is_none());
        assert!(msg.error_message.is_none());
        assert!(msg.metadata.is_empty());
    }
}
