//! Result-ingestion pipeline.
//!
//! Turns one inbound worker result message into a side-effected status
//! update plus a uniform [`ResultOutcome`]:
//! validate -> classify -> relocate artifact (completed only) -> apply the
//! transition -> report.
//!
//! Failure routing: malformed messages (`InvalidRequest`) and relocation
//! failures (`FileCopyFailed`) are hard errors returned as `Err` - the
//! transport must not acknowledge the message. Everything the orchestrator
//! rejects (unknown video, wrong owner, illegal transition) is returned as an
//! acknowledged outcome with `applied = false`, because redelivering the same
//! message cannot change a business verdict. The one special case is a
//! same-state rejection against the exact target status: that is a duplicate
//! delivery, reported as an acknowledged no-op success.

use std::sync::Arc;

use uuid::Uuid;

use clipdock_core::{
    AppError, ProcessingResultMessage, ProcessingStatus, ResultOutcome, TransitionPayload,
};
use clipdock_storage::{processed_artifact_key, Storage};

use crate::update_status::UpdateProcessingStatus;

#[derive(Clone)]
pub struct ResultIngestService {
    storage: Arc<dyn Storage>,
    update_status: UpdateProcessingStatus,
}

impl ResultIngestService {
    pub fn new(storage: Arc<dyn Storage>, update_status: UpdateProcessingStatus) -> Self {
        Self {
            storage,
            update_status,
        }
    }

    #[tracing::instrument(
        skip(self, message),
        fields(video_id = %message.video_id, worker_status = %message.status)
    )]
    pub async fn process(
        &self,
        message: &ProcessingResultMessage,
    ) -> Result<ResultOutcome, AppError> {
        // Fail fast, before any I/O.
        message.validate()?;
        let video_id = Uuid::parse_str(message.video_id.trim()).map_err(|_| {
            AppError::InvalidRequest(format!(
                "Result message carries a malformed video id: {}",
                message.video_id
            ))
        })?;

        let target = message.target_status();

        // Relocation happens before the transition so a Completed status is
        // never recorded with a dangling artifact reference. The target key is
        // deterministic, so a redelivered message overwrites the same object.
        let payload = if target == ProcessingStatus::Completed {
            let source = message
                .output_location
                .as_deref()
                .filter(|location| !location.trim().is_empty())
                .ok_or_else(|| {
                    AppError::InvalidRequest(
                        "Completed result message is missing the output location".to_string(),
                    )
                })?;
            let target_key =
                processed_artifact_key(message.video_id.trim(), message.original_filename());

            let relocated = self
                .storage
                .copy(source, &target_key)
                .await
                .map_err(|e| {
                    tracing::error!(
                        error = %e,
                        video_id = %video_id,
                        source = %source,
                        target_key = %target_key,
                        "Artifact relocation failed, aborting result ingestion"
                    );
                    AppError::FileCopyFailed(e.to_string())
                })?;

            TransitionPayload::Completed {
                processed_file_key: relocated,
                frame_count: message.frame_count,
                processing_duration_ms: message.processing_duration_ms,
            }
        } else {
            TransitionPayload::Failed {
                error_message: message.failure_reason(),
            }
        };

        match self
            .update_status
            .execute(video_id, Some(&message.user_id), target, payload)
            .await
        {
            Ok(response) => Ok(self.outcome(
                message,
                Some(response.new_status),
                true,
                None,
            )),
            Err(ref err) if err.is_same_state_transition() => {
                tracing::info!(
                    video_id = %video_id,
                    status = %target,
                    "Duplicate result delivery: video is already in target status"
                );
                Ok(self.outcome(
                    message,
                    Some(target),
                    false,
                    Some(format!("Video is already in target status {}", target)),
                ))
            }
            Err(err) => {
                tracing::warn!(
                    error = %err,
                    video_id = %video_id,
                    "Status update rejected, acknowledging result message"
                );
                Ok(self.outcome(message, None, false, Some(err.to_string())))
            }
        }
    }

    fn outcome(
        &self,
        message: &ProcessingResultMessage,
        final_status: Option<ProcessingStatus>,
        applied: bool,
        note: Option<String>,
    ) -> ResultOutcome {
        ResultOutcome {
            video_id: message.video_id.clone(),
            user_id: message.user_id.clone(),
            final_status,
            output_location: message.output_location.clone(),
            frame_count: message.frame_count,
            processing_duration_ms: message.processing_duration_ms,
            acknowledged: true,
            applied,
            note,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{
        request_in_status, result_message, InMemoryStorage, InMemoryVideoRequestRepository,
        RecordingDispatcher, RecordingNotifier,
    };

    struct Harness {
        repository: Arc<InMemoryVideoRequestRepository>,
        storage: Arc<InMemoryStorage>,
        service: ResultIngestService,
    }

    fn harness() -> Harness {
        let repository = Arc::new(InMemoryVideoRequestRepository::new());
        let storage = Arc::new(InMemoryStorage::new());
        let update_status = UpdateProcessingStatus::new(
            repository.clone(),
            Arc::new(RecordingNotifier::new()),
            Arc::new(RecordingDispatcher::new()),
        );
        let service = ResultIngestService::new(storage.clone(), update_status);
        Harness {
            repository,
            storage,
            service,
        }
    }

    #[tokio::test]
    async fn test_malformed_video_id_is_invalid_request() {
        let h = harness();
        let mut message = result_message(Uuid::new_v4(), "u1", "COMPLETED");
        message.video_id = "not-a-uuid".to_string();

        let err = h.service.process(&message).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidRequest(_)));
        assert_eq!(h.repository.find_call_count(), 0);
    }

    #[tokio::test]
    async fn test_completed_without_output_location_is_invalid_request() {
        let h = harness();
        let request = request_in_status("u1", ProcessingStatus::Processing);
        let mut message = result_message(request.id, "u1", "COMPLETED");
        h.repository.insert(request);
        message.output_location = None;

        let err = h.service.process(&message).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidRequest(_)));
        assert!(h.storage.recorded_copies().is_empty());
    }

    #[tokio::test]
    async fn test_failed_result_does_not_touch_storage() {
        let h = harness();
        let request = request_in_status("u1", ProcessingStatus::Processing);
        let video_id = request.id;
        h.repository.insert(request);
        let mut message = result_message(video_id, "u1", "FAILED");
        message.error_message = Some("decode error".to_string());

        let outcome = h.service.process(&message).await.unwrap();
        assert!(outcome.acknowledged);
        assert!(outcome.applied);
        assert_eq!(outcome.final_status, Some(ProcessingStatus::Failed));
        assert!(h.storage.recorded_copies().is_empty());
        assert_eq!(
            h.repository.get(video_id).unwrap().error_message.as_deref(),
            Some("decode error")
        );
    }

    #[tokio::test]
    async fn test_unknown_video_is_acknowledged_but_not_applied() {
        let h = harness();
        let message = result_message(Uuid::new_v4(), "u1", "FAILED");

        let outcome = h.service.process(&message).await.unwrap();
        assert!(outcome.acknowledged);
        assert!(!outcome.applied);
        assert_eq!(outcome.final_status, None);
        assert!(outcome.note.unwrap().contains("not found"));
    }

    #[tokio::test]
    async fn test_wrong_owner_is_acknowledged_but_not_applied() {
        let h = harness();
        let request = request_in_status("u1", ProcessingStatus::Processing);
        let video_id = request.id;
        h.repository.insert(request);
        let message = result_message(video_id, "someone-else", "FAILED");

        let outcome = h.service.process(&message).await.unwrap();
        assert!(outcome.acknowledged);
        assert!(!outcome.applied);
        assert_eq!(
            h.repository.get(video_id).unwrap().status,
            ProcessingStatus::Processing
        );
    }
}
