//! Status-update orchestrator.
//!
//! Applies one validated transition to one aggregate: load, ownership check,
//! legality and payload validation (both inside the aggregate's transition
//! operation), persist, best-effort notification, and the fire-and-forget
//! processing dispatch when a request enters `Processing`.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use clipdock_core::{
    AppError, ProcessingStatus, StatusUpdateResponse, TransitionPayload, VideoProcessingRequest,
};
use clipdock_db::VideoRequestRepository;

use crate::dispatch::{ProcessingDispatcher, ProcessingJob};
use crate::notify::{NotificationPayload, Notifier, StatusEvent};

#[derive(Clone)]
pub struct UpdateProcessingStatus {
    repository: Arc<dyn VideoRequestRepository>,
    notifier: Arc<dyn Notifier>,
    dispatcher: Arc<dyn ProcessingDispatcher>,
}

impl UpdateProcessingStatus {
    pub fn new(
        repository: Arc<dyn VideoRequestRepository>,
        notifier: Arc<dyn Notifier>,
        dispatcher: Arc<dyn ProcessingDispatcher>,
    ) -> Self {
        Self {
            repository,
            notifier,
            dispatcher,
        }
    }

    /// Apply one status transition.
    ///
    /// When `caller_user_id` is supplied it must match the aggregate's owner;
    /// a mismatch is rejected with [`AppError::NotOwner`], which the HTTP
    /// boundary renders identically to not-found. Each call loads a fresh
    /// snapshot; a concurrent writer that already advanced the status makes
    /// this call fail the legality check instead of corrupting state.
    #[tracing::instrument(skip(self, payload), fields(video_id = %video_id, target = %target))]
    pub async fn execute(
        &self,
        video_id: Uuid,
        caller_user_id: Option<&str>,
        target: ProcessingStatus,
        payload: TransitionPayload,
    ) -> Result<StatusUpdateResponse, AppError> {
        let request = self
            .repository
            .find(video_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Video {} not found", video_id)))?;

        if let Some(caller) = caller_user_id {
            if caller != request.user_id {
                tracing::warn!(
                    video_id = %video_id,
                    "Status update rejected: caller does not own the video"
                );
                return Err(AppError::NotOwner { video_id });
            }
        }

        let previous = request.status;
        let updated = request.transition(target, payload)?;
        let saved = self.repository.save(&updated).await?;

        tracing::info!(
            video_id = %video_id,
            previous_status = %previous,
            new_status = %saved.status,
            "Processing status updated"
        );

        // Best-effort: a failed notification must not fail the update.
        if let Some(event) = StatusEvent::for_status(saved.status) {
            let notification = NotificationPayload {
                video_id: saved.id,
                status: saved.status,
                status_description: saved.status.description(),
                error_message: saved.error_message.clone(),
                occurred_at: Utc::now(),
            };
            if let Err(e) = self
                .notifier
                .notify(&saved.user_id, event, &notification)
                .await
            {
                tracing::warn!(
                    error = %e,
                    video_id = %video_id,
                    event = %event,
                    "Failed to deliver status notification"
                );
            }
        }

        // The worker's eventual COMPLETED/FAILED result re-enters this
        // orchestrator as an independent invocation via the result inbox.
        if saved.status == ProcessingStatus::Processing {
            self.spawn_dispatch(&saved);
        }

        Ok(StatusUpdateResponse {
            video_id,
            previous_status: previous,
            new_status: saved.status,
            processed_file_key: saved.processed_file_key,
            error_message: saved.error_message,
            updated_at: saved.updated_at,
        })
    }

    /// Hand the processing job to the external worker without blocking the
    /// caller on the worker's availability.
    fn spawn_dispatch(&self, request: &VideoProcessingRequest) {
        let dispatcher = self.dispatcher.clone();
        let job = ProcessingJob {
            video_id: request.id,
            user_id: request.user_id.clone(),
            source_location: request.metadata.storage_key.clone(),
            original_filename: request.metadata.original_filename.clone(),
        };
        tokio::spawn(async move {
            if let Err(e) = dispatcher.dispatch(&job).await {
                tracing::error!(
                    error = %e,
                    video_id = %job.video_id,
                    "Failed to dispatch processing job"
                );
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{
        request_in_status, InMemoryVideoRequestRepository, RecordingDispatcher, RecordingNotifier,
    };
    use std::sync::atomic::Ordering;

    struct Harness {
        repository: Arc<InMemoryVideoRequestRepository>,
        notifier: Arc<RecordingNotifier>,
        dispatcher: Arc<RecordingDispatcher>,
        service: UpdateProcessingStatus,
    }

    fn harness() -> Harness {
        let repository = Arc::new(InMemoryVideoRequestRepository::new());
        let notifier = Arc::new(RecordingNotifier::new());
        let dispatcher = Arc::new(RecordingDispatcher::new());
        let service = UpdateProcessingStatus::new(
            repository.clone(),
            notifier.clone(),
            dispatcher.clone(),
        );
        Harness {
            repository,
            notifier,
            dispatcher,
            service,
        }
    }

    /// Give spawned fire-and-forget tasks a chance to run on the
    /// current-thread test runtime.
    async fn settle() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn test_unknown_video_is_not_found() {
        let h = harness();
        let err = h
            .service
            .execute(
                Uuid::new_v4(),
                None,
                ProcessingStatus::Processing,
                TransitionPayload::None,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_ownership_mismatch_is_rejected_without_saving() {
        let h = harness();
        let request = request_in_status("u1", ProcessingStatus::Processing);
        let video_id = request.id;
        h.repository.insert(request);

        let err = h
            .service
            .execute(
                video_id,
                Some("intruder"),
                ProcessingStatus::Failed,
                TransitionPayload::Failed {
                    error_message: "boom".to_string(),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotOwner { .. }));
        assert_eq!(h.repository.save_call_count(), 0);
        assert_eq!(
            h.repository.get(video_id).unwrap().status,
            ProcessingStatus::Processing
        );
    }

    #[tokio::test]
    async fn test_matching_owner_is_accepted() {
        let h = harness();
        let request = request_in_status("u1", ProcessingStatus::Processing);
        let video_id = request.id;
        h.repository.insert(request);

        let response = h
            .service
            .execute(
                video_id,
                Some("u1"),
                ProcessingStatus::Completed,
                TransitionPayload::Completed {
                    processed_file_key: "processed-videos/v1/clip_frames.zip".to_string(),
                    frame_count: Some(10),
                    processing_duration_ms: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(response.previous_status, ProcessingStatus::Processing);
        assert_eq!(response.new_status, ProcessingStatus::Completed);
    }

    #[tokio::test]
    async fn test_illegal_transition_is_not_persisted() {
        let h = harness();
        let request = request_in_status("u1", ProcessingStatus::Completed);
        let video_id = request.id;
        h.repository.insert(request.clone());

        let err = h
            .service
            .execute(
                video_id,
                None,
                ProcessingStatus::Processing,
                TransitionPayload::None,
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::InvalidTransition {
                from: ProcessingStatus::Completed,
                to: ProcessingStatus::Processing,
            }
        ));
        assert_eq!(h.repository.save_call_count(), 0);
        assert_eq!(h.repository.get(video_id).unwrap(), request);
    }

    #[tokio::test]
    async fn test_missing_payload_is_rejected() {
        let h = harness();
        let request = request_in_status("u1", ProcessingStatus::Processing);
        let video_id = request.id;
        h.repository.insert(request);

        let err = h
            .service
            .execute(
                video_id,
                None,
                ProcessingStatus::Completed,
                TransitionPayload::None,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::MissingPayload(_)));
        assert_eq!(h.repository.save_call_count(), 0);
    }

    #[tokio::test]
    async fn test_notification_is_sent_on_success() {
        let h = harness();
        let request = request_in_status("u1", ProcessingStatus::Processing);
        let video_id = request.id;
        h.repository.insert(request);

        h.service
            .execute(
                video_id,
                None,
                ProcessingStatus::Failed,
                TransitionPayload::Failed {
                    error_message: "boom".to_string(),
                },
            )
            .await
            .unwrap();

        let events = h.notifier.recorded_events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].0, "u1");
        assert_eq!(events[0].1, StatusEvent::ProcessingFailed);
        assert_eq!(events[0].2, ProcessingStatus::Failed);
    }

    #[tokio::test]
    async fn test_notification_failure_is_swallowed() {
        let h = harness();
        h.notifier.fail.store(true, Ordering::SeqCst);
        let request = request_in_status("u1", ProcessingStatus::Processing);
        let video_id = request.id;
        h.repository.insert(request);

        let response = h
            .service
            .execute(
                video_id,
                None,
                ProcessingStatus::Completed,
                TransitionPayload::Completed {
                    processed_file_key: "processed-videos/v1/clip_frames.zip".to_string(),
                    frame_count: None,
                    processing_duration_ms: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(response.new_status, ProcessingStatus::Completed);
        assert_eq!(
            h.repository.get(video_id).unwrap().status,
            ProcessingStatus::Completed
        );
    }

    #[tokio::test]
    async fn test_processing_transition_dispatches_job() {
        let h = harness();
        let request = request_in_status("u1", ProcessingStatus::Pending);
        let video_id = request.id;
        h.repository.insert(request);

        h.service
            .execute(
                video_id,
                None,
                ProcessingStatus::Processing,
                TransitionPayload::None,
            )
            .await
            .unwrap();
        settle().await;

        let jobs = h.dispatcher.recorded_jobs();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].video_id, video_id);
        assert_eq!(jobs[0].source_location, "uploads/v1/clip.mp4");
    }

    #[tokio::test]
    async fn test_terminal_transitions_do_not_dispatch() {
        let h = harness();
        let request = request_in_status("u1", ProcessingStatus::Processing);
        let video_id = request.id;
        h.repository.insert(request);

        h.service
            .execute(
                video_id,
                None,
                ProcessingStatus::Failed,
                TransitionPayload::Failed {
                    error_message: "boom".to_string(),
                },
            )
            .await
            .unwrap();
        settle().await;

        assert!(h.dispatcher.recorded_jobs().is_empty());
    }
}
