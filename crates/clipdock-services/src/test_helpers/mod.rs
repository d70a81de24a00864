//! In-memory collaborators for tests.
//!
//! Shared by the unit tests in this crate and the integration tests under
//! `tests/`. Every mock records its calls so tests can assert which
//! collaborators were (or were not) invoked.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use uuid::Uuid;

use clipdock_core::{
    AppError, ProcessingResultMessage, ProcessingStatus, TransitionPayload, VideoMetadata,
    VideoProcessingRequest,
};
use clipdock_db::VideoRequestRepository;
use clipdock_storage::{Storage, StorageError, StorageResult};

use crate::dispatch::{ProcessingDispatcher, ProcessingJob};
use crate::notify::{NotificationPayload, Notifier, StatusEvent};

/// Repository over a mutex-guarded map, with call counters.
#[derive(Default)]
pub struct InMemoryVideoRequestRepository {
    items: Mutex<HashMap<Uuid, VideoProcessingRequest>>,
    pub find_calls: AtomicUsize,
    pub save_calls: AtomicUsize,
    pub fail_next_save: AtomicBool,
}

impl InMemoryVideoRequestRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, request: VideoProcessingRequest) {
        self.items.lock().unwrap().insert(request.id, request);
    }

    pub fn get(&self, video_id: Uuid) -> Option<VideoProcessingRequest> {
        self.items.lock().unwrap().get(&video_id).cloned()
    }

    pub fn find_call_count(&self) -> usize {
        self.find_calls.load(Ordering::SeqCst)
    }

    pub fn save_call_count(&self) -> usize {
        self.save_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VideoRequestRepository for InMemoryVideoRequestRepository {
    async fn create(
        &self,
        request: &VideoProcessingRequest,
    ) -> Result<VideoProcessingRequest, AppError> {
        self.insert(request.clone());
        Ok(request.clone())
    }

    async fn find(&self, video_id: Uuid) -> Result<Option<VideoProcessingRequest>, AppError> {
        self.find_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.get(video_id))
    }

    async fn save(
        &self,
        request: &VideoProcessingRequest,
    ) -> Result<VideoProcessingRequest, AppError> {
        self.save_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_next_save.swap(false, Ordering::SeqCst) {
            return Err(AppError::Internal("save failed (test)".to_string()));
        }
        let mut items = self.items.lock().unwrap();
        if !items.contains_key(&request.id) {
            return Err(AppError::NotFound(format!(
                "Video {} not found",
                request.id
            )));
        }
        items.insert(request.id, request.clone());
        Ok(request.clone())
    }
}

/// Storage over a mutex-guarded map, recording every copy.
#[derive(Default)]
pub struct InMemoryStorage {
    objects: Mutex<HashMap<String, Vec<u8>>>,
    pub copies: Mutex<Vec<(String, String)>>,
    pub fail_copy: AtomicBool,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&self, key: &str, data: Vec<u8>) {
        self.objects.lock().unwrap().insert(key.to_string(), data);
    }

    pub fn recorded_copies(&self) -> Vec<(String, String)> {
        self.copies.lock().unwrap().clone()
    }
}

#[async_trait]
impl Storage for InMemoryStorage {
    async fn upload(&self, key: &str, data: Vec<u8>, _content_type: &str) -> StorageResult<String> {
        self.put(key, data);
        Ok(format!("https://storage.test/{}", key))
    }

    async fn download(&self, key: &str) -> StorageResult<Vec<u8>> {
        self.objects
            .lock()
            .unwrap()
            .get(key)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(key.to_string()))
    }

    async fn copy(&self, from_key: &str, to_key: &str) -> StorageResult<String> {
        if self.fail_copy.load(Ordering::SeqCst) {
            return Err(StorageError::CopyFailed("copy failed (test)".to_string()));
        }
        self.copies
            .lock()
            .unwrap()
            .push((from_key.to_string(), to_key.to_string()));
        let mut objects = self.objects.lock().unwrap();
        let data = objects.get(from_key).cloned().unwrap_or_default();
        objects.insert(to_key.to_string(), data);
        Ok(to_key.to_string())
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        self.objects.lock().unwrap().remove(key);
        Ok(())
    }

    async fn exists(&self, key: &str) -> StorageResult<bool> {
        Ok(self.objects.lock().unwrap().contains_key(key))
    }

    async fn presigned_url(&self, key: &str, expires_in: Duration) -> StorageResult<String> {
        Ok(format!(
            "https://storage.test/{}?expires={}",
            key,
            expires_in.as_secs()
        ))
    }
}

/// Notifier that records events and can be told to fail.
#[derive(Default)]
pub struct RecordingNotifier {
    pub events: Mutex<Vec<(String, StatusEvent, ProcessingStatus)>>,
    pub fail: AtomicBool,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn recorded_events(&self) -> Vec<(String, StatusEvent, ProcessingStatus)> {
        self.events.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(
        &self,
        user_id: &str,
        event: StatusEvent,
        payload: &NotificationPayload,
    ) -> Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(anyhow!("notification failed (test)"));
        }
        self.events
            .lock()
            .unwrap()
            .push((user_id.to_string(), event, payload.status));
        Ok(())
    }
}

/// Dispatcher that records jobs.
#[derive(Default)]
pub struct RecordingDispatcher {
    pub jobs: Mutex<Vec<ProcessingJob>>,
}

impl RecordingDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn recorded_jobs(&self) -> Vec<ProcessingJob> {
        self.jobs.lock().unwrap().clone()
    }
}

#[async_trait]
impl ProcessingDispatcher for RecordingDispatcher {
    async fn dispatch(&self, job: &ProcessingJob) -> Result<()> {
        self.jobs.lock().unwrap().push(job.clone());
        Ok(())
    }
}

/// Metadata fixture for a typical mp4 upload.
pub fn test_metadata() -> VideoMetadata {
    VideoMetadata {
        original_filename: "clip.mp4".to_string(),
        file_size: 10_240_000,
        format: "mp4".to_string(),
        content_type: "video/mp4".to_string(),
        storage_key: "uploads/v1/clip.mp4".to_string(),
    }
}

/// Build a request for `user_id` driven to `status` through real transitions.
pub fn request_in_status(user_id: &str, status: ProcessingStatus) -> VideoProcessingRequest {
    let request = VideoProcessingRequest::new(user_id, test_metadata());
    match status {
        ProcessingStatus::Pending => request,
        ProcessingStatus::Processing => request
            .transition(ProcessingStatus::Processing, TransitionPayload::None)
            .expect("pending -> processing"),
        ProcessingStatus::Completed => request
            .transition(ProcessingStatus::Processing, TransitionPayload::None)
            .expect("pending -> processing")
            .transition(
                ProcessingStatus::Completed,
                TransitionPayload::Completed {
                    processed_file_key: format!(
                        "processed-videos/{}/clip_frames.zip",
                        request.id
                    ),
                    frame_count: Some(100),
                    processing_duration_ms: Some(2_000),
                },
            )
            .expect("processing -> completed"),
        ProcessingStatus::Failed => request
            .transition(ProcessingStatus::Processing, TransitionPayload::None)
            .expect("pending -> processing")
            .transition(
                ProcessingStatus::Failed,
                TransitionPayload::Failed {
                    error_message: "worker crashed".to_string(),
                },
            )
            .expect("processing -> failed"),
    }
}

/// Result message fixture in the worker's wire vocabulary.
pub fn result_message(video_id: Uuid, user_id: &str, status: &str) -> ProcessingResultMessage {
    let mut metadata = HashMap::new();
    metadata.insert(
        clipdock_core::models::METADATA_ORIGINAL_FILENAME.to_string(),
        "clip.mp4".to_string(),
    );
    ProcessingResultMessage {
        video_id: video_id.to_string(),
        user_id: user_id.to_string(),
        status: status.to_string(),
        output_location: Some(format!("raw/{}/out.zip", video_id)),
        frame_count: Some(120),
        processing_duration_ms: Some(4_500),
        error_message: None,
        metadata,
    }
}
