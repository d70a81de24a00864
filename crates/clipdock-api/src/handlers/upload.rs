use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use clipdock_core::{
    validate_video_upload, AppError, ProcessingStatus, TransitionPayload, VideoMetadata,
    VideoProcessingRequest, VideoRequestResponse,
};
use clipdock_storage::upload_key;

use crate::auth::UserContext;
use crate::error::HttpAppError;
use crate::state::AppState;

struct UploadedFile {
    filename: String,
    content_type: String,
    data: Vec<u8>,
}

async fn read_file_field(mut multipart: Multipart) -> Result<UploadedFile, HttpAppError> {
    while let Some(field) = multipart.next_field().await.map_err(|e| {
        HttpAppError(AppError::InvalidRequest(format!(
            "Invalid multipart body: {}",
            e
        )))
    })? {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field
            .file_name()
            .map(str::to_string)
            .filter(|name| !name.trim().is_empty())
            .ok_or_else(|| {
                HttpAppError(AppError::InvalidRequest(
                    "Upload is missing a filename".to_string(),
                ))
            })?;
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| {
                HttpAppError(AppError::InvalidRequest(format!(
                    "Failed to read upload body: {}",
                    e
                )))
            })?
            .to_vec();
        return Ok(UploadedFile {
            filename,
            content_type,
            data,
        });
    }

    Err(HttpAppError(AppError::InvalidRequest(
        "Multipart body is missing the 'file' field".to_string(),
    )))
}

/// Accept a video upload: validate, store the raw file, record the request in
/// `Pending`, then move it to `Processing` through the orchestrator (which
/// dispatches the processing job fire-and-forget).
pub async fn upload_video(
    State(state): State<Arc<AppState>>,
    user: UserContext,
    multipart: Multipart,
) -> Result<(StatusCode, Json<VideoRequestResponse>), HttpAppError> {
    let file = read_file_field(multipart).await?;

    let (safe_filename, format) = validate_video_upload(
        &file.filename,
        &file.content_type,
        file.data.len(),
        &state.config,
    )?;

    let video_id = Uuid::new_v4();
    let storage_key = upload_key(&video_id.to_string(), &safe_filename);
    let file_size = file.data.len() as i64;

    state
        .storage
        .upload(&storage_key, file.data, &file.content_type)
        .await?;

    let request = VideoProcessingRequest::with_id(
        video_id,
        user.user_id.clone(),
        VideoMetadata {
            original_filename: safe_filename,
            file_size,
            format,
            content_type: file.content_type,
            storage_key: storage_key.clone(),
        },
    );

    let created = match state.repository.create(&request).await {
        Ok(created) => created,
        Err(e) => {
            // The request row is the source of truth; without it the stored
            // file is orphaned, so clean it up best-effort.
            let storage = state.storage.clone();
            tokio::spawn(async move {
                if let Err(cleanup_err) = storage.delete(&storage_key).await {
                    tracing::debug!(
                        error = %cleanup_err,
                        storage_key = %storage_key,
                        "Failed to clean up stored file after DB error"
                    );
                }
            });
            return Err(e.into());
        }
    };

    tracing::info!(
        video_id = %created.id,
        user_id = %created.user_id,
        file_size = created.metadata.file_size,
        "Video upload accepted"
    );

    state
        .update_status
        .execute(
            created.id,
            None,
            ProcessingStatus::Processing,
            TransitionPayload::None,
        )
        .await?;

    let current = state
        .repository
        .find(created.id)
        .await?
        .ok_or_else(|| AppError::Internal("Request vanished after creation".to_string()))?;

    Ok((
        StatusCode::CREATED,
        Json(VideoRequestResponse::from(current)),
    ))
}
