use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use clipdock_core::{AppError, ProcessingStatus};

use crate::auth::UserContext;
use crate::error::HttpAppError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadLinkResponse {
    pub video_id: Uuid,
    pub url: String,
    pub expires_in_secs: u64,
}

/// Issue a time-limited download link for the processed artifact.
///
/// A request that has not completed yet is an expected condition, reported as
/// a 409 `NOT_READY` rather than an internal error.
pub async fn download_video(
    State(state): State<Arc<AppState>>,
    user: UserContext,
    Path(video_id): Path<Uuid>,
) -> Result<Json<DownloadLinkResponse>, HttpAppError> {
    let request = state
        .repository
        .find(video_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Video {} not found", video_id)))?;

    if request.user_id != user.user_id {
        return Err(HttpAppError(AppError::NotOwner { video_id }));
    }

    if request.status != ProcessingStatus::Completed {
        return Err(HttpAppError(AppError::NotReady {
            status: request.status,
        }));
    }
    let processed_key = request.processed_file_key.as_deref().ok_or_else(|| {
        // Completed without a reference would violate the aggregate invariant.
        AppError::Internal(format!(
            "Video {} is completed but has no processed file reference",
            video_id
        ))
    })?;

    let ttl = Duration::from_secs(state.config.download_url_ttl_secs);
    let url = state.storage.presigned_url(processed_key, ttl).await?;

    tracing::debug!(video_id = %video_id, "Download link issued");

    Ok(Json(DownloadLinkResponse {
        video_id,
        url,
        expires_in_secs: ttl.as_secs(),
    }))
}
