use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use clipdock_core::{AppError, VideoRequestResponse};

use crate::auth::UserContext;
use crate::error::HttpAppError;
use crate::state::AppState;

/// Current processing status of a video, owner-scoped.
pub async fn get_status(
    State(state): State<Arc<AppState>>,
    user: UserContext,
    Path(video_id): Path<Uuid>,
) -> Result<Json<VideoRequestResponse>, HttpAppError> {
    let request = state
        .repository
        .find(video_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Video {} not found", video_id)))?;

    if request.user_id != user.user_id {
        // Rendered identically to not-found.
        return Err(HttpAppError(AppError::NotOwner { video_id }));
    }

    Ok(Json(VideoRequestResponse::from(request)))
}
