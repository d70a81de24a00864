use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use clipdock_core::{ProcessingStatus, StatusUpdateResponse, TransitionPayload};

use crate::error::HttpAppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusRequest {
    pub status: String,
    #[serde(default)]
    pub processed_file_key: Option<String>,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub frame_count: Option<i64>,
    #[serde(default)]
    pub processing_duration_ms: Option<i64>,
}

/// Internal status update: the trusted, direct-caller path into the same
/// orchestrator the result inbox uses. No ownership check is applied.
pub async fn update_status(
    State(state): State<Arc<AppState>>,
    Path(video_id): Path<Uuid>,
    Json(body): Json<UpdateStatusRequest>,
) -> Result<Json<StatusUpdateResponse>, HttpAppError> {
    // Closed-set parse: unknown statuses are a 400, never coerced.
    let target: ProcessingStatus = body.status.parse().map_err(HttpAppError)?;

    let payload = match target {
        ProcessingStatus::Completed => TransitionPayload::Completed {
            processed_file_key: body.processed_file_key.unwrap_or_default(),
            frame_count: body.frame_count,
            processing_duration_ms: body.processing_duration_ms,
        },
        ProcessingStatus::Failed => TransitionPayload::Failed {
            error_message: body.error_message.unwrap_or_default(),
        },
        ProcessingStatus::Pending | ProcessingStatus::Processing => TransitionPayload::None,
    };

    let response = state
        .update_status
        .execute(video_id, None, target, payload)
        .await?;

    Ok(Json(response))
}
