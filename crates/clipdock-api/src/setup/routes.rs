use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post, put},
    Json, Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

pub fn build_router(state: Arc<AppState>) -> Router {
    // Leave headroom above the configured media limit for multipart framing.
    let body_limit = state.config.max_video_size_bytes + 1024 * 1024;

    Router::new()
        .route("/api/v1/videos", post(handlers::upload::upload_video))
        .route(
            "/api/v1/videos/{id}/status",
            get(handlers::status::get_status),
        )
        .route(
            "/api/v1/videos/{id}/download",
            get(handlers::download::download_video),
        )
        .route(
            "/internal/v1/videos/{id}/status",
            put(handlers::status_update::update_status),
        )
        .route("/health", get(health))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
