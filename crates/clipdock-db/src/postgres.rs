use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{postgres::PgRow, PgPool, Postgres, Row};
use uuid::Uuid;

use clipdock_core::{
    AppError, ProcessingStatus, VideoMetadata, VideoProcessingRequest,
};

use crate::repository::VideoRequestRepository;

/// Embedded migrations for the `video_processing_requests` table.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!();

const SELECT_COLUMNS: &str = r#"
    id,
    user_id,
    original_filename,
    file_size,
    format,
    content_type,
    storage_key,
    status,
    error_message,
    processed_file_key,
    frame_count,
    processing_duration_ms,
    created_at,
    updated_at
"#;

/// Row wrapper so the aggregate itself stays free of sqlx derives.
struct VideoRequestRow(VideoProcessingRequest);

impl sqlx::FromRow<'_, PgRow> for VideoRequestRow {
    fn from_row(row: &PgRow) -> Result<Self, sqlx::Error> {
        Ok(VideoRequestRow(VideoProcessingRequest {
            id: row.get("id"),
            user_id: row.get("user_id"),
            metadata: VideoMetadata {
                original_filename: row.get("original_filename"),
                file_size: row.get("file_size"),
                format: row.get("format"),
                content_type: row.get("content_type"),
                storage_key: row.get("storage_key"),
            },
            status: row.get::<ProcessingStatus, _>("status"),
            error_message: row.get("error_message"),
            processed_file_key: row.get("processed_file_key"),
            frame_count: row.get("frame_count"),
            processing_duration_ms: row.get("processing_duration_ms"),
            created_at: row.get::<DateTime<Utc>, _>("created_at"),
            updated_at: row.get::<DateTime<Utc>, _>("updated_at"),
        }))
    }
}

/// Postgres-backed repository for video processing requests.
#[derive(Clone)]
pub struct PgVideoRequestRepository {
    pool: PgPool,
}

impl PgVideoRequestRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VideoRequestRepository for PgVideoRequestRepository {
    #[tracing::instrument(skip(self, request), fields(video_id = %request.id))]
    async fn create(
        &self,
        request: &VideoProcessingRequest,
    ) -> Result<VideoProcessingRequest, AppError> {
        let sql = format!(
            r#"
            INSERT INTO video_processing_requests (
                id, user_id, original_filename, file_size, format, content_type,
                storage_key, status, error_message, processed_file_key,
                frame_count, processing_duration_ms, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING {SELECT_COLUMNS}
            "#
        );

        let row: VideoRequestRow = sqlx::query_as::<Postgres, VideoRequestRow>(&sql)
            .bind(request.id)
            .bind(&request.user_id)
            .bind(&request.metadata.original_filename)
            .bind(request.metadata.file_size)
            .bind(&request.metadata.format)
            .bind(&request.metadata.content_type)
            .bind(&request.metadata.storage_key)
            .bind(request.status)
            .bind(&request.error_message)
            .bind(&request.processed_file_key)
            .bind(request.frame_count)
            .bind(request.processing_duration_ms)
            .bind(request.created_at)
            .bind(request.updated_at)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, video_id = %request.id, "Failed to insert video processing request");
                AppError::Database(e)
            })?;

        tracing::info!(
            video_id = %request.id,
            user_id = %request.user_id,
            "Video processing request created"
        );

        Ok(row.0)
    }

    #[tracing::instrument(skip(self))]
    async fn find(&self, video_id: Uuid) -> Result<Option<VideoProcessingRequest>, AppError> {
        let sql = format!(
            r#"
            SELECT {SELECT_COLUMNS}
            FROM video_processing_requests
            WHERE id = $1
            "#
        );

        let row: Option<VideoRequestRow> = sqlx::query_as::<Postgres, VideoRequestRow>(&sql)
            .bind(video_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, video_id = %video_id, "Failed to fetch video processing request");
                AppError::Database(e)
            })?;

        Ok(row.map(|r| r.0))
    }

    #[tracing::instrument(skip(self, request), fields(video_id = %request.id, status = %request.status))]
    async fn save(
        &self,
        request: &VideoProcessingRequest,
    ) -> Result<VideoProcessingRequest, AppError> {
        let sql = format!(
            r#"
            UPDATE video_processing_requests
            SET status = $2,
                error_message = $3,
                processed_file_key = $4,
                frame_count = $5,
                processing_duration_ms = $6,
                updated_at = $7
            WHERE id = $1
            RETURNING {SELECT_COLUMNS}
            "#
        );

        let row: VideoRequestRow = sqlx::query_as::<Postgres, VideoRequestRow>(&sql)
            .bind(request.id)
            .bind(request.status)
            .bind(&request.error_message)
            .bind(&request.processed_file_key)
            .bind(request.frame_count)
            .bind(request.processing_duration_ms)
            .bind(request.updated_at)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::RowNotFound => {
                    AppError::NotFound(format!("Video {} not found", request.id))
                }
                other => {
                    tracing::error!(error = %other, video_id = %request.id, "Failed to update video processing request");
                    AppError::Database(other)
                }
            })?;

        tracing::debug!(
            video_id = %request.id,
            status = %request.status,
            "Video processing request saved"
        );

        Ok(row.0)
    }
}
