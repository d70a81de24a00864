use async_trait::async_trait;
use uuid::Uuid;

use clipdock_core::{AppError, VideoProcessingRequest};

/// Load/save seam for the request aggregate.
///
/// Implementations must fail loudly on transport errors (`AppError::Database`)
/// rather than silently returning `None`; a missing row is the only case that
/// yields `Ok(None)`.
#[async_trait]
pub trait VideoRequestRepository: Send + Sync {
    /// Persist a freshly created aggregate.
    async fn create(
        &self,
        request: &VideoProcessingRequest,
    ) -> Result<VideoProcessingRequest, AppError>;

    /// Load the aggregate by video id.
    async fn find(&self, video_id: Uuid) -> Result<Option<VideoProcessingRequest>, AppError>;

    /// Persist the aggregate after a transition.
    async fn save(
        &self,
        request: &VideoProcessingRequest,
    ) -> Result<VideoProcessingRequest, AppError>;
}
