use std::sync::Arc;

use clipdock_core::Config;
use clipdock_db::VideoRequestRepository;
use clipdock_services::UpdateProcessingStatus;
use clipdock_storage::Storage;

/// Shared application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub repository: Arc<dyn VideoRequestRepository>,
    pub storage: Arc<dyn Storage>,
    pub update_status: UpdateProcessingStatus,
}
