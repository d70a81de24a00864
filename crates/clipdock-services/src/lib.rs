//! Clipdock services
//!
//! The status-update orchestrator and the result-ingestion pipeline, plus the
//! notifier and processing-dispatch seams they call out to. `test_helpers`
//! provides in-memory collaborators shared by unit and integration tests.

pub mod dispatch;
pub mod ingest;
pub mod notify;
pub mod test_helpers;
pub mod update_status;

pub use dispatch::{HttpProcessingDispatcher, NoopDispatcher, ProcessingDispatcher, ProcessingJob};
pub use ingest::ResultIngestService;
pub use notify::{LogNotifier, NotificationPayload, Notifier, StatusEvent, WebhookNotifier};
pub use update_status::UpdateProcessingStatus;
