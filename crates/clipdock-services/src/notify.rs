//! Status-change notifications.
//!
//! Notification delivery is best-effort: the orchestrator logs and swallows
//! failures, so implementations never get to fail a status update.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::time::Duration;
use uuid::Uuid;

use clipdock_core::ProcessingStatus;

/// Notification event kinds emitted on status changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusEvent {
    ProcessingStarted,
    ProcessingCompleted,
    ProcessingFailed,
}

impl StatusEvent {
    /// Event to emit when a request enters the given status. `Pending` is the
    /// creation state and emits nothing.
    pub fn for_status(status: ProcessingStatus) -> Option<StatusEvent> {
        match status {
            ProcessingStatus::Pending => None,
            ProcessingStatus::Processing => Some(StatusEvent::ProcessingStarted),
            ProcessingStatus::Completed => Some(StatusEvent::ProcessingCompleted),
            ProcessingStatus::Failed => Some(StatusEvent::ProcessingFailed),
        }
    }
}

impl Display for StatusEvent {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            StatusEvent::ProcessingStarted => write!(f, "processing_started"),
            StatusEvent::ProcessingCompleted => write!(f, "processing_completed"),
            StatusEvent::ProcessingFailed => write!(f, "processing_failed"),
        }
    }
}

/// Data accompanying a status-change notification.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationPayload {
    pub video_id: Uuid,
    pub status: ProcessingStatus,
    pub status_description: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Notification seam. Failures are reported to the caller, which logs and
/// swallows them.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(
        &self,
        user_id: &str,
        event: StatusEvent,
        payload: &NotificationPayload,
    ) -> Result<()>;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WebhookBody<'a> {
    user_id: &'a str,
    event: StatusEvent,
    data: &'a NotificationPayload,
}

/// Delivers notifications as JSON POSTs to a configured webhook endpoint.
#[derive(Clone)]
pub struct WebhookNotifier {
    client: reqwest::Client,
    endpoint: String,
}

impl WebhookNotifier {
    pub fn new(endpoint: String, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client for notifications")?;
        Ok(Self { client, endpoint })
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    #[tracing::instrument(skip(self, payload), fields(video_id = %payload.video_id))]
    async fn notify(
        &self,
        user_id: &str,
        event: StatusEvent,
        payload: &NotificationPayload,
    ) -> Result<()> {
        let body = WebhookBody {
            user_id,
            event,
            data: payload,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .context("Failed to send notification webhook")?;

        response
            .error_for_status()
            .context("Notification webhook returned an error status")?;

        tracing::debug!(
            user_id = %user_id,
            event = %event,
            "Status notification delivered"
        );
        Ok(())
    }
}

/// Logs notifications instead of delivering them; used when no webhook is
/// configured.
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(
        &self,
        user_id: &str,
        event: StatusEvent,
        payload: &NotificationPayload,
    ) -> Result<()> {
        tracing::info!(
            user_id = %user_id,
            event = %event,
            video_id = %payload.video_id,
            status = %payload.status,
            "Status notification (log only)"
        );
        Ok(())
    }
}
