//! Processing-work dispatch.
//!
//! The actual frame extraction happens in an external worker; this seam hands
//! it a job and returns. The orchestrator dispatches fire-and-forget, so a
//! slow worker endpoint never delays the synchronous transition to
//! `Processing`.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;
use uuid::Uuid;

/// Job request handed to the external processing worker.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingJob {
    pub video_id: Uuid,
    pub user_id: String,
    pub source_location: String,
    pub original_filename: String,
}

/// Seam to the external processing worker.
#[async_trait]
pub trait ProcessingDispatcher: Send + Sync {
    async fn dispatch(&self, job: &ProcessingJob) -> Result<()>;
}

/// Posts jobs to the worker's HTTP endpoint.
#[derive(Clone)]
pub struct HttpProcessingDispatcher {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpProcessingDispatcher {
    pub fn new(endpoint: String, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client for processing dispatch")?;
        Ok(Self { client, endpoint })
    }
}

#[async_trait]
impl ProcessingDispatcher for HttpProcessingDispatcher {
    #[tracing::instrument(skip(self, job), fields(video_id = %job.video_id))]
    async fn dispatch(&self, job: &ProcessingJob) -> Result<()> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(job)
            .send()
            .await
            .context("Failed to reach processing worker")?;

        response
            .error_for_status()
            .context("Processing worker rejected the job")?;

        tracing::info!(
            video_id = %job.video_id,
            source = %job.source_location,
            "Processing job dispatched"
        );
        Ok(())
    }
}

/// Logs jobs instead of dispatching them; used when no worker endpoint is
/// configured (e.g. local development with a manually driven worker).
#[derive(Debug, Clone, Default)]
pub struct NoopDispatcher;

#[async_trait]
impl ProcessingDispatcher for NoopDispatcher {
    async fn dispatch(&self, job: &ProcessingJob) -> Result<()> {
        tracing::info!(
            video_id = %job.video_id,
            source = %job.source_location,
            "Processing dispatch skipped (no worker endpoint configured)"
        );
        Ok(())
    }
}
