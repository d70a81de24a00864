//! Result consumer: long-polls the inbox and feeds the ingestion pipeline.
//!
//! Acknowledgment policy per message:
//! - pipeline returned an outcome: acknowledge (duplicates and business
//!   rejections included - redelivery cannot change those verdicts);
//! - malformed message (unparseable JSON or `InvalidRequest`): acknowledge
//!   and drop with a warning - it will never become valid, so automatic
//!   redelivery would only loop it forever;
//! - anything else (relocation failure, transport faults): retain, letting
//!   the queue redeliver after the visibility timeout.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, Semaphore};

use clipdock_core::{AppError, ProcessingResultMessage};
use clipdock_services::ResultIngestService;

use crate::inbox::{InboxMessage, ResultInbox};

#[derive(Clone)]
pub struct ResultConsumerConfig {
    /// Upper bound on concurrently processed messages.
    pub max_in_flight: usize,
    /// Long-poll wait per receive call.
    pub wait_time: Duration,
    /// Messages requested per receive call.
    pub batch_size: i32,
}

impl Default for ResultConsumerConfig {
    fn default() -> Self {
        Self {
            max_in_flight: 8,
            wait_time: Duration::from_secs(20),
            batch_size: 10,
        }
    }
}

/// What to do with an inbox message after one processing attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckDecision {
    /// Remove the message from the queue.
    Acknowledge,
    /// Leave the message for redelivery.
    Retain,
}

pub struct ResultConsumer {
    inbox: Arc<dyn ResultInbox>,
    ingest: ResultIngestService,
    config: ResultConsumerConfig,
    shutdown_tx: mpsc::Sender<()>,
    shutdown_rx: mpsc::Receiver<()>,
}

impl ResultConsumer {
    pub fn new(
        inbox: Arc<dyn ResultInbox>,
        ingest: ResultIngestService,
        config: ResultConsumerConfig,
    ) -> Self {
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
        Self {
            inbox,
            ingest,
            config,
            shutdown_tx,
            shutdown_rx,
        }
    }

    /// Handle for requesting shutdown from another task.
    pub fn shutdown_handle(&self) -> mpsc::Sender<()> {
        self.shutdown_tx.clone()
    }

    /// Consume until shutdown is requested.
    pub async fn run(mut self) {
        tracing::info!(
            max_in_flight = self.config.max_in_flight,
            batch_size = self.config.batch_size,
            "Result consumer started"
        );

        let semaphore = Arc::new(Semaphore::new(self.config.max_in_flight));

        loop {
            tokio::select! {
                _ = self.shutdown_rx.recv() => {
                    tracing::info!("Result consumer shutting down");
                    break;
                }
                received = self.inbox.receive(self.config.batch_size, self.config.wait_time) => {
                    let messages = match received {
                        Ok(messages) => messages,
                        Err(e) => {
                            tracing::error!(error = %e, "Failed to receive result messages, backing off");
                            tokio::time::sleep(Duration::from_secs(5)).await;
                            continue;
                        }
                    };

                    for message in messages {
                        let permit = match semaphore.clone().acquire_owned().await {
                            Ok(permit) => permit,
                            Err(_) => return,
                        };
                        let inbox = self.inbox.clone();
                        let ingest = self.ingest.clone();

                        tokio::spawn(async move {
                            let _permit = permit;
                            let decision = handle_message(&ingest, &message).await;
                            if decision == AckDecision::Acknowledge {
                                if let Err(e) = inbox.acknowledge(&message.receipt).await {
                                    tracing::error!(
                                        error = %e,
                                        "Failed to acknowledge result message; it will be redelivered"
                                    );
                                }
                            }
                        });
                    }
                }
            }
        }

        tracing::info!("Result consumer stopped");
    }
}

/// Process one raw inbox message and decide its fate.
pub async fn handle_message(
    ingest: &ResultIngestService,
    message: &InboxMessage,
) -> AckDecision {
    let parsed: ProcessingResultMessage = match serde_json::from_str(&message.body) {
        Ok(parsed) => parsed,
        Err(e) => {
            tracing::warn!(
                error = %e,
                "Dropping unparseable result message"
            );
            return AckDecision::Acknowledge;
        }
    };

    match ingest.process(&parsed).await {
        Ok(outcome) => {
            tracing::info!(
                video_id = %outcome.video_id,
                applied = outcome.applied,
                final_status = ?outcome.final_status,
                note = outcome.note.as_deref().unwrap_or(""),
                "Result message processed"
            );
            AckDecision::Acknowledge
        }
        Err(AppError::InvalidRequest(reason)) => {
            tracing::warn!(
                video_id = %parsed.video_id,
                reason = %reason,
                "Dropping structurally invalid result message"
            );
            AckDecision::Acknowledge
        }
        Err(e) => {
            tracing::error!(
                error = %e,
                video_id = %parsed.video_id,
                "Result processing failed, retaining message for redelivery"
            );
            AckDecision::Retain
        }
    }
}
