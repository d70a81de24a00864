//! Result inbox: the queue-consumer boundary.
//!
//! The transport delivers worker result messages with at-least-once
//! semantics; a message stays visible for redelivery until it is explicitly
//! acknowledged. The ingestion pipeline's idempotency handling exists
//! precisely because of this contract.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::time::Duration;

/// One raw message received from the inbox.
#[derive(Debug, Clone)]
pub struct InboxMessage {
    /// JSON body in the worker's wire format.
    pub body: String,
    /// Transport receipt used to acknowledge the message.
    pub receipt: String,
}

/// Inbound result-message transport.
#[async_trait]
pub trait ResultInbox: Send + Sync {
    /// Receive up to `max_messages` messages, long-polling up to `wait`.
    async fn receive(&self, max_messages: i32, wait: Duration) -> Result<Vec<InboxMessage>>;

    /// Remove a message from the queue. Unacknowledged messages are
    /// redelivered by the transport.
    async fn acknowledge(&self, receipt: &str) -> Result<()>;
}

/// SQS-backed result inbox.
#[derive(Clone)]
pub struct SqsResultInbox {
    client: aws_sdk_sqs::Client,
    queue_url: String,
}

impl SqsResultInbox {
    pub fn new(client: aws_sdk_sqs::Client, queue_url: String) -> Self {
        Self { client, queue_url }
    }

    /// Build an inbox from ambient AWS configuration.
    pub async fn from_env(queue_url: String) -> Self {
        let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        Self::new(aws_sdk_sqs::Client::new(&aws_config), queue_url)
    }
}

#[async_trait]
impl ResultInbox for SqsResultInbox {
    async fn receive(&self, max_messages: i32, wait: Duration) -> Result<Vec<InboxMessage>> {
        let response = self
            .client
            .receive_message()
            .queue_url(&self.queue_url)
            .max_number_of_messages(max_messages)
            .wait_time_seconds(wait.as_secs().min(20) as i32)
            .send()
            .await
            .context("Failed to receive messages from result queue")?;

        let messages = response
            .messages
            .unwrap_or_default()
            .into_iter()
            .filter_map(|message| {
                let body = message.body?;
                let receipt = message.receipt_handle?;
                Some(InboxMessage { body, receipt })
            })
            .collect();

        Ok(messages)
    }

    async fn acknowledge(&self, receipt: &str) -> Result<()> {
        self.client
            .delete_message()
            .queue_url(&self.queue_url)
            .receipt_handle(receipt)
            .send()
            .await
            .context("Failed to delete message from result queue")?;
        Ok(())
    }
}
