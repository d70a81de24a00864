//! Result-queue consumer for Clipdock.
//!
//! Receives worker result messages from the [`inbox::ResultInbox`] transport
//! and runs each through the ingestion pipeline, acknowledging or retaining
//! according to the hard/soft failure policy.

pub mod consumer;
pub mod inbox;

pub use consumer::{AckDecision, ResultConsumer, ResultConsumerConfig};
pub use inbox::{InboxMessage, ResultInbox, SqsResultInbox};
