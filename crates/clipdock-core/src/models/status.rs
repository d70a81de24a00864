use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use crate::error::AppError;

/// Lifecycle status of a video processing request.
///
/// The set is closed: wire values outside it are a parse error, never a
/// silently-invented state. `Completed` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(
    feature = "sqlx",
    sqlx(type_name = "processing_status", rename_all = "lowercase")
)]
#[serde(rename_all = "lowercase")]
pub enum ProcessingStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl ProcessingStatus {
    /// Human-readable description for API responses and notifications.
    pub fn description(&self) -> &'static str {
        match self {
            ProcessingStatus::Pending => "Queued and waiting for processing",
            ProcessingStatus::Processing => "Processing in progress",
            ProcessingStatus::Completed => "Processing completed successfully",
            ProcessingStatus::Failed => "Processing failed",
        }
    }

    /// Terminal statuses permit no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ProcessingStatus::Completed | ProcessingStatus::Failed)
    }

    /// Only failed requests may be resubmitted for processing.
    pub fn can_retry(&self) -> bool {
        matches!(self, ProcessingStatus::Failed)
    }

    /// Legal-transition table.
    ///
    /// Pending -> Processing | Failed; Processing -> Completed | Failed;
    /// terminal states go nowhere. Self-transitions are illegal here; the
    /// ingestion pipeline decides whether a same-state rejection counts as an
    /// idempotent redelivery.
    pub fn can_transition_to(&self, target: ProcessingStatus) -> bool {
        use ProcessingStatus::*;
        matches!(
            (self, target),
            (Pending, Processing) | (Pending, Failed) | (Processing, Completed) | (Processing, Failed)
        )
    }
}

impl Display for ProcessingStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            ProcessingStatus::Pending => write!(f, "pending"),
            ProcessingStatus::Processing => write!(f, "processing"),
            ProcessingStatus::Completed => write!(f, "completed"),
            ProcessingStatus::Failed => write!(f, "failed"),
        }
    }
}

impl FromStr for ProcessingStatus {
    type Err = AppError;

    /// Case-insensitive parse against the closed status set.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pending" => Ok(ProcessingStatus::Pending),
            "processing" => Ok(ProcessingStatus::Processing),
            "completed" => Ok(ProcessingStatus::Completed),
            "failed" => Ok(ProcessingStatus::Failed),
            _ => Err(AppError::InvalidRequest(format!(
                "Unknown processing status: {}",
                s
            ))),
        }
    }
}
