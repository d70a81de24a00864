//! Storage abstraction trait
//!
//! This module defines the Storage trait that all storage backends must
//! implement: raw-upload persistence, artifact relocation, and download-link
//! issuance.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("Copy failed: {0}")]
    CopyFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Storage abstraction trait
///
/// All storage backends (S3, local filesystem) must implement this trait so
/// the services stay free of backend details. Keys follow the
/// `uploads/{video_id}/...` and `processed-videos/{video_id}/...` layout from
/// [`crate::keys`].
#[async_trait]
pub trait Storage: Send + Sync {
    /// Upload data to a storage key and return the public URL.
    async fn upload(&self, key: &str, data: Vec<u8>, content_type: &str) -> StorageResult<String>;

    /// Download the object at a storage key.
    async fn download(&self, key: &str) -> StorageResult<Vec<u8>>;

    /// Copy an object from one key to another, returning the target key.
    ///
    /// Used to relocate worker output to its stable, downloadable location.
    /// Copying onto an existing key overwrites it, which makes repeated
    /// relocation of the same artifact idempotent.
    async fn copy(&self, from_key: &str, to_key: &str) -> StorageResult<String>;

    /// Delete the object at a storage key.
    async fn delete(&self, key: &str) -> StorageResult<()>;

    /// Check whether an object exists.
    async fn exists(&self, key: &str) -> StorageResult<bool>;

    /// Generate a time-limited URL for direct download of an object.
    async fn presigned_url(&self, key: &str, expires_in: Duration) -> StorageResult<String>;
}
