//! Storage backends for Clipdock.
//!
//! Raw uploads and processed artifacts live behind the [`Storage`] trait;
//! [`keys`] defines the key layout both share, including the deterministic
//! processed-artifact key used by the result-ingestion pipeline.

pub mod factory;
pub mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

pub use factory::build_storage;
pub use keys::{processed_artifact_key, upload_key};
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use traits::{Storage, StorageError, StorageResult};
