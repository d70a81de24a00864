//! Storage backend factory.

use std::sync::Arc;

use clipdock_core::{Config, StorageBackend};

use crate::traits::{Storage, StorageError, StorageResult};

/// Build the storage backend selected by configuration.
pub async fn build_storage(config: &Config) -> StorageResult<Arc<dyn Storage>> {
    match config.storage_backend {
        #[cfg(feature = "storage-local")]
        StorageBackend::Local => {
            let storage = crate::local::LocalStorage::new(
                config.local_storage_path.clone(),
                config.local_storage_base_url.clone(),
            )
            .await?;
            tracing::info!(
                path = %config.local_storage_path,
                "Using local filesystem storage"
            );
            Ok(Arc::new(storage))
        }
        #[cfg(not(feature = "storage-local"))]
        StorageBackend::Local => Err(StorageError::ConfigError(
            "Local storage backend not compiled in".to_string(),
        )),
        #[cfg(feature = "storage-s3")]
        StorageBackend::S3 => {
            let bucket = config.s3_bucket.clone().ok_or_else(|| {
                StorageError::ConfigError("S3_BUCKET is required for the s3 backend".to_string())
            })?;
            let region = config.s3_region.clone().ok_or_else(|| {
                StorageError::ConfigError("S3_REGION is required for the s3 backend".to_string())
            })?;
            let storage =
                crate::s3::S3Storage::new(bucket.clone(), region, config.s3_endpoint.clone())
                    .await?;
            tracing::info!(bucket = %bucket, "Using S3 storage");
            Ok(Arc::new(storage))
        }
        #[cfg(not(feature = "storage-s3"))]
        StorageBackend::S3 => Err(StorageError::ConfigError(
            "S3 storage backend not compiled in".to_string(),
        )),
    }
}
