use crate::traits::{Storage, StorageError, StorageResult};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;

/// Local filesystem storage implementation
#[derive(Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
    base_url: String,
}

impl LocalStorage {
    /// Create a new LocalStorage instance
    ///
    /// # Arguments
    /// * `base_path` - Root directory for file storage (e.g., "/var/lib/clipdock/media")
    /// * `base_url` - Base URL for serving files (e.g., "http://localhost:3000/media")
    pub async fn new(base_path: impl Into<PathBuf>, base_url: String) -> StorageResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create storage directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        Ok(LocalStorage {
            base_path,
            base_url,
        })
    }

    /// Convert storage key to filesystem path with traversal validation.
    ///
    /// Keys containing `..` segments or absolute paths are rejected so a key
    /// can never resolve outside the base storage directory.
    fn key_to_path(&self, storage_key: &str) -> StorageResult<PathBuf> {
        if storage_key.is_empty() || storage_key.starts_with('/') {
            return Err(StorageError::InvalidKey(
                "Storage key must be a non-empty relative path".to_string(),
            ));
        }
        if Path::new(storage_key)
            .components()
            .any(|c| matches!(c, std::path::Component::ParentDir))
        {
            return Err(StorageError::InvalidKey(
                "Storage key must not contain parent-directory segments".to_string(),
            ));
        }

        Ok(self.base_path.join(storage_key))
    }

    /// Generate public URL for file
    fn generate_url(&self, key: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), key)
    }

    /// Ensure parent directory exists
    async fn ensure_parent_dir(&self, path: &Path) -> StorageResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl Storage for LocalStorage {
    async fn upload(
        &self,
        key: &str,
        data: Vec<u8>,
        _content_type: &str,
    ) -> StorageResult<String> {
        let path = self.key_to_path(key)?;
        self.ensure_parent_dir(&path).await?;

        fs::write(&path, &data).await.map_err(|e| {
            tracing::error!(error = %e, key = %key, "Local upload failed");
            StorageError::UploadFailed(e.to_string())
        })?;

        tracing::debug!(key = %key, size_bytes = data.len(), "Local upload successful");
        Ok(self.generate_url(key))
    }

    async fn download(&self, key: &str) -> StorageResult<Vec<u8>> {
        let path = self.key_to_path(key)?;
        fs::read(&path).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => StorageError::NotFound(key.to_string()),
            _ => {
                tracing::error!(error = %e, key = %key, "Local download failed");
                StorageError::DownloadFailed(e.to_string())
            }
        })
    }

    async fn copy(&self, from_key: &str, to_key: &str) -> StorageResult<String> {
        let from = self.key_to_path(from_key)?;
        let to = self.key_to_path(to_key)?;
        self.ensure_parent_dir(&to).await?;

        fs::copy(&from, &to).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => StorageError::NotFound(from_key.to_string()),
            _ => {
                tracing::error!(
                    error = %e,
                    from_key = %from_key,
                    to_key = %to_key,
                    "Local copy failed"
                );
                StorageError::CopyFailed(e.to_string())
            }
        })?;

        tracing::debug!(from_key = %from_key, to_key = %to_key, "Local copy successful");
        Ok(to_key.to_string())
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        let path = self.key_to_path(key)?;
        fs::remove_file(&path).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => StorageError::NotFound(key.to_string()),
            _ => StorageError::DeleteFailed(e.to_string()),
        })
    }

    async fn exists(&self, key: &str) -> StorageResult<bool> {
        let path = self.key_to_path(key)?;
        Ok(fs::try_exists(&path).await?)
    }

    /// Local files are served directly; the URL is stable rather than signed,
    /// so the expiry is advisory only.
    async fn presigned_url(&self, key: &str, _expires_in: Duration) -> StorageResult<String> {
        if !self.exists(key).await? {
            return Err(StorageError::NotFound(key.to_string()));
        }
        Ok(self.generate_url(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_storage() -> (tempfile::TempDir, LocalStorage) {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path(), "http://localhost:3000/media".to_string())
            .await
            .unwrap();
        (dir, storage)
    }

    #[tokio::test]
    async fn test_upload_and_download() {
        let (_dir, storage) = test_storage().await;
        let url = storage
            .upload("uploads/v1/clip.mp4", b"fake video".to_vec(), "video/mp4")
            .await
            .unwrap();
        assert_eq!(url, "http://localhost:3000/media/uploads/v1/clip.mp4");

        let data = storage.download("uploads/v1/clip.mp4").await.unwrap();
        assert_eq!(data, b"fake video");
    }

    #[tokio::test]
    async fn test_download_missing_is_not_found() {
        let (_dir, storage) = test_storage().await;
        let err = storage.download("uploads/missing.mp4").await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_copy_relocates_artifact() {
        let (_dir, storage) = test_storage().await;
        storage
            .upload("raw/v1/out.zip", b"frames".to_vec(), "application/zip")
            .await
            .unwrap();

        let target = storage
            .copy("raw/v1/out.zip", "processed-videos/v1/clip_frames.zip")
            .await
            .unwrap();
        assert_eq!(target, "processed-videos/v1/clip_frames.zip");

        let data = storage
            .download("processed-videos/v1/clip_frames.zip")
            .await
            .unwrap();
        assert_eq!(data, b"frames");
    }

    #[tokio::test]
    async fn test_copy_overwrites_existing_target() {
        let (_dir, storage) = test_storage().await;
        storage
            .upload("raw/v1/out.zip", b"new frames".to_vec(), "application/zip")
            .await
            .unwrap();
        storage
            .upload(
                "processed-videos/v1/clip_frames.zip",
                b"old frames".to_vec(),
                "application/zip",
            )
            .await
            .unwrap();

        storage
            .copy("raw/v1/out.zip", "processed-videos/v1/clip_frames.zip")
            .await
            .unwrap();
        let data = storage
            .download("processed-videos/v1/clip_frames.zip")
            .await
            .unwrap();
        assert_eq!(data, b"new frames");
    }

    #[tokio::test]
    async fn test_copy_missing_source_is_not_found() {
        let (_dir, storage) = test_storage().await;
        let err = storage
            .copy("raw/missing.zip", "processed-videos/v1/x_frames.zip")
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_traversal_keys_are_rejected() {
        let (_dir, storage) = test_storage().await;
        let err = storage.download("../etc/passwd").await.unwrap_err();
        assert!(matches!(err, StorageError::InvalidKey(_)));

        let err = storage.download("/etc/passwd").await.unwrap_err();
        assert!(matches!(err, StorageError::InvalidKey(_)));

        let err = storage
            .download("uploads/../../etc/passwd")
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::InvalidKey(_)));
    }

    #[tokio::test]
    async fn test_exists_and_delete() {
        let (_dir, storage) = test_storage().await;
        storage
            .upload("uploads/v1/clip.mp4", b"x".to_vec(), "video/mp4")
            .await
            .unwrap();
        assert!(storage.exists("uploads/v1/clip.mp4").await.unwrap());

        storage.delete("uploads/v1/clip.mp4").await.unwrap();
        assert!(!storage.exists("uploads/v1/clip.mp4").await.unwrap());
    }

    #[tokio::test]
    async fn test_presigned_url_requires_existing_object() {
        let (_dir, storage) = test_storage().await;
        let err = storage
            .presigned_url("uploads/missing.mp4", Duration::from_secs(900))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::NotFound(_)));

        storage
            .upload("uploads/v1/clip.mp4", b"x".to_vec(), "video/mp4")
            .await
            .unwrap();
        let url = storage
            .presigned_url("uploads/v1/clip.mp4", Duration::from_secs(900))
            .await
            .unwrap();
        assert_eq!(url, "http://localhost:3000/media/uploads/v1/clip.mp4");
    }
}
