//! Upload validation
//!
//! Structural checks applied to an uploaded file before anything is stored:
//! size limits, extension and content-type allow-lists, and filename
//! sanitization.

use thiserror::Error;

use crate::config::Config;
use crate::error::AppError;

#[derive(Debug, Error)]
pub enum UploadValidationError {
    #[error("File is empty")]
    EmptyFile,

    #[error("File too large: {size} bytes exceeds max {max} bytes")]
    FileTooLarge { size: usize, max: usize },

    #[error("Missing file extension (filename: {0})")]
    MissingExtension(String),

    #[error("Invalid extension '{extension}', allowed: {allowed:?}")]
    InvalidExtension {
        extension: String,
        allowed: Vec<String>,
    },

    #[error("Invalid content type '{content_type}', allowed: {allowed:?}")]
    InvalidContentType {
        content_type: String,
        allowed: Vec<String>,
    },

    #[error("Invalid filename: {0}")]
    InvalidFilename(String),
}

impl From<UploadValidationError> for AppError {
    fn from(err: UploadValidationError) -> Self {
        AppError::InvalidRequest(err.to_string())
    }
}

/// Extract the lowercase extension of a filename, if present.
pub fn file_extension(filename: &str) -> Option<String> {
    filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .filter(|ext| !ext.is_empty())
}

/// Strip the final extension from a filename; the name is returned unchanged
/// when it has none.
pub fn strip_extension(filename: &str) -> &str {
    match filename.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => filename,
    }
}

/// Replace path separators and control characters so the stored filename
/// cannot escape its storage prefix.
pub fn sanitize_filename(filename: &str) -> String {
    filename
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect::<String>()
        .trim_matches(['.', ' '])
        .to_string()
}

/// Validate an uploaded video against the configured limits.
///
/// Returns the sanitized filename and the detected format (the lowercase
/// extension) on success.
pub fn validate_video_upload(
    filename: &str,
    content_type: &str,
    size: usize,
    config: &Config,
) -> Result<(String, String), UploadValidationError> {
    if size == 0 {
        return Err(UploadValidationError::EmptyFile);
    }
    if size > config.max_video_size_bytes {
        return Err(UploadValidationError::FileTooLarge {
            size,
            max: config.max_video_size_bytes,
        });
    }

    let sanitized = sanitize_filename(filename);
    if sanitized.is_empty() {
        return Err(UploadValidationError::InvalidFilename(
            filename.to_string(),
        ));
    }

    let extension = file_extension(&sanitized)
        .ok_or_else(|| UploadValidationError::MissingExtension(sanitized.clone()))?;
    if !config
        .video_allowed_extensions
        .iter()
        .any(|allowed| allowed == &extension)
    {
        return Err(UploadValidationError::InvalidExtension {
            extension,
            allowed: config.video_allowed_extensions.clone(),
        });
    }

    let normalized_type = content_type.to_ascii_lowercase();
    if !config
        .video_allowed_content_types
        .iter()
        .any(|allowed| allowed == &normalized_type)
    {
        return Err(UploadValidationError::InvalidContentType {
            content_type: content_type.to_string(),
            allowed: config.video_allowed_content_types.clone(),
        });
    }

    Ok((sanitized, extension))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StorageBackend;

    fn test_config() -> Config {
        Config {
            server_port: 3000,
            environment: "test".to_string(),
            database_url: "postgres://localhost/clipdock".to_string(),
            db_max_connections: 5,
            storage_backend: StorageBackend::Local,
            local_storage_path: "./data/media".to_string(),
            local_storage_base_url: "http://localhost:3000/media".to_string(),
            s3_bucket: None,
            s3_region: None,
            s3_endpoint: None,
            max_video_size_bytes: 1000,
            video_allowed_extensions: vec!["mp4".to_string(), "mov".to_string()],
            video_allowed_content_types: vec![
                "video/mp4".to_string(),
                "video/quicktime".to_string(),
            ],
            download_url_ttl_secs: 900,
            result_queue_url: None,
            result_queue_wait_secs: 20,
            max_in_flight_results: 8,
            worker_endpoint: None,
            notify_webhook_url: None,
            notify_timeout_secs: 10,
        }
    }

    #[test]
    fn test_accepts_valid_upload() {
        let (name, format) =
            validate_video_upload("clip.mp4", "video/mp4", 500, &test_config()).unwrap();
        assert_eq!(name, "clip.mp4");
        assert_eq!(format, "mp4");
    }

    #[test]
    fn test_rejects_empty_file() {
        let err = validate_video_upload("clip.mp4", "video/mp4", 0, &test_config()).unwrap_err();
        assert!(matches!(err, UploadValidationError::EmptyFile));
    }

    #[test]
    fn test_rejects_oversized_file() {
        let err = validate_video_upload("clip.mp4", "video/mp4", 2000, &test_config()).unwrap_err();
        assert!(matches!(
            err,
            UploadValidationError::FileTooLarge { size: 2000, max: 1000 }
        ));
    }

    #[test]
    fn test_rejects_bad_extension() {
        let err = validate_video_upload("clip.exe", "video/mp4", 10, &test_config()).unwrap_err();
        assert!(matches!(err, UploadValidationError::InvalidExtension { .. }));
    }

    #[test]
    fn test_rejects_missing_extension() {
        let err = validate_video_upload("clip", "video/mp4", 10, &test_config()).unwrap_err();
        assert!(matches!(err, UploadValidationError::MissingExtension(_)));
    }

    #[test]
    fn test_rejects_bad_content_type() {
        let err = validate_video_upload("clip.mp4", "application/zip", 10, &test_config())
            .unwrap_err();
        assert!(matches!(err, UploadValidationError::InvalidContentType { .. }));
    }

    #[test]
    fn test_sanitize_filename_strips_separators() {
        assert_eq!(sanitize_filename("../../etc/passwd"), "_.._etc_passwd");
        assert_eq!(sanitize_filename("a/b\\c.mp4"), "a_b_c.mp4");
        assert_eq!(sanitize_filename("clip.mp4"), "clip.mp4");
    }

    #[test]
    fn test_strip_extension() {
        assert_eq!(strip_extension("clip.mp4"), "clip");
        assert_eq!(strip_extension("archive.tar.gz"), "archive.tar");
        assert_eq!(strip_extension("noext"), "noext");
        assert_eq!(strip_extension(".hidden"), ".hidden");
    }

    #[test]
    fn test_file_extension() {
        assert_eq!(file_extension("clip.MP4"), Some("mp4".to_string()));
        assert_eq!(file_extension("noext"), None);
        assert_eq!(file_extension("trailing."), None);
    }
}
