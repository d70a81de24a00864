//! Shared constants.

/// Key prefix for raw uploads awaiting processing.
pub const UPLOADS_PREFIX: &str = "uploads";

/// Key prefix for processed artifacts in their stable, downloadable location.
pub const PROCESSED_VIDEOS_PREFIX: &str = "processed-videos";

/// Default maximum accepted upload size (500 MB).
pub const DEFAULT_MAX_VIDEO_SIZE_BYTES: usize = 500 * 1024 * 1024;

/// Default lifetime of issued download links.
pub const DEFAULT_DOWNLOAD_URL_TTL_SECS: u64 = 900;

/// Default file extensions accepted for upload.
pub const DEFAULT_VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "avi", "mkv", "webm"];

/// Default content types accepted for upload.
pub const DEFAULT_VIDEO_CONTENT_TYPES: &[&str] = &[
    "video/mp4",
    "video/quicktime",
    "video/x-msvideo",
    "video/x-matroska",
    "video/webm",
];
