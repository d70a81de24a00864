//! Shared key generation for storage backends.
//!
//! Raw uploads live under `uploads/{video_id}/{filename}`; processed
//! artifacts land at `processed-videos/{video_id}/{stem}_frames.zip`, where
//! `{stem}` is the original filename without its extension, or the video id
//! itself when no original filename is known. The processed key is a stable
//! contract: the worker, the download endpoint, and redelivered result
//! messages all derive the same key for the same video.

use clipdock_core::constants::{PROCESSED_VIDEOS_PREFIX, UPLOADS_PREFIX};
use clipdock_core::validation::strip_extension;

/// Storage key for a raw upload.
pub fn upload_key(video_id: &str, filename: &str) -> String {
    format!("{}/{}/{}", UPLOADS_PREFIX, video_id, filename)
}

/// Deterministic storage key for the processed frame archive of a video.
pub fn processed_artifact_key(video_id: &str, original_filename: Option<&str>) -> String {
    let stem = match original_filename.filter(|name| !name.trim().is_empty()) {
        Some(name) => strip_extension(name),
        None => video_id,
    };
    format!("{}/{}/{}_frames.zip", PROCESSED_VIDEOS_PREFIX, video_id, stem)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_key() {
        assert_eq!(upload_key("v1", "clip.mp4"), "uploads/v1/clip.mp4");
    }

    #[test]
    fn test_processed_key_strips_extension() {
        assert_eq!(
            processed_artifact_key("v1", Some("clip.mp4")),
            "processed-videos/v1/clip_frames.zip"
        );
    }

    #[test]
    fn test_processed_key_falls_back_to_video_id() {
        assert_eq!(
            processed_artifact_key("v1", None),
            "processed-videos/v1/v1_frames.zip"
        );
        assert_eq!(
            processed_artifact_key("v1", Some("   ")),
            "processed-videos/v1/v1_frames.zip"
        );
    }

    #[test]
    fn test_processed_key_is_stable_across_calls() {
        let first = processed_artifact_key("v1", Some("clip.mp4"));
        let second = processed_artifact_key("v1", Some("clip.mp4"));
        assert_eq!(first, second);
    }

    #[test]
    fn test_processed_key_keeps_inner_dots() {
        assert_eq!(
            processed_artifact_key("v2", Some("my.holiday.mov")),
            "processed-videos/v2/my.holiday_frames.zip"
        );
    }
}
