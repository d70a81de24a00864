//! Configuration module
//!
//! Environment-driven configuration for the API server, storage backends,
//! the result queue consumer, and outbound collaborator endpoints.

use std::env;

use anyhow::{bail, Context, Result};

use crate::constants;

const DEFAULT_SERVER_PORT: u16 = 3000;
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 20;
const DEFAULT_RESULT_QUEUE_WAIT_SECS: i32 = 20;
const DEFAULT_MAX_IN_FLIGHT_RESULTS: usize = 8;
const DEFAULT_NOTIFY_TIMEOUT_SECS: u64 = 10;

/// Storage backend selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Local,
    S3,
}

impl StorageBackend {
    fn parse(value: &str) -> Result<Self> {
        match value.to_ascii_lowercase().as_str() {
            "local" => Ok(StorageBackend::Local),
            "s3" => Ok(StorageBackend::S3),
            other => bail!("Unknown storage backend '{}' (expected 'local' or 's3')", other),
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub server_port: u16,
    pub environment: String,

    pub database_url: String,
    pub db_max_connections: u32,

    pub storage_backend: StorageBackend,
    pub local_storage_path: String,
    pub local_storage_base_url: String,
    pub s3_bucket: Option<String>,
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>,

    pub max_video_size_bytes: usize,
    pub video_allowed_extensions: Vec<String>,
    pub video_allowed_content_types: Vec<String>,

    pub download_url_ttl_secs: u64,

    /// SQS queue carrying worker result messages. The consumer is disabled
    /// when unset (results can still arrive via the internal API).
    pub result_queue_url: Option<String>,
    pub result_queue_wait_secs: i32,
    pub max_in_flight_results: usize,

    /// External processing worker endpoint; dispatch is logged only when unset.
    pub worker_endpoint: Option<String>,

    /// Status-change notification webhook; notifications are logged only when unset.
    pub notify_webhook_url: Option<String>,
    pub notify_timeout_secs: u64,
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_or(key: &str, default: &str) -> String {
    env_opt(key).unwrap_or_else(|| default.to_string())
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env_opt(key) {
        Some(raw) => raw
            .parse::<T>()
            .with_context(|| format!("Invalid value for {}: {}", key, raw)),
        None => Ok(default),
    }
}

fn env_list(key: &str, defaults: &[&str]) -> Vec<String> {
    match env_opt(key) {
        Some(raw) => raw
            .split(',')
            .map(|item| item.trim().to_ascii_lowercase())
            .filter(|item| !item.is_empty())
            .collect(),
        None => defaults.iter().map(|s| s.to_string()).collect(),
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let config = Config {
            server_port: env_parse("SERVER_PORT", DEFAULT_SERVER_PORT)?,
            environment: env_or("ENVIRONMENT", "development"),

            database_url: env_opt("DATABASE_URL")
                .context("DATABASE_URL must be set")?,
            db_max_connections: env_parse("DB_MAX_CONNECTIONS", DEFAULT_DB_MAX_CONNECTIONS)?,

            storage_backend: StorageBackend::parse(&env_or("STORAGE_BACKEND", "local"))?,
            local_storage_path: env_or("LOCAL_STORAGE_PATH", "./data/media"),
            local_storage_base_url: env_or(
                "LOCAL_STORAGE_BASE_URL",
                "http://localhost:3000/media",
            ),
            s3_bucket: env_opt("S3_BUCKET"),
            s3_region: env_opt("S3_REGION"),
            s3_endpoint: env_opt("S3_ENDPOINT"),

            max_video_size_bytes: env_parse(
                "MAX_VIDEO_SIZE_BYTES",
                constants::DEFAULT_MAX_VIDEO_SIZE_BYTES,
            )?,
            video_allowed_extensions: env_list(
                "VIDEO_ALLOWED_EXTENSIONS",
                constants::DEFAULT_VIDEO_EXTENSIONS,
            ),
            video_allowed_content_types: env_list(
                "VIDEO_ALLOWED_CONTENT_TYPES",
                constants::DEFAULT_VIDEO_CONTENT_TYPES,
            ),

            download_url_ttl_secs: env_parse(
                "DOWNLOAD_URL_TTL_SECS",
                constants::DEFAULT_DOWNLOAD_URL_TTL_SECS,
            )?,

            result_queue_url: env_opt("RESULT_QUEUE_URL"),
            result_queue_wait_secs: env_parse(
                "RESULT_QUEUE_WAIT_SECS",
                DEFAULT_RESULT_QUEUE_WAIT_SECS,
            )?,
            max_in_flight_results: env_parse(
                "MAX_IN_FLIGHT_RESULTS",
                DEFAULT_MAX_IN_FLIGHT_RESULTS,
            )?,

            worker_endpoint: env_opt("WORKER_ENDPOINT"),

            notify_webhook_url: env_opt("NOTIFY_WEBHOOK_URL"),
            notify_timeout_secs: env_parse("NOTIFY_TIMEOUT_SECS", DEFAULT_NOTIFY_TIMEOUT_SECS)?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Cross-field validation, run once at startup.
    pub fn validate(&self) -> Result<()> {
        if self.storage_backend == StorageBackend::S3 {
            if self.s3_bucket.is_none() {
                bail!("S3_BUCKET must be set when STORAGE_BACKEND=s3");
            }
            if self.s3_region.is_none() {
                bail!("S3_REGION must be set when STORAGE_BACKEND=s3");
            }
        }
        if self.max_video_size_bytes == 0 {
            bail!("MAX_VIDEO_SIZE_BYTES must be greater than zero");
        }
        Ok(())
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> Config {
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
            max_video_size_bytes: 1024,
            video_allowed_extensions: vec!["mp4".to_string()],
            video_allowed_content_types: vec!["video/mp4".to_string()],
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
    fn test_storage_backend_parse() {
        assert_eq!(StorageBackend::parse("local").unwrap(), StorageBackend::Local);
        assert_eq!(StorageBackend::parse("S3").unwrap(), StorageBackend::S3);
        assert!(StorageBackend::parse("gcs").is_err());
    }

    #[test]
    fn test_validate_requires_s3_settings() {
        let mut config = base_config();
        config.storage_backend = StorageBackend::S3;
        assert!(config.validate().is_err());

        config.s3_bucket = Some("clipdock-media".to_string());
        assert!(config.validate().is_err());

        config.s3_region = Some("eu-west-1".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_size_limit() {
        let mut config = base_config();
        config.max_video_size_bytes = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_is_production() {
        let mut config = base_config();
        assert!(!config.is_production());
        config.environment = "Production".to_string();
        assert!(config.is_production());
        config.environment = "prod".to_string();
        assert!(config.is_production());
    }
}
