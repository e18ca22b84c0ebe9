use std::env;

use reqwest::Url;

use crate::shared::constants::{DEFAULT_BUCKET, PLACEHOLDER_BUCKET_NAMES, SIGNED_URL_TTL_SECS};

#[derive(Debug, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_secs: u64,
    pub idle_timeout_secs: u64,
    pub max_lifetime_secs: u64,
}

/// S3-compatible storage configuration for attachment blobs
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Storage endpoint URL
    pub endpoint: String,
    /// Public endpoint URL for direct file links (defaults to endpoint)
    pub public_endpoint: String,
    /// Access key for authentication
    pub access_key: String,
    /// Secret key for authentication
    pub secret_key: String,
    /// Bucket name, resolved through [`resolve_bucket_name`]
    pub bucket: String,
    /// AWS region (for S3 compatibility)
    pub region: String,
    /// Signed URL expiry time in seconds
    pub signed_url_ttl_secs: u32,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        // Load .env file if exists, ignore if not found (optional for production)
        if let Err(e) = dotenvy::dotenv() {
            if !e.to_string().contains("not found") {
                eprintln!("Warning: Error loading .env file: {}", e);
            }
        }

        Ok(Config {
            database: DatabaseConfig::from_env()?,
            storage: StorageConfig::from_env()?,
        })
    }
}

impl DatabaseConfig {
    const DEFAULT_MAX_CONNECTIONS: u32 = 10;
    const DEFAULT_MIN_CONNECTIONS: u32 = 1;
    const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 5;
    const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 600; // 10 minutes
    const DEFAULT_MAX_LIFETIME_SECS: u64 = 1800; // 30 minutes

    pub fn from_env() -> Result<Self, String> {
        let url = env::var("DATABASE_URL").map_err(|_| "DATABASE_URL must be set".to_string())?;

        let max_connections = env::var("DB_MAX_CONNECTIONS")
            .unwrap_or_else(|_| Self::DEFAULT_MAX_CONNECTIONS.to_string())
            .parse::<u32>()
            .map_err(|_| "DB_MAX_CONNECTIONS must be a valid number".to_string())?;

        let min_connections = env::var("DB_MIN_CONNECTIONS")
            .unwrap_or_else(|_| Self::DEFAULT_MIN_CONNECTIONS.to_string())
            .parse::<u32>()
            .map_err(|_| "DB_MIN_CONNECTIONS must be a valid number".to_string())?;

        let acquire_timeout_secs = env::var("DB_ACQUIRE_TIMEOUT_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_ACQUIRE_TIMEOUT_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "DB_ACQUIRE_TIMEOUT_SECS must be a valid number".to_string())?;

        let idle_timeout_secs = env::var("DB_IDLE_TIMEOUT_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_IDLE_TIMEOUT_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "DB_IDLE_TIMEOUT_SECS must be a valid number".to_string())?;

        let max_lifetime_secs = env::var("DB_MAX_LIFETIME_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_MAX_LIFETIME_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "DB_MAX_LIFETIME_SECS must be a valid number".to_string())?;

        Ok(Self {
            url,
            max_connections,
            min_connections,
            acquire_timeout_secs,
            idle_timeout_secs,
            max_lifetime_secs,
        })
    }
}

impl StorageConfig {
    pub fn from_env() -> Result<Self, String> {
        let endpoint =
            env::var("STORAGE_ENDPOINT").unwrap_or_else(|_| "http://localhost:9000".to_string());

        // Public endpoint defaults to the main endpoint if not specified
        let public_endpoint =
            env::var("STORAGE_PUBLIC_ENDPOINT").unwrap_or_else(|_| endpoint.clone());

        let access_key =
            env::var("STORAGE_ACCESS_KEY").unwrap_or_else(|_| "minioadmin".to_string());

        let secret_key =
            env::var("STORAGE_SECRET_KEY").unwrap_or_else(|_| "minioadmin".to_string());

        let bucket = resolve_bucket_name(
            &env::var("STORAGE_BUCKET").unwrap_or_else(|_| DEFAULT_BUCKET.to_string()),
        );

        let region = env::var("STORAGE_REGION").unwrap_or_else(|_| "us-east-1".to_string());

        let signed_url_ttl_secs = env::var("SIGNED_URL_TTL_SECS")
            .unwrap_or_else(|_| SIGNED_URL_TTL_SECS.to_string())
            .parse::<u32>()
            .map_err(|_| "SIGNED_URL_TTL_SECS must be a valid number".to_string())?;

        Ok(Self {
            endpoint,
            public_endpoint,
            access_key,
            secret_key,
            bucket,
            region,
            signed_url_ttl_secs,
        })
    }
}

/// Resolve the configured bucket value into an actual bucket name.
///
/// Operators sometimes paste an infrastructure base path (e.g. the S3 gateway
/// URL) into the bucket setting. A URL-shaped value is reduced to its last
/// path segment, and a segment matching a known placeholder is replaced with
/// the application default bucket.
pub fn resolve_bucket_name(raw: &str) -> String {
    let candidate = match extract_bucket_from_url(raw) {
        Ok(Some(segment)) => segment,
        Ok(None) => raw.to_string(),
        // Not a URL: the raw value is already a bucket name.
        Err(_) => raw.to_string(),
    };

    if PLACEHOLDER_BUCKET_NAMES
        .iter()
        .any(|placeholder| candidate.eq_ignore_ascii_case(placeholder))
    {
        DEFAULT_BUCKET.to_string()
    } else {
        candidate
    }
}

/// Extract the last non-empty path segment of a URL-shaped bucket setting.
///
/// `Err` means the value does not parse as a URL; `Ok(None)` means it parsed
/// but has no usable path segment.
fn extract_bucket_from_url(raw: &str) -> Result<Option<String>, String> {
    let parsed = Url::parse(raw).map_err(|e| e.to_string())?;
    Ok(parsed
        .path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).next_back())
        .map(|s| s.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_bucket_name_passes_through() {
        assert_eq!(resolve_bucket_name("media"), "media");
        assert_eq!(resolve_bucket_name("claim-files"), "claim-files");
    }

    #[test]
    fn url_value_reduces_to_last_segment() {
        assert_eq!(
            resolve_bucket_name("https://host.example/files/media"),
            "media"
        );
    }

    #[test]
    fn placeholder_segment_falls_back_to_default() {
        assert_eq!(
            resolve_bucket_name("https://host.example/storage/v1/s3"),
            DEFAULT_BUCKET
        );
        assert_eq!(resolve_bucket_name("S3"), DEFAULT_BUCKET);
        assert_eq!(resolve_bucket_name("storage"), DEFAULT_BUCKET);
    }

    #[test]
    fn non_url_value_falls_back_to_raw() {
        assert_eq!(resolve_bucket_name("not a url"), "not a url");
    }

    #[test]
    fn url_without_path_falls_back_to_raw() {
        assert_eq!(
            resolve_bucket_name("https://host.example"),
            "https://host.example"
        );
    }
}
