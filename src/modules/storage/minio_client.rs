//! MinIO/S3-compatible storage client
//!
//! Provides attachment blob upload, removal, and presigned URL generation
//! for MinIO or any S3-compatible storage service.
//!
//! Uses rust-s3 crate for lightweight S3 operations.

use std::collections::HashMap;

use async_trait::async_trait;
use reqwest::Client;
use s3::creds::Credentials;
use s3::{Bucket, Region};
use tracing::{debug, warn};

use crate::core::config::StorageConfig;
use crate::core::error::{AppError, Result};
use crate::modules::storage::BlobStore;

pub struct MinioStore {
    bucket: Box<Bucket>,
    bucket_name: String,
    public_endpoint: String,
    signed_url_ttl_secs: u32,
    /// HTTP client for content-length probes against presigned URLs
    http_client: Client,
}

impl MinioStore {
    /// Create a new storage client from configuration.
    ///
    /// Does not create the bucket: a missing bucket is a deployment problem
    /// and surfaces as [`AppError::BucketNotFound`] on first use.
    pub fn new(config: &StorageConfig) -> Result<Self> {
        let credentials = Credentials::new(
            Some(&config.access_key),
            Some(&config.secret_key),
            None,
            None,
            None,
        )
        .map_err(|e| AppError::Store(format!("Failed to create storage credentials: {}", e)))?;

        let region = Region::Custom {
            region: config.region.clone(),
            endpoint: config.endpoint.clone(),
        };

        let mut bucket = Bucket::new(&config.bucket, region, credentials)
            .map_err(|e| AppError::Store(format!("Failed to open bucket '{}': {}", config.bucket, e)))?;

        // Use path-style URLs for MinIO (http://endpoint/bucket instead of http://bucket.endpoint)
        bucket.set_path_style();

        let http_client = Client::builder()
            .build()
            .map_err(|e| AppError::Store(format!("Failed to create HTTP client: {}", e)))?;

        debug!(
            "Storage client initialized for endpoint: {}, bucket: {}",
            config.endpoint, config.bucket
        );

        Ok(Self {
            bucket,
            bucket_name: config.bucket.clone(),
            public_endpoint: config.public_endpoint.clone(),
            signed_url_ttl_secs: config.signed_url_ttl_secs,
            http_client,
        })
    }

    /// Map a store failure to the error taxonomy. A missing bucket is a
    /// configuration problem and gets its own variant.
    fn classify_store_error(&self, op: &str, path: &str, err: impl std::fmt::Display) -> AppError {
        let text = err.to_string();
        if text.contains("NoSuchBucket") {
            AppError::BucketNotFound(self.bucket_name.clone())
        } else {
            AppError::Store(format!("Failed to {} '{}': {}", op, path, text))
        }
    }
}

#[async_trait]
impl BlobStore for MinioStore {
    async fn upload(&self, path: &str, data: &[u8], content_type: &str) -> Result<()> {
        self.bucket
            .put_object_with_content_type(path, data, content_type)
            .await
            .map_err(|e| self.classify_store_error("upload", path, e))?;

        debug!("Uploaded '{}' to bucket '{}'", path, self.bucket_name);
        Ok(())
    }

    fn public_url(&self, path: &str) -> String {
        format!("{}/{}/{}", self.public_endpoint, self.bucket_name, path)
    }

    async fn signed_url(&self, path: &str, download_filename: Option<&str>) -> Result<String> {
        let query = download_filename.map(|name| {
            let mut params = HashMap::new();
            params.insert(
                "response-content-disposition".to_string(),
                format!("attachment; filename=\"{}\"", urlencoding::encode(name)),
            );
            params
        });

        self.bucket
            .presign_get(path, self.signed_url_ttl_secs, query)
            .await
            .map_err(|e| self.classify_store_error("presign", path, e))
    }

    async fn remove(&self, paths: &[String]) -> Result<()> {
        for path in paths {
            match self.bucket.delete_object(path).await {
                Ok(_) => debug!("Removed '{}' from bucket '{}'", path, self.bucket_name),
                Err(e) => {
                    let text = e.to_string();
                    if text.contains("404") || text.contains("NoSuchKey") {
                        // Already absent; removal is idempotent.
                        debug!("Object '{}' already absent", path);
                    } else if text.contains("NoSuchBucket") {
                        return Err(AppError::BucketNotFound(self.bucket_name.clone()));
                    } else {
                        return Err(AppError::Store(format!(
                            "Failed to remove '{}': {}",
                            path, text
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    async fn probe_content_length(&self, path: &str) -> Option<i64> {
        let url = match self.signed_url(path, None).await {
            Ok(url) => url,
            Err(e) => {
                warn!("Could not presign '{}' for size probe: {}", path, e);
                return None;
            }
        };

        let response = match self.http_client.head(&url).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!("Size probe for '{}' failed: {}", path, e);
                return None;
            }
        };

        if !response.status().is_success() {
            warn!(
                "Size probe for '{}' returned status {}",
                path,
                response.status()
            );
            return None;
        }

        response
            .headers()
            .get(reqwest::header::CONTENT_LENGTH)?
            .to_str()
            .ok()?
            .parse()
            .ok()
    }
}
