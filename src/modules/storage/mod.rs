//! Storage module for attachment blobs
//!
//! Provides the [`BlobStore`] seam and its MinIO/S3-compatible
//! implementation for uploads, removals, and presigned URL generation.

mod blob_store;
mod minio_client;

pub use blob_store::BlobStore;
pub use minio_client::MinioStore;
