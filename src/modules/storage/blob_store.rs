use async_trait::async_trait;

use crate::core::error::Result;

/// Operations the attachment subsystem needs from an object store.
///
/// Implemented by [`MinioStore`](crate::modules::storage::MinioStore) in
/// production and by in-memory mocks in tests.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Upload one object, overwriting any existing object at the same path.
    async fn upload(&self, path: &str, data: &[u8], content_type: &str) -> Result<()>;

    /// Derive the public URL for a path. Does not check that the object
    /// exists.
    fn public_url(&self, path: &str) -> String;

    /// Create a time-limited download URL. `download_filename` sets the
    /// filename offered by the browser on download.
    async fn signed_url(&self, path: &str, download_filename: Option<&str>) -> Result<String>;

    /// Remove objects. Removing an already-absent path is not an error.
    async fn remove(&self, paths: &[String]) -> Result<()>;

    /// Byte size of an object, or `None` when it cannot be determined.
    /// Never fails; listing callers treat the size as optional.
    async fn probe_content_length(&self, path: &str) -> Option<i64>;
}
