/// Seconds a signed download URL stays valid. Callers re-request per use;
/// signed URLs are never cached beyond this window.
pub const SIGNED_URL_TTL_SECS: u32 = 60;

/// Bucket used when the configured name is a known placeholder.
pub const DEFAULT_BUCKET: &str = "attachments";

/// Values that indicate an infrastructure base path was pasted into the
/// bucket setting (the trailing segments of a typical S3 gateway URL).
pub const PLACEHOLDER_BUCKET_NAMES: &[&str] = &["s3", "storage", "v1", "object"];

/// Storage-path prefix that marks an attachment as a document.
pub const DOCUMENTS_PREFIX: &str = "documents";
