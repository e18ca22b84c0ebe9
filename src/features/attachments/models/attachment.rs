use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

use crate::shared::sanitize::file_name_from_path;

/// Database model for attachment metadata
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Attachment {
    pub id: i64,
    /// Object-store key, unique and immutable after creation
    pub storage_path: String,
    pub mime_type: String,
    /// Filename as uploaded; absent for legacy rows
    pub original_name: Option<String>,
    pub description: Option<String>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

impl Attachment {
    /// User-visible filename: the original name when recorded, otherwise the
    /// last segment of the storage path.
    pub fn display_name(&self) -> &str {
        self.original_name
            .as_deref()
            .unwrap_or_else(|| file_name_from_path(&self.storage_path))
    }
}

/// Data for inserting one attachment row
#[derive(Debug, Clone)]
pub struct NewAttachment {
    pub storage_path: String,
    pub mime_type: String,
    pub original_name: Option<String>,
    pub description: Option<String>,
    pub created_by: Uuid,
}
