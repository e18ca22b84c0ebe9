use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// Database model for document folders
///
/// A folder is a virtual grouping of `documents/`-prefixed attachments;
/// membership lives in the `document_folder_files` junction table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct DocumentFolder {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    /// None makes the folder visible across all projects
    pub project_id: Option<i64>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Database model for the folder-file junction table
#[derive(Debug, Clone, FromRow)]
pub struct DocumentFolderFile {
    pub folder_id: i64,
    pub file_id: i64,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}
