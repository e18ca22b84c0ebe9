use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::features::attachments::models::RemoteAttachment;
use crate::modules::storage::BlobStore;

/// One attachment shaped for a parent entity's file list.
#[derive(Debug, Serialize)]
pub struct AttachmentDto {
    pub id: i64,
    /// User-visible filename
    pub name: String,
    /// Direct public URL; time-limited access goes through signed URLs
    pub url: String,
    pub mime_type: String,
    pub description: Option<String>,
    /// Link-row classification, when the parent kind carries one
    pub type_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl AttachmentDto {
    pub fn from_remote(remote: &RemoteAttachment, store: &dyn BlobStore) -> Self {
        Self {
            id: remote.attachment.id,
            name: remote.attachment.display_name().to_string(),
            url: store.public_url(&remote.attachment.storage_path),
            mime_type: remote.attachment.mime_type.clone(),
            description: remote.attachment.description.clone(),
            type_id: remote.type_id,
            created_at: remote.attachment.created_at,
        }
    }
}
