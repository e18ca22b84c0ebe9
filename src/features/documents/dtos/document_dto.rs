use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::features::attachments::models::Attachment;

/// Request DTO for creating a document folder
#[derive(Debug, Deserialize, Validate)]
pub struct CreateFolderDto {
    #[validate(length(min = 1, max = 255, message = "name must be 1-255 characters"))]
    pub name: String,
    pub description: Option<String>,
    /// None makes the folder visible across all projects
    pub project_id: Option<i64>,
}

/// Request DTO for renaming or redescribing a folder
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateFolderDto {
    #[validate(length(min = 1, max = 255, message = "name must be 1-255 characters"))]
    pub name: String,
    pub description: Option<String>,
}

/// One document shaped for a folder listing, with side-resolved fields
#[derive(Debug, Serialize)]
pub struct DocumentWithAuthor {
    pub id: i64,
    /// User-visible filename
    pub name: String,
    pub url: String,
    pub mime_type: String,
    pub description: Option<String>,
    /// Display name of the uploader; absent when no profile exists
    pub author_name: Option<String>,
    /// Byte size, probed best-effort; absent when the probe failed
    pub file_size: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl DocumentWithAuthor {
    pub fn from_parts(
        attachment: &Attachment,
        url: String,
        author_name: Option<String>,
        file_size: Option<i64>,
    ) -> Self {
        Self {
            id: attachment.id,
            name: attachment.display_name().to_string(),
            url,
            mime_type: attachment.mime_type.clone(),
            description: attachment.description.clone(),
            author_name,
            file_size,
            created_at: attachment.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use uuid::Uuid;

    use super::*;

    #[test]
    fn empty_folder_name_is_rejected() {
        let dto = CreateFolderDto {
            name: String::new(),
            description: None,
            project_id: None,
        };
        assert!(dto.validate().is_err());
    }

    #[test]
    fn valid_folder_name_passes() {
        let dto = CreateFolderDto {
            name: "Acts and protocols".to_string(),
            description: Some("Hand-over documentation".to_string()),
            project_id: Some(3),
        };
        assert!(dto.validate().is_ok());
    }

    #[test]
    fn shaping_derives_name_from_path_when_original_missing() {
        let attachment = Attachment {
            id: 10,
            storage_path: "documents/1/1700000000000_protokol.pdf".to_string(),
            mime_type: "application/pdf".to_string(),
            original_name: None,
            description: None,
            created_by: Uuid::nil(),
            created_at: Utc::now(),
        };

        let doc = DocumentWithAuthor::from_parts(
            &attachment,
            "http://blobs.test/attachments/documents/1/1700000000000_protokol.pdf".to_string(),
            Some("Anna Berg".to_string()),
            None,
        );

        assert_eq!(doc.name, "1700000000000_protokol.pdf");
        assert_eq!(doc.author_name.as_deref(), Some("Anna Berg"));
        assert_eq!(doc.file_size, None);

        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json["file_size"], serde_json::Value::Null);
    }
}
