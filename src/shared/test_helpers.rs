#[cfg(test)]
use std::collections::HashMap;
#[cfg(test)]
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
#[cfg(test)]
use std::sync::Mutex;

#[cfg(test)]
use async_trait::async_trait;
#[cfg(test)]
use chrono::Utc;

#[cfg(test)]
use crate::core::error::{AppError, Result};
#[cfg(test)]
use crate::features::attachments::models::{
    Attachment, EntityKind, LinkedAttachment, NewAttachment, NewLink,
};
#[cfg(test)]
use crate::features::attachments::services::{AttachmentLinker, AttachmentStore};
#[cfg(test)]
use crate::modules::storage::BlobStore;

/// In-memory blob store counting every trait call, with per-path fault
/// injection. Paths embed timestamps, so failure markers match by substring.
#[cfg(test)]
#[derive(Default)]
pub struct MockBlobStore {
    calls: AtomicUsize,
    uploads: Mutex<Vec<(String, usize, String)>>,
    removed: Mutex<Vec<String>>,
    sizes: Mutex<HashMap<String, i64>>,
    fail_upload_markers: Mutex<Vec<String>>,
    fail_remove_markers: Mutex<Vec<String>>,
    fail_probe_markers: Mutex<Vec<String>>,
    bucket_missing: AtomicBool,
}

#[cfg(test)]
impl MockBlobStore {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn uploaded_paths(&self) -> Vec<String> {
        self.uploads
            .lock()
            .unwrap()
            .iter()
            .map(|(path, _, _)| path.clone())
            .collect()
    }

    pub fn removed_paths(&self) -> Vec<String> {
        self.removed.lock().unwrap().clone()
    }

    /// Make a blob visible to size probes without going through upload.
    pub fn seed_blob(&self, path: &str, size: i64) {
        self.sizes.lock().unwrap().insert(path.to_string(), size);
    }

    pub fn fail_upload_containing(&self, marker: &str) {
        self.fail_upload_markers
            .lock()
            .unwrap()
            .push(marker.to_string());
    }

    pub fn fail_remove_containing(&self, marker: &str) {
        self.fail_remove_markers
            .lock()
            .unwrap()
            .push(marker.to_string());
    }

    pub fn fail_probe_containing(&self, marker: &str) {
        self.fail_probe_markers
            .lock()
            .unwrap()
            .push(marker.to_string());
    }

    pub fn simulate_missing_bucket(&self) {
        self.bucket_missing.store(true, Ordering::SeqCst);
    }

    fn matches(markers: &Mutex<Vec<String>>, path: &str) -> bool {
        markers
            .lock()
            .unwrap()
            .iter()
            .any(|marker| path.contains(marker.as_str()))
    }
}

#[cfg(test)]
#[async_trait]
impl BlobStore for MockBlobStore {
    async fn upload(&self, path: &str, data: &[u8], content_type: &str) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.bucket_missing.load(Ordering::SeqCst) {
            return Err(AppError::BucketNotFound("attachments".to_string()));
        }
        if Self::matches(&self.fail_upload_markers, path) {
            return Err(AppError::Store(format!(
                "Failed to upload '{}': injected failure",
                path
            )));
        }
        self.sizes
            .lock()
            .unwrap()
            .insert(path.to_string(), data.len() as i64);
        self.uploads.lock().unwrap().push((
            path.to_string(),
            data.len(),
            content_type.to_string(),
        ));
        Ok(())
    }

    fn public_url(&self, path: &str) -> String {
        format!("http://blobs.test/attachments/{}", path)
    }

    async fn signed_url(&self, path: &str, download_filename: Option<&str>) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(format!(
            "http://blobs.test/signed/{}?dl={}",
            path,
            download_filename.unwrap_or("")
        ))
    }

    async fn remove(&self, paths: &[String]) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        for path in paths {
            if Self::matches(&self.fail_remove_markers, path) {
                return Err(AppError::Store(format!(
                    "Failed to remove '{}': injected failure",
                    path
                )));
            }
            // Absent paths are removed without complaint.
            self.sizes.lock().unwrap().remove(path);
            self.removed.lock().unwrap().push(path.clone());
        }
        Ok(())
    }

    async fn probe_content_length(&self, path: &str) -> Option<i64> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if Self::matches(&self.fail_probe_markers, path) {
            return None;
        }
        self.sizes.lock().unwrap().get(path).copied()
    }
}

/// In-memory attachment metadata store with sequential ids.
#[cfg(test)]
#[derive(Default)]
pub struct MockAttachmentStore {
    calls: AtomicUsize,
    next_id: AtomicI64,
    rows: Mutex<Vec<Attachment>>,
    fail_insert: AtomicBool,
}

#[cfg(test)]
impl MockAttachmentStore {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn fail_next_insert(&self) {
        self.fail_insert.store(true, Ordering::SeqCst);
    }
}

#[cfg(test)]
#[async_trait]
impl AttachmentStore for MockAttachmentStore {
    async fn insert_many(&self, rows: Vec<NewAttachment>) -> Result<Vec<Attachment>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_insert.swap(false, Ordering::SeqCst) {
            return Err(AppError::Repository(sqlx::Error::PoolClosed));
        }
        let mut created = Vec::with_capacity(rows.len());
        for row in rows {
            let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
            created.push(Attachment {
                id,
                storage_path: row.storage_path,
                mime_type: row.mime_type,
                original_name: row.original_name,
                description: row.description,
                created_by: row.created_by,
                created_at: Utc::now(),
            });
        }
        self.rows.lock().unwrap().extend(created.iter().cloned());
        Ok(created)
    }

    async fn update_description(&self, id: i64, description: Option<&str>) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut rows = self.rows.lock().unwrap();
        match rows.iter_mut().find(|a| a.id == id) {
            Some(row) => {
                row.description = description.map(|s| s.to_string());
                Ok(())
            }
            None => Err(AppError::NotFound(format!("Attachment {} not found", id))),
        }
    }

    async fn get_by_ids(&self, ids: &[i64]) -> Result<Vec<Attachment>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|a| ids.contains(&a.id))
            .cloned()
            .collect())
    }

    async fn delete_by_ids(&self, ids: &[i64]) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.rows.lock().unwrap().retain(|a| !ids.contains(&a.id));
        Ok(())
    }
}

/// In-memory link table for one parent kind.
#[cfg(test)]
pub struct MockLinker {
    kind: EntityKind,
    calls: AtomicUsize,
    links: Mutex<HashMap<i64, Vec<LinkedAttachment>>>,
}

#[cfg(test)]
impl MockLinker {
    pub fn new(kind: EntityKind) -> Self {
        Self {
            kind,
            calls: AtomicUsize::new(0),
            links: Mutex::new(HashMap::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub async fn links_of(&self, parent_id: i64) -> Vec<LinkedAttachment> {
        self.links
            .lock()
            .unwrap()
            .get(&parent_id)
            .cloned()
            .unwrap_or_default()
    }
}

#[cfg(test)]
#[async_trait]
impl AttachmentLinker for MockLinker {
    fn kind(&self) -> EntityKind {
        self.kind
    }

    async fn link(&self, parent_id: i64, links: &[NewLink]) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.links
            .lock()
            .unwrap()
            .entry(parent_id)
            .or_default()
            .extend(links.iter().map(|l| LinkedAttachment {
                attachment_id: l.attachment_id,
                type_id: l.type_id,
            }));
        Ok(())
    }

    async fn unlink(&self, parent_id: i64, attachment_id: i64) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(links) = self.links.lock().unwrap().get_mut(&parent_id) {
            links.retain(|l| l.attachment_id != attachment_id);
        }
        Ok(())
    }

    async fn unlink_all(&self, parent_id: i64) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.links.lock().unwrap().remove(&parent_id);
        Ok(())
    }

    async fn list_by_parent_ids(
        &self,
        parent_ids: &[i64],
    ) -> Result<HashMap<i64, Vec<LinkedAttachment>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let links = self.links.lock().unwrap();
        Ok(parent_ids
            .iter()
            .filter_map(|id| links.get(id).map(|l| (*id, l.clone())))
            .collect())
    }

    async fn set_type(&self, parent_id: i64, attachment_id: i64, type_id: i64) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.kind.requires_classification() {
            return Err(AppError::Validation(format!(
                "Attachments of {} carry no type classification",
                self.kind.path_prefix()
            )));
        }
        let mut links = self.links.lock().unwrap();
        let link = links
            .get_mut(&parent_id)
            .and_then(|l| l.iter_mut().find(|l| l.attachment_id == attachment_id));
        match link {
            Some(link) => {
                link.type_id = Some(type_id);
                Ok(())
            }
            None => Err(AppError::NotFound(format!(
                "Attachment {} is not linked to {} {}",
                attachment_id,
                self.kind.path_prefix(),
                parent_id
            ))),
        }
    }
}
