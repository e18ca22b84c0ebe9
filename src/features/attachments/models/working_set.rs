use std::collections::HashMap;

use crate::features::attachments::models::Attachment;

/// An attachment already persisted and linked to the parent, as loaded.
#[derive(Debug, Clone)]
pub struct RemoteAttachment {
    pub attachment: Attachment,
    /// Link-row classification, when the parent kind carries one
    pub type_id: Option<i64>,
}

/// One locally picked file pending upload.
#[derive(Debug, Clone)]
pub struct QueuedFile {
    pub filename: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
    pub type_id: Option<i64>,
    pub description: Option<String>,
}

/// The in-progress attachment edits of one UI session.
///
/// Pending fields (`new_files`, `removed_ids`, `changed_types`,
/// `changed_descriptions`) are cleared only by [`mark_persisted`]; a failed
/// submit leaves the set untouched so the user can retry without re-picking
/// files.
///
/// [`mark_persisted`]: WorkingAttachmentSet::mark_persisted
#[derive(Debug, Clone, Default)]
pub struct WorkingAttachmentSet {
    pub remote_files: Vec<RemoteAttachment>,
    pub new_files: Vec<QueuedFile>,
    pub removed_ids: Vec<i64>,
    pub changed_types: HashMap<i64, i64>,
    pub changed_descriptions: HashMap<i64, Option<String>>,
}

impl WorkingAttachmentSet {
    pub fn from_remote(remote_files: Vec<RemoteAttachment>) -> Self {
        Self {
            remote_files,
            ..Default::default()
        }
    }

    /// Queue a local file for upload on the next submit.
    pub fn queue_file(&mut self, file: QueuedFile) {
        self.new_files.push(file);
    }

    /// Drop a queued local file before it was ever persisted.
    pub fn unqueue_file(&mut self, index: usize) {
        if index < self.new_files.len() {
            self.new_files.remove(index);
        }
    }

    /// Mark a previously loaded attachment for removal. Unknown and
    /// already-marked ids are ignored; pending edits for the id are dropped.
    pub fn mark_removed(&mut self, id: i64) {
        if !self.removed_ids.contains(&id)
            && self.remote_files.iter().any(|r| r.attachment.id == id)
        {
            self.removed_ids.push(id);
            self.changed_types.remove(&id);
            self.changed_descriptions.remove(&id);
        }
    }

    /// Record a classification change for a remote attachment. Setting the
    /// loaded value back cancels the pending change.
    pub fn set_type(&mut self, id: i64, type_id: i64) {
        if self.removed_ids.contains(&id) {
            return;
        }
        if let Some(remote) = self.remote_files.iter().find(|r| r.attachment.id == id) {
            if remote.type_id == Some(type_id) {
                self.changed_types.remove(&id);
            } else {
                self.changed_types.insert(id, type_id);
            }
        }
    }

    /// Record a description change for a remote attachment.
    pub fn set_description(&mut self, id: i64, description: Option<String>) {
        if self.removed_ids.contains(&id) {
            return;
        }
        if let Some(remote) = self.remote_files.iter().find(|r| r.attachment.id == id) {
            if remote.attachment.description == description {
                self.changed_descriptions.remove(&id);
            } else {
                self.changed_descriptions.insert(id, description);
            }
        }
    }

    /// Effective classification of a remote attachment after pending edits.
    pub fn effective_type(&self, remote: &RemoteAttachment) -> Option<i64> {
        self.changed_types
            .get(&remote.attachment.id)
            .copied()
            .or(remote.type_id)
    }

    /// Remote attachments that will survive the next submit.
    pub fn surviving_remote(&self) -> impl Iterator<Item = &RemoteAttachment> {
        self.remote_files
            .iter()
            .filter(|r| !self.removed_ids.contains(&r.attachment.id))
    }

    /// Whether the set has pending changes.
    pub fn is_dirty(&self) -> bool {
        !self.new_files.is_empty()
            || !self.removed_ids.is_empty()
            || !self.changed_types.is_empty()
            || !self.changed_descriptions.is_empty()
    }

    /// Fold a successful persistence round back into the loaded state:
    /// removed rows leave `remote_files`, pending edits apply, and
    /// server-confirmed new rows join the remote set.
    pub fn mark_persisted(&mut self, created: Vec<RemoteAttachment>) {
        self.remote_files
            .retain(|r| !self.removed_ids.contains(&r.attachment.id));
        for (id, type_id) in self.changed_types.drain() {
            if let Some(remote) = self.remote_files.iter_mut().find(|r| r.attachment.id == id) {
                remote.type_id = Some(type_id);
            }
        }
        for (id, description) in self.changed_descriptions.drain() {
            if let Some(remote) = self.remote_files.iter_mut().find(|r| r.attachment.id == id) {
                remote.attachment.description = description;
            }
        }
        self.remote_files.extend(created);
        self.new_files.clear();
        self.removed_ids.clear();
    }
}
