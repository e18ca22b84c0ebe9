use std::collections::HashMap;
use std::sync::Arc;

use futures::future::join_all;
use tracing::{info, warn};

use crate::core::error::{AppError, Result};
use crate::features::attachments::models::{
    Attachment, EntityKind, NewAttachment, NewLink, RemoteAttachment, WorkingAttachmentSet,
};
use crate::features::attachments::services::{AttachmentLinker, AttachmentStore};
use crate::modules::storage::BlobStore;
use crate::shared::sanitize::object_key;
use crate::shared::types::CurrentUser;

/// Result of a successful submit, as persisted.
#[derive(Debug)]
pub struct SubmitOutcome {
    pub created: Vec<Attachment>,
    pub removed: Vec<i64>,
}

/// Converges persisted attachment state (blobs, metadata rows, link rows)
/// with a UI working set.
pub struct AttachmentReconciler {
    store: Arc<dyn BlobStore>,
    attachments: Arc<dyn AttachmentStore>,
    linker: Arc<dyn AttachmentLinker>,
}

impl AttachmentReconciler {
    pub fn new(
        store: Arc<dyn BlobStore>,
        attachments: Arc<dyn AttachmentStore>,
        linker: Arc<dyn AttachmentLinker>,
    ) -> Self {
        Self {
            store,
            attachments,
            linker,
        }
    }

    pub fn kind(&self) -> EntityKind {
        self.linker.kind()
    }

    /// Load the persisted attachment set of a parent as a clean working set.
    pub async fn load(&self, parent_id: i64) -> Result<WorkingAttachmentSet> {
        let mut links = self.linker.list_by_parent_ids(&[parent_id]).await?;
        let links = links.remove(&parent_id).unwrap_or_default();

        let ids: Vec<i64> = links.iter().map(|l| l.attachment_id).collect();
        let rows = self.attachments.get_by_ids(&ids).await?;
        let mut by_id: HashMap<i64, Attachment> = rows.into_iter().map(|a| (a.id, a)).collect();

        let mut remote = Vec::with_capacity(links.len());
        for link in links {
            // A link without a metadata row has nothing to render; skip it.
            if let Some(attachment) = by_id.remove(&link.attachment_id) {
                remote.push(RemoteAttachment {
                    attachment,
                    type_id: link.type_id,
                });
            }
        }
        Ok(WorkingAttachmentSet::from_remote(remote))
    }

    /// Apply the working set's pending changes to the store.
    ///
    /// Phases run in order: validation, uploads, metadata insert, link
    /// insert, removals, type/description edits. The set is mutated only
    /// after every phase succeeded; on error it is left exactly as the user
    /// left it, so a resubmission reuses the queued files.
    pub async fn submit(
        &self,
        parent_id: i64,
        set: &mut WorkingAttachmentSet,
        user: &CurrentUser,
    ) -> Result<SubmitOutcome> {
        self.validate(set)?;

        let paths = self.upload_new_files(parent_id, set).await?;
        let created = self.persist_metadata(set, paths, user).await?;
        self.link_created(parent_id, set, &created).await?;
        let removed = self.remove_marked(parent_id, set).await?;
        self.apply_edits(parent_id, set).await?;

        info!(
            "Reconciled attachments for {} {}: +{} -{}",
            self.kind().path_prefix(),
            parent_id,
            created.len(),
            removed.len()
        );

        let created_remote: Vec<RemoteAttachment> = created
            .iter()
            .zip(set.new_files.iter())
            .map(|(attachment, file)| RemoteAttachment {
                attachment: attachment.clone(),
                type_id: file.type_id,
            })
            .collect();
        set.mark_persisted(created_remote);

        Ok(SubmitOutcome { created, removed })
    }

    /// Tear down every attachment of a parent (used when the parent entity
    /// itself is deleted): blobs, metadata rows, link rows.
    pub async fn purge_parent(&self, parent_id: i64) -> Result<Vec<i64>> {
        let mut links = self.linker.list_by_parent_ids(&[parent_id]).await?;
        let ids: Vec<i64> = links
            .remove(&parent_id)
            .unwrap_or_default()
            .iter()
            .map(|l| l.attachment_id)
            .collect();

        let rows = self.attachments.get_by_ids(&ids).await?;
        let mut failures = Vec::new();
        for row in &rows {
            if let Err(e) = self.store.remove(std::slice::from_ref(&row.storage_path)).await {
                warn!("Failed to remove blob '{}': {}", row.storage_path, e);
                failures.push(format!("{}: {}", row.storage_path, e));
            }
        }

        self.attachments.delete_by_ids(&ids).await?;
        self.linker.unlink_all(parent_id).await?;

        if failures.is_empty() {
            Ok(ids)
        } else {
            Err(AppError::Partial(failures))
        }
    }

    /// Pure pre-check; no collaborator call happens when it fails.
    fn validate(&self, set: &WorkingAttachmentSet) -> Result<()> {
        if !self.kind().requires_classification() {
            return Ok(());
        }
        for file in &set.new_files {
            if file.type_id.is_none() {
                return Err(AppError::Validation(format!(
                    "File '{}' is missing an attachment type",
                    file.filename
                )));
            }
        }
        for remote in set.surviving_remote() {
            if set.effective_type(remote).is_none() {
                return Err(AppError::Validation(format!(
                    "Attachment '{}' is missing an attachment type",
                    remote.attachment.display_name()
                )));
            }
        }
        Ok(())
    }

    /// Upload all queued files concurrently. All uploads run to completion
    /// before the phase reports; blobs already uploaded in a failed attempt
    /// stay behind (a retry generates fresh keys).
    async fn upload_new_files(
        &self,
        parent_id: i64,
        set: &WorkingAttachmentSet,
    ) -> Result<Vec<String>> {
        let prefix = self.kind().path_prefix();
        let keyed: Vec<(String, usize)> = set
            .new_files
            .iter()
            .enumerate()
            .map(|(i, file)| (object_key(prefix, parent_id, &file.filename), i))
            .collect();

        let results = join_all(keyed.iter().map(|(path, i)| {
            let file = &set.new_files[*i];
            async move { self.store.upload(path, &file.bytes, &file.mime_type).await }
        }))
        .await;

        let mut errors: Vec<AppError> = results.into_iter().filter_map(|r| r.err()).collect();
        if let Some(pos) = errors
            .iter()
            .position(|e| matches!(e, AppError::BucketNotFound(_)))
        {
            return Err(errors.swap_remove(pos));
        }
        if !errors.is_empty() {
            let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            return Err(AppError::Store(format!(
                "{} upload(s) failed: {}",
                messages.len(),
                messages.join("; ")
            )));
        }

        Ok(keyed.into_iter().map(|(path, _)| path).collect())
    }

    async fn persist_metadata(
        &self,
        set: &WorkingAttachmentSet,
        paths: Vec<String>,
        user: &CurrentUser,
    ) -> Result<Vec<Attachment>> {
        let rows: Vec<NewAttachment> = set
            .new_files
            .iter()
            .zip(paths)
            .map(|(file, storage_path)| NewAttachment {
                storage_path,
                mime_type: file.mime_type.clone(),
                original_name: Some(file.filename.clone()),
                description: file.description.clone(),
                created_by: user.id,
            })
            .collect();
        self.attachments.insert_many(rows).await
    }

    async fn link_created(
        &self,
        parent_id: i64,
        set: &WorkingAttachmentSet,
        created: &[Attachment],
    ) -> Result<()> {
        let links: Vec<NewLink> = created
            .iter()
            .zip(set.new_files.iter())
            .map(|(attachment, file)| NewLink {
                attachment_id: attachment.id,
                type_id: file.type_id,
            })
            .collect();
        self.linker.link(parent_id, &links).await
    }

    /// Best-effort batch: each removal proceeds independently; failures are
    /// aggregated after every id has been attempted.
    async fn remove_marked(
        &self,
        parent_id: i64,
        set: &WorkingAttachmentSet,
    ) -> Result<Vec<i64>> {
        if set.removed_ids.is_empty() {
            return Ok(Vec::new());
        }

        // Rows already gone (e.g. a previous partially failed submit) have
        // no path left to remove; their links still need to go.
        let rows = self.attachments.get_by_ids(&set.removed_ids).await?;
        let paths: HashMap<i64, String> = rows
            .into_iter()
            .map(|a| (a.id, a.storage_path))
            .collect();

        let mut removed = Vec::new();
        let mut failures = Vec::new();
        for &id in &set.removed_ids {
            match self.remove_one(parent_id, id, paths.get(&id)).await {
                Ok(()) => removed.push(id),
                Err(e) => {
                    warn!("Failed to remove attachment {}: {}", id, e);
                    failures.push(format!("attachment {}: {}", id, e));
                }
            }
        }

        if failures.is_empty() {
            Ok(removed)
        } else {
            Err(AppError::Partial(failures))
        }
    }

    async fn remove_one(&self, parent_id: i64, id: i64, path: Option<&String>) -> Result<()> {
        if let Some(path) = path {
            self.store.remove(std::slice::from_ref(path)).await?;
        }
        self.attachments.delete_by_ids(&[id]).await?;
        self.linker.unlink(parent_id, id).await
    }

    async fn apply_edits(&self, parent_id: i64, set: &WorkingAttachmentSet) -> Result<()> {
        for (&id, &type_id) in &set.changed_types {
            self.linker.set_type(parent_id, id, type_id).await?;
        }
        for (id, description) in &set.changed_descriptions {
            self.attachments
                .update_description(*id, description.as_deref())
                .await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;
    use crate::features::attachments::models::QueuedFile;
    use crate::shared::test_helpers::{MockAttachmentStore, MockBlobStore, MockLinker};

    fn user() -> CurrentUser {
        CurrentUser::new(Uuid::new_v4())
    }

    fn queued(name: &str, type_id: Option<i64>) -> QueuedFile {
        QueuedFile {
            filename: name.to_string(),
            mime_type: "application/pdf".to_string(),
            bytes: vec![0xDE, 0xAD],
            type_id,
            description: None,
        }
    }

    struct Rig {
        store: Arc<MockBlobStore>,
        attachments: Arc<MockAttachmentStore>,
        linker: Arc<MockLinker>,
        reconciler: AttachmentReconciler,
    }

    fn rig(kind: EntityKind) -> Rig {
        let store = Arc::new(MockBlobStore::default());
        let attachments = Arc::new(MockAttachmentStore::default());
        let linker = Arc::new(MockLinker::new(kind));
        let reconciler = AttachmentReconciler::new(
            store.clone(),
            attachments.clone(),
            linker.clone(),
        );
        Rig {
            store,
            attachments,
            linker,
            reconciler,
        }
    }

    impl Rig {
        fn total_calls(&self) -> usize {
            self.store.calls() + self.attachments.calls() + self.linker.calls()
        }

        /// Seed a persisted attachment linked to `parent_id`.
        async fn seed(&self, parent_id: i64, name: &str, type_id: Option<i64>) -> Attachment {
            let created = self
                .attachments
                .insert_many(vec![NewAttachment {
                    storage_path: format!("claims/{}/1700000000000_{}", parent_id, name),
                    mime_type: "application/pdf".to_string(),
                    original_name: Some(name.to_string()),
                    description: None,
                    created_by: Uuid::new_v4(),
                }])
                .await
                .unwrap();
            let attachment = created.into_iter().next().unwrap();
            self.linker
                .link(
                    parent_id,
                    &[NewLink {
                        attachment_id: attachment.id,
                        type_id,
                    }],
                )
                .await
                .unwrap();
            self.store.seed_blob(&attachment.storage_path, 2);
            attachment
        }
    }

    #[tokio::test]
    async fn missing_type_fails_before_any_store_call() {
        let rig = rig(EntityKind::Claim);
        let mut set = WorkingAttachmentSet::default();
        set.queue_file(queued("a.pdf", None));

        let err = rig.reconciler.submit(42, &mut set, &user()).await.unwrap_err();

        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(rig.total_calls(), 0);
        assert_eq!(set.new_files.len(), 1);
    }

    #[tokio::test]
    async fn unit_attachments_need_no_classification() {
        let rig = rig(EntityKind::Unit);
        let mut set = WorkingAttachmentSet::default();
        set.queue_file(queued("photo.jpg", None));

        rig.reconciler.submit(7, &mut set, &user()).await.unwrap();
        assert!(!set.is_dirty());
    }

    #[tokio::test]
    async fn submit_uploads_inserts_and_links() {
        let rig = rig(EntityKind::Claim);
        let mut set = WorkingAttachmentSet::default();
        set.queue_file(queued("a.pdf", Some(3)));

        let outcome = rig.reconciler.submit(42, &mut set, &user()).await.unwrap();

        assert_eq!(outcome.created.len(), 1);
        let path = &outcome.created[0].storage_path;
        assert!(path.starts_with("claims/42/"), "unexpected path {}", path);
        assert!(path.ends_with("_a.pdf"), "unexpected path {}", path);

        let uploads = rig.store.uploaded_paths();
        assert_eq!(uploads, vec![path.clone()]);

        let links = rig.linker.links_of(42).await;
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].attachment_id, outcome.created[0].id);
        assert_eq!(links[0].type_id, Some(3));

        assert!(!set.is_dirty());
        assert_eq!(set.remote_files.len(), 1);
        assert_eq!(set.remote_files[0].type_id, Some(3));
    }

    #[tokio::test]
    async fn uploaded_row_resolves_by_id_with_same_path() {
        let rig = rig(EntityKind::Claim);
        let mut set = WorkingAttachmentSet::default();
        set.queue_file(queued("a.pdf", Some(3)));

        let outcome = rig.reconciler.submit(42, &mut set, &user()).await.unwrap();
        let created = &outcome.created[0];

        let rows = rig.attachments.get_by_ids(&[created.id]).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].storage_path, created.storage_path);
    }

    #[tokio::test]
    async fn failed_upload_leaves_working_set_unchanged() {
        let rig = rig(EntityKind::Claim);
        rig.store.fail_upload_containing("b.pdf");
        let mut set = WorkingAttachmentSet::default();
        set.queue_file(queued("a.pdf", Some(1)));
        set.queue_file(queued("b.pdf", Some(1)));

        let err = rig.reconciler.submit(42, &mut set, &user()).await.unwrap_err();

        assert!(matches!(err, AppError::Store(_)));
        assert_eq!(set.new_files.len(), 2);
        assert!(rig.attachments.get_by_ids(&[1, 2]).await.unwrap().is_empty());
        assert!(rig.linker.links_of(42).await.is_empty());
    }

    #[tokio::test]
    async fn removal_deletes_blob_row_and_link() {
        let rig = rig(EntityKind::Claim);
        let seeded = rig.seed(42, "old.pdf", Some(1)).await;
        let mut set = rig.reconciler.load(42).await.unwrap();
        set.mark_removed(seeded.id);

        let outcome = rig.reconciler.submit(42, &mut set, &user()).await.unwrap();

        assert_eq!(outcome.removed, vec![seeded.id]);
        assert!(rig.store.removed_paths().contains(&seeded.storage_path));
        assert!(rig
            .attachments
            .get_by_ids(&[seeded.id])
            .await
            .unwrap()
            .is_empty());
        assert!(rig.linker.links_of(42).await.is_empty());
        assert!(!set.is_dirty());
        assert!(set.remote_files.is_empty());
    }

    #[tokio::test]
    async fn removal_failures_aggregate_and_do_not_block_others() {
        let rig = rig(EntityKind::Claim);
        let a = rig.seed(42, "a.pdf", Some(1)).await;
        let b = rig.seed(42, "b.pdf", Some(1)).await;
        let c = rig.seed(42, "c.pdf", Some(1)).await;
        rig.store.fail_remove_containing("a.pdf");
        rig.store.fail_remove_containing("b.pdf");

        let mut set = rig.reconciler.load(42).await.unwrap();
        set.mark_removed(a.id);
        set.mark_removed(b.id);
        set.mark_removed(c.id);

        let err = rig.reconciler.submit(42, &mut set, &user()).await.unwrap_err();

        match err {
            AppError::Partial(failures) => assert_eq!(failures.len(), 2),
            other => panic!("expected Partial, got {:?}", other),
        }
        // The third removal went through.
        assert!(rig.store.removed_paths().contains(&c.storage_path));
        assert!(rig
            .attachments
            .get_by_ids(&[c.id])
            .await
            .unwrap()
            .is_empty());
        // Failed submit leaves the working set as the user left it.
        assert_eq!(set.removed_ids.len(), 3);
    }

    #[tokio::test]
    async fn removing_an_already_deleted_row_still_clears_the_link() {
        let rig = rig(EntityKind::Claim);
        let seeded = rig.seed(42, "old.pdf", Some(1)).await;
        let mut set = rig.reconciler.load(42).await.unwrap();
        // Row vanished between load and submit (e.g. a retried submit that
        // failed after its removal phase partially ran).
        rig.attachments.delete_by_ids(&[seeded.id]).await.unwrap();
        set.mark_removed(seeded.id);

        let outcome = rig.reconciler.submit(42, &mut set, &user()).await.unwrap();

        assert_eq!(outcome.removed, vec![seeded.id]);
        assert!(rig.linker.links_of(42).await.is_empty());
        assert!(!set.is_dirty());
    }

    #[tokio::test]
    async fn missing_bucket_surfaces_as_its_own_error() {
        let rig = rig(EntityKind::Claim);
        rig.store.simulate_missing_bucket();
        let mut set = WorkingAttachmentSet::default();
        set.queue_file(queued("a.pdf", Some(1)));

        let err = rig.reconciler.submit(42, &mut set, &user()).await.unwrap_err();

        assert!(matches!(err, AppError::BucketNotFound(_)));
        assert_eq!(set.new_files.len(), 1);
    }

    #[tokio::test]
    async fn changed_types_persist_on_link_rows() {
        let rig = rig(EntityKind::Claim);
        let seeded = rig.seed(42, "a.pdf", Some(1)).await;
        let mut set = rig.reconciler.load(42).await.unwrap();
        set.set_type(seeded.id, 2);

        rig.reconciler.submit(42, &mut set, &user()).await.unwrap();

        let links = rig.linker.links_of(42).await;
        assert_eq!(links[0].type_id, Some(2));
        assert!(!set.is_dirty());
        assert_eq!(set.remote_files[0].type_id, Some(2));
    }

    #[tokio::test]
    async fn changed_descriptions_persist_on_attachment_rows() {
        let rig = rig(EntityKind::Claim);
        let seeded = rig.seed(42, "a.pdf", Some(1)).await;
        let mut set = rig.reconciler.load(42).await.unwrap();
        set.set_description(seeded.id, Some("soffit damage".to_string()));

        rig.reconciler.submit(42, &mut set, &user()).await.unwrap();

        let rows = rig.attachments.get_by_ids(&[seeded.id]).await.unwrap();
        assert_eq!(rows[0].description.as_deref(), Some("soffit damage"));
    }

    #[tokio::test]
    async fn load_joins_links_with_metadata() {
        let rig = rig(EntityKind::Claim);
        let a = rig.seed(42, "a.pdf", Some(5)).await;
        rig.seed(43, "other.pdf", Some(1)).await;

        let set = rig.reconciler.load(42).await.unwrap();

        assert_eq!(set.remote_files.len(), 1);
        assert_eq!(set.remote_files[0].attachment.id, a.id);
        assert_eq!(set.remote_files[0].type_id, Some(5));
        assert!(!set.is_dirty());
    }

    #[tokio::test]
    async fn purge_parent_tears_everything_down() {
        let rig = rig(EntityKind::Letter);
        let a = rig.seed(9, "a.pdf", Some(1)).await;
        let b = rig.seed(9, "b.pdf", Some(1)).await;

        let purged = rig.reconciler.purge_parent(9).await.unwrap();

        assert_eq!(purged.len(), 2);
        assert!(rig.store.removed_paths().contains(&a.storage_path));
        assert!(rig.store.removed_paths().contains(&b.storage_path));
        assert!(rig
            .attachments
            .get_by_ids(&[a.id, b.id])
            .await
            .unwrap()
            .is_empty());
        assert!(rig.linker.links_of(9).await.is_empty());
    }
}
