//! Attachment and document management core for the ClaimDesk back office.
//!
//! Covers the full lifecycle of files attached to claims, tickets, letters,
//! court cases, and units: blob storage, metadata rows, per-entity link
//! tables, working-set reconciliation, and document folders. Consumed as a
//! library by the UI layer; no network surface of its own.

pub mod core;
pub mod features;
pub mod modules;
pub mod shared;

pub use crate::core::config::Config;
pub use crate::core::error::{AppError, Result};
pub use crate::features::attachments::{
    AttachmentReconciler, EntityKind, QueuedFile, WorkingAttachmentSet,
};
pub use crate::features::documents::FolderService;
pub use crate::modules::storage::{BlobStore, MinioStore};
pub use crate::shared::types::CurrentUser;
