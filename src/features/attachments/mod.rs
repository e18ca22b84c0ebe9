pub mod dtos;
pub mod models;
pub mod services;

pub use models::{EntityKind, QueuedFile, RemoteAttachment, WorkingAttachmentSet};
pub use services::{
    AttachmentLinker, AttachmentReconciler, AttachmentStore, PgAttachmentRepository,
    PgEntityLinker, SubmitOutcome,
};
