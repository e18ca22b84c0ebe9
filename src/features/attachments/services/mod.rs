mod attachment_repository;
mod linker;
mod reconciler;

pub use attachment_repository::{AttachmentStore, PgAttachmentRepository};
pub use linker::{AttachmentLinker, PgEntityLinker};
pub use reconciler::{AttachmentReconciler, SubmitOutcome};
