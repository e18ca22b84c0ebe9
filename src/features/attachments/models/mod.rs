mod attachment;
mod entity_kind;
mod link;
mod working_set;

pub use attachment::{Attachment, NewAttachment};
pub use entity_kind::EntityKind;
pub use link::{LinkedAttachment, NewLink, ParentLinkRow};
pub use working_set::{QueuedFile, RemoteAttachment, WorkingAttachmentSet};
