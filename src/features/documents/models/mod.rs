mod folder;

pub use folder::{DocumentFolder, DocumentFolderFile};
