mod folder_service;

pub use folder_service::{resolve_file_sizes, FolderService};
