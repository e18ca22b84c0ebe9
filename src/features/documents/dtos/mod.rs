mod document_dto;

pub use document_dto::{CreateFolderDto, DocumentWithAuthor, UpdateFolderDto};
