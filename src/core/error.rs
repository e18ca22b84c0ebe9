use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Storage bucket '{0}' does not exist")]
    BucketNotFound(String),

    #[error("Storage error: {0}")]
    Store(String),

    #[error("Repository error: {0}")]
    Repository(#[from] sqlx::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{} operation(s) failed: {}", .0.len(), .0.join("; "))]
    Partial(Vec<String>),
}

pub type Result<T> = std::result::Result<T, AppError>;
