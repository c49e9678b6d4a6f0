// ABOUTME: Error type for attachment uploads and blob storage
// ABOUTME: Upload problems surface as field validation errors

use quadbase_core::ValidationErrors;
use quadbase_storage::StorageError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AttachmentError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationErrors),
    #[error("Blob storage error: {0}")]
    Blob(String),
    #[error("{0} not found")]
    NotFound(String),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl From<sqlx::Error> for AttachmentError {
    fn from(e: sqlx::Error) -> Self {
        AttachmentError::Storage(StorageError::Sqlx(e))
    }
}

impl From<std::io::Error> for AttachmentError {
    fn from(e: std::io::Error) -> Self {
        AttachmentError::Blob(e.to_string())
    }
}

pub type AttachmentResult<T> = Result<T, AttachmentError>;
