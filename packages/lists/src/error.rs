// ABOUTME: Error type for favorites list operations
// ABOUTME: Lists are private, so lists of other users surface as not found

use quadbase_core::ValidationErrors;
use quadbase_storage::StorageError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ListError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationErrors),
    #[error("{0} not found")]
    NotFound(String),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl From<sqlx::Error> for ListError {
    fn from(e: sqlx::Error) -> Self {
        ListError::Storage(StorageError::Sqlx(e))
    }
}

pub type ListResult<T> = Result<T, ListError>;
