// ABOUTME: Error type for canonical catalog operations
// ABOUTME: Separates field validation, protected deletions, and missing records from storage faults

use quadbase_core::ValidationErrors;
use quadbase_storage::StorageError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationErrors),
    #[error("{0}")]
    Protected(String),
    #[error("{0} not found")]
    NotFound(String),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl From<sqlx::Error> for CatalogError {
    fn from(e: sqlx::Error) -> Self {
        CatalogError::Storage(StorageError::Sqlx(e))
    }
}

impl From<serde_json::Error> for CatalogError {
    fn from(e: serde_json::Error) -> Self {
        CatalogError::Storage(StorageError::Json(e))
    }
}

pub type CatalogResult<T> = Result<T, CatalogError>;
