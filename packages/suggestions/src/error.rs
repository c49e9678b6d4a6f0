// ABOUTME: Error taxonomy for the moderation workflow
// ABOUTME: Validation, state conflicts, missing capability, and ownership-scoped not-found

use quadbase_attachments::AttachmentError;
use quadbase_catalog::CatalogError;
use quadbase_core::ValidationErrors;
use quadbase_storage::StorageError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModerationError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationErrors),
    /// Edits to approved suggestions and removal of a last remaining detail.
    #[error("{0}")]
    StateConflict(String),
    #[error("You do not have permission to moderate suggestions")]
    Unauthorized,
    #[error("{0} not found")]
    NotFound(String),
    #[error("Attachment storage error: {0}")]
    Blob(String),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl ModerationError {
    /// Re-key validation messages under `prefix`, e.g. `details[1]`.
    pub fn nested(self, prefix: &str) -> Self {
        match self {
            ModerationError::Validation(inner) => {
                let mut errors = ValidationErrors::new();
                errors.extend_nested(prefix, inner);
                ModerationError::Validation(errors)
            }
            other => other,
        }
    }
}

impl From<CatalogError> for ModerationError {
    fn from(e: CatalogError) -> Self {
        match e {
            CatalogError::Validation(errors) => ModerationError::Validation(errors),
            CatalogError::Protected(message) => ModerationError::StateConflict(message),
            CatalogError::NotFound(what) => ModerationError::NotFound(what),
            CatalogError::Storage(e) => ModerationError::Storage(e),
        }
    }
}

impl From<AttachmentError> for ModerationError {
    fn from(e: AttachmentError) -> Self {
        match e {
            AttachmentError::Validation(errors) => ModerationError::Validation(errors),
            AttachmentError::NotFound(what) => ModerationError::NotFound(what),
            AttachmentError::Blob(message) => ModerationError::Blob(message),
            AttachmentError::Storage(e) => ModerationError::Storage(e),
        }
    }
}

impl From<sqlx::Error> for ModerationError {
    fn from(e: sqlx::Error) -> Self {
        ModerationError::Storage(StorageError::Sqlx(e))
    }
}

impl From<serde_json::Error> for ModerationError {
    fn from(e: serde_json::Error) -> Self {
        ModerationError::Storage(StorageError::Json(e))
    }
}

pub type ModerationResult<T> = Result<T, ModerationError>;
