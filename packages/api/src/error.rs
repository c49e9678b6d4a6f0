// ABOUTME: API error type and its mapping onto HTTP status codes
// ABOUTME: Converts catalog, moderation, attachment, and list errors into the response envelope

use axum::{
    extract::rejection::{BytesRejection, JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use quadbase_attachments::AttachmentError;
use quadbase_catalog::CatalogError;
use quadbase_core::{UnknownKind, ValidationErrors};
use quadbase_lists::ListError;
use quadbase_suggestions::ModerationError;
use thiserror::Error;
use tracing::{error, info};

use crate::response::ApiResponse;

/// Error returned by every handler.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Validation failed")]
    Validation(ValidationErrors),

    /// Malformed request body or parameters.
    #[error("{0}")]
    BadRequest(String),

    /// Operation not allowed in the record's current state.
    #[error("{0}")]
    Conflict(String),

    #[error("Authentication required")]
    Unauthenticated,

    #[error("{0}")]
    Forbidden(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("Request body is too large: {0}")]
    PayloadTooLarge(String),

    #[error("Internal server error")]
    Internal(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::BadRequest(_) | ApiError::Conflict(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Unauthenticated => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::Forbidden(message.into())
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Internal details are logged, never returned
        let mut body = match &self {
            ApiError::Internal(detail) => {
                error!(error = %detail, "Internal server error occurred");
                ApiResponse::<()>::error("An internal server error occurred".to_string())
            }
            _ => {
                info!(status = %status, error = %self, "API error response");
                ApiResponse::<()>::error(self.to_string())
            }
        };

        if let ApiError::Validation(errors) = &self {
            body.details = Some(errors.by_field());
        }

        (status, Json(body)).into_response()
    }
}

impl From<ModerationError> for ApiError {
    fn from(e: ModerationError) -> Self {
        match e {
            ModerationError::Validation(errors) => ApiError::Validation(errors),
            ModerationError::StateConflict(message) => ApiError::Conflict(message),
            ModerationError::Unauthorized => {
                ApiError::Forbidden(ModerationError::Unauthorized.to_string())
            }
            ModerationError::NotFound(what) => ApiError::NotFound(what),
            ModerationError::Blob(message) => ApiError::Internal(message),
            ModerationError::Storage(inner) => ApiError::Internal(inner.to_string()),
        }
    }
}

impl From<CatalogError> for ApiError {
    fn from(e: CatalogError) -> Self {
        match e {
            CatalogError::Validation(errors) => ApiError::Validation(errors),
            CatalogError::Protected(message) => ApiError::Conflict(message),
            CatalogError::NotFound(what) => ApiError::NotFound(what),
            CatalogError::Storage(inner) => ApiError::Internal(inner.to_string()),
        }
    }
}

impl From<AttachmentError> for ApiError {
    fn from(e: AttachmentError) -> Self {
        match e {
            AttachmentError::Validation(errors) => ApiError::Validation(errors),
            AttachmentError::NotFound(what) => ApiError::NotFound(what),
            AttachmentError::Blob(message) => ApiError::Internal(message),
            AttachmentError::Storage(inner) => ApiError::Internal(inner.to_string()),
        }
    }
}

impl From<ListError> for ApiError {
    fn from(e: ListError) -> Self {
        match e {
            ListError::Validation(errors) => ApiError::Validation(errors),
            ListError::NotFound(what) => ApiError::NotFound(what),
            ListError::Storage(inner) => ApiError::Internal(inner.to_string()),
        }
    }
}

impl From<UnknownKind> for ApiError {
    fn from(e: UnknownKind) -> Self {
        ApiError::NotFound(format!("{} {}", e.category, e.value))
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        ApiError::BadRequest(format!("Invalid request body: {}", e))
    }
}

/// Body extraction failures, including bodies over the configured limit.
impl From<BytesRejection> for ApiError {
    fn from(rejection: BytesRejection) -> Self {
        match rejection.status() {
            StatusCode::PAYLOAD_TOO_LARGE => ApiError::PayloadTooLarge(rejection.body_text()),
            _ => ApiError::BadRequest(format!("Invalid request body: {}", rejection.body_text())),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::BytesRejection(inner) => inner.into(),
            other => ApiError::BadRequest(format!("Invalid request body: {}", other.body_text())),
        }
    }
}

/// Result type alias for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
