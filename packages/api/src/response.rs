// ABOUTME: Shared API response envelope used by every endpoint
// ABOUTME: Successful calls carry `data`, failures carry `error` and optional per-field messages

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json as ResponseJson, Response},
};
use serde::Serialize;
use std::collections::BTreeMap;

/// Standard API response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
    /// Field messages for validation failures, keyed by field path.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<BTreeMap<String, Vec<String>>>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        ApiResponse {
            success: true,
            data: Some(data),
            error: None,
            details: None,
        }
    }

    pub fn error(message: String) -> ApiResponse<()> {
        ApiResponse {
            success: false,
            data: None,
            error: Some(message),
            details: None,
        }
    }
}

impl<T: Serialize> ApiResponse<T> {
    /// 200 response with `data` wrapped in the envelope.
    pub fn ok(data: T) -> Response {
        (StatusCode::OK, ResponseJson(Self::success(data))).into_response()
    }

    /// 201 response with `data` wrapped in the envelope.
    pub fn created(data: T) -> Response {
        (StatusCode::CREATED, ResponseJson(Self::success(data))).into_response()
    }
}

/// Serialize a payload for the envelope; only fails on non-string map keys.
pub fn json_value<T: Serialize>(value: &T) -> Result<serde_json::Value, crate::error::ApiError> {
    serde_json::to_value(value).map_err(|e| crate::error::ApiError::Internal(e.to_string()))
}
