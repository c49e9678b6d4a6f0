// ABOUTME: Request actor extraction from identity headers
// ABOUTME: `x-user-id` names the caller and `x-moderator: true` grants the moderation capability

use axum::{
    extract::{FromRequestParts, OptionalFromRequestParts},
    http::request::Parts,
};
use quadbase_core::Actor;
use tracing::warn;

use crate::error::ApiError;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const MODERATOR_HEADER: &str = "x-moderator";

/// The authenticated caller of a request.
#[derive(Debug, Clone)]
pub struct CurrentActor(pub Actor);

impl CurrentActor {
    fn from_parts(parts: &Parts) -> Option<Self> {
        let id = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|id| !id.is_empty())?;

        let is_moderator = parts
            .headers
            .get(MODERATOR_HEADER)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.eq_ignore_ascii_case("true"));

        Some(CurrentActor(Actor {
            id: id.to_string(),
            is_moderator,
        }))
    }
}

impl<S> FromRequestParts<S> for CurrentActor
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Self::from_parts(parts).ok_or_else(|| {
            warn!(path = %parts.uri.path(), "Missing {} header", USER_ID_HEADER);
            ApiError::Unauthenticated
        })
    }
}

/// Anonymous callers are allowed on public catalog reads.
impl<S> OptionalFromRequestParts<S> for CurrentActor
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> Result<Option<Self>, Self::Rejection> {
        Ok(Self::from_parts(parts))
    }
}
