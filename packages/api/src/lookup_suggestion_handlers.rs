// ABOUTME: HTTP handlers for proposed lookup table entries
// ABOUTME: Accepting one creates or updates the lookup row it names

use axum::{
    body::Bytes,
    extract::{rejection::{BytesRejection, JsonRejection}, Path, Query, State},
    response::Response,
    Json,
};
use quadbase_catalog::LookupKind;
use quadbase_suggestions::LookupSuggestionInput;
use serde_json::Value;
use tracing::info;

use crate::actor::CurrentActor;
use crate::error::ApiResult;
use crate::pagination::{Page, PageParams};
use crate::response::ApiResponse;
use crate::state::AppState;
use crate::suggestion_handlers::{DenyRequest, StatusFilter};

pub async fn list_lookup_suggestions(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(kind): Path<String>,
    Query(page): Query<PageParams>,
    Query(filter): Query<StatusFilter>,
) -> ApiResult<Response> {
    let kind: LookupKind = kind.parse()?;
    let query = filter.to_query(&page)?;

    let (items, total) = state.lookup_suggestions.list(&actor, kind, &query).await?;
    Ok(ApiResponse::ok(Page::new(items, &page, total)))
}

pub async fn create_lookup_suggestion(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(kind): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Response> {
    let Json(payload) = payload?;
    let kind: LookupKind = kind.parse()?;
    let input: LookupSuggestionInput = serde_json::from_value(payload)?;

    let suggestion = state.lookup_suggestions.create(&actor, kind, &input).await?;
    info!("{} proposed {} lookup {}", actor.id, kind, suggestion.label);

    Ok(ApiResponse::created(suggestion))
}

pub async fn get_lookup_suggestion(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path((kind, id)): Path<(String, String)>,
) -> ApiResult<Response> {
    let kind: LookupKind = kind.parse()?;
    let suggestion = state.lookup_suggestions.get(&actor, kind, &id).await?;
    Ok(ApiResponse::ok(suggestion))
}

pub async fn delete_lookup_suggestion(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path((kind, id)): Path<(String, String)>,
) -> ApiResult<Response> {
    let kind: LookupKind = kind.parse()?;
    state.lookup_suggestions.delete(&actor, kind, &id).await?;
    Ok(ApiResponse::ok(Value::Null))
}

pub async fn accept_lookup_suggestion(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path((kind, id)): Path<(String, String)>,
) -> ApiResult<Response> {
    let kind: LookupKind = kind.parse()?;
    let lookup = state.moderation.accept_lookup(&actor, kind, &id).await?;
    Ok(ApiResponse::ok(lookup))
}

pub async fn deny_lookup_suggestion(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path((kind, id)): Path<(String, String)>,
    body: Result<Bytes, BytesRejection>,
) -> ApiResult<Response> {
    let body = body?;
    let kind: LookupKind = kind.parse()?;
    let request = DenyRequest::from_body(&body)?;

    let meta = state
        .moderation
        .deny_lookup(&actor, kind, &id, request.admin_comment.as_deref())
        .await?;

    Ok(ApiResponse::ok(meta))
}
