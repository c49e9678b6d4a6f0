// ABOUTME: HTTP handlers for proposed details on components already in the catalog
// ABOUTME: Accepting one appends a new detail row to the target component

use axum::{
    body::Bytes,
    extract::{rejection::{BytesRejection, JsonRejection}, Path, Query, State},
    response::Response,
    Json,
};
use quadbase_catalog::{with_component_family, ComponentKind, ComponentSpec};
use quadbase_suggestions::DetailSuggestionInput;
use serde_json::Value;
use tracing::info;

use crate::actor::CurrentActor;
use crate::error::ApiResult;
use crate::pagination::{Page, PageParams};
use crate::response::{json_value, ApiResponse};
use crate::state::AppState;
use crate::suggestion_handlers::{DenyRequest, StatusFilter};

pub async fn list_detail_suggestions(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(kind): Path<String>,
    Query(page): Query<PageParams>,
    Query(filter): Query<StatusFilter>,
) -> ApiResult<Response> {
    let kind: ComponentKind = kind.parse()?;
    let query = filter.to_query(&page)?;

    let body = with_component_family!(kind, F => {
        let (items, total) = state.detail_suggestions.list::<F>(&actor, &query).await?;
        json_value(&Page::new(items, &page, total))?
    });

    Ok(ApiResponse::ok(body))
}

/// Propose a new detail for an existing component
pub async fn create_detail_suggestion(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(kind): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Response> {
    let Json(payload) = payload?;
    let kind: ComponentKind = kind.parse()?;

    let body = with_component_family!(kind, F => {
        let input: DetailSuggestionInput<<F as ComponentSpec>::Detail> =
            serde_json::from_value(payload)?;
        let suggestion = state.detail_suggestions.create::<F>(&actor, &input).await?;
        info!(
            "{} proposed a {} detail for {}",
            actor.id, kind, suggestion.component_id
        );
        json_value(&suggestion)?
    });

    Ok(ApiResponse::created(body))
}

pub async fn get_detail_suggestion(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path((kind, id)): Path<(String, String)>,
) -> ApiResult<Response> {
    let kind: ComponentKind = kind.parse()?;

    let body = with_component_family!(kind, F => {
        json_value(&state.detail_suggestions.get::<F>(&actor, &id).await?)?
    });

    Ok(ApiResponse::ok(body))
}

pub async fn delete_detail_suggestion(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path((kind, id)): Path<(String, String)>,
) -> ApiResult<Response> {
    let kind: ComponentKind = kind.parse()?;

    with_component_family!(kind, F => {
        state.detail_suggestions.delete::<F>(&actor, &id).await?;
    });

    Ok(ApiResponse::ok(Value::Null))
}

pub async fn accept_detail_suggestion(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path((kind, id)): Path<(String, String)>,
) -> ApiResult<Response> {
    let kind: ComponentKind = kind.parse()?;

    let body = with_component_family!(kind, F => {
        json_value(&state.moderation.accept_detail::<F>(&actor, &id).await?)?
    });

    Ok(ApiResponse::ok(body))
}

pub async fn deny_detail_suggestion(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path((kind, id)): Path<(String, String)>,
    body: Result<Bytes, BytesRejection>,
) -> ApiResult<Response> {
    let body = body?;
    let kind: ComponentKind = kind.parse()?;
    let request = DenyRequest::from_body(&body)?;

    let meta = with_component_family!(kind, F => {
        state
            .moderation
            .deny_detail::<F>(&actor, &id, request.admin_comment.as_deref())
            .await?
    });

    Ok(ApiResponse::ok(meta))
}
