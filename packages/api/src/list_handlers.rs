// ABOUTME: HTTP handlers for per-user favorites lists
// ABOUTME: Every route is scoped to the calling user's own lists

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    response::Response,
    Json,
};
use quadbase_catalog::ComponentKind;
use quadbase_lists::{ListInput, ListItemInput};
use serde::Deserialize;
use serde_json::Value;
use tracing::info;

use crate::actor::CurrentActor;
use crate::error::ApiResult;
use crate::response::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ItemFilter {
    #[serde(default)]
    pub kind: Option<String>,
}

pub async fn list_lists(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
) -> ApiResult<Response> {
    let lists = state.lists.list_lists(&actor).await?;
    Ok(ApiResponse::ok(lists))
}

pub async fn create_list(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Response> {
    let Json(payload) = payload?;
    let input: ListInput = serde_json::from_value(payload)?;
    let list = state.lists.create_list(&actor, &input).await?;
    info!("{} created list {}", actor.id, list.id);
    Ok(ApiResponse::created(list))
}

pub async fn get_list(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    let list = state.lists.get_list(&actor, &id).await?;
    Ok(ApiResponse::ok(list))
}

pub async fn rename_list(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Response> {
    let Json(payload) = payload?;
    let input: ListInput = serde_json::from_value(payload)?;
    let list = state.lists.rename_list(&actor, &id, &input).await?;
    Ok(ApiResponse::ok(list))
}

pub async fn delete_list(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    state.lists.delete_list(&actor, &id).await?;
    Ok(ApiResponse::ok(Value::Null))
}

/// Items of a list, newest first, optionally narrowed to one family
pub async fn list_items(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<String>,
    Query(filter): Query<ItemFilter>,
) -> ApiResult<Response> {
    let kind = filter
        .kind
        .as_deref()
        .map(str::parse::<ComponentKind>)
        .transpose()?;
    let items = state.lists.list_items(&actor, &id, kind).await?;
    Ok(ApiResponse::ok(items))
}

pub async fn add_item(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Response> {
    let Json(payload) = payload?;
    let input: ListItemInput = serde_json::from_value(payload)?;
    let item = state
        .lists
        .add_item(&actor, &id, input.component_kind, &input.component_id)
        .await?;
    Ok(ApiResponse::created(item))
}

pub async fn remove_item(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path((id, item_id)): Path<(String, String)>,
) -> ApiResult<Response> {
    state.lists.remove_item(&actor, &id, &item_id).await?;
    Ok(ApiResponse::ok(Value::Null))
}

/// Number of items per component family
pub async fn count_items(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    let counts = state.lists.count_by_kind(&actor, &id).await?;
    Ok(ApiResponse::ok(counts))
}
