// ABOUTME: HTTP handlers for whole-component suggestions and their moderation
// ABOUTME: Submit, edit, list, and delete proposals; moderators accept or deny them

use axum::{
    body::Bytes,
    extract::{rejection::{BytesRejection, JsonRejection}, Path, Query, State},
    response::Response,
    Json,
};
use quadbase_catalog::{with_component_family, ComponentKind};
use quadbase_suggestions::{ModerationStatus, SuggestionInput, SuggestionQuery};
use serde::Deserialize;
use serde_json::Value;
use tracing::info;

use crate::actor::CurrentActor;
use crate::error::{ApiError, ApiResult};
use crate::pagination::{Page, PageParams};
use crate::response::{json_value, ApiResponse};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct StatusFilter {
    #[serde(default)]
    pub status: Option<String>,
}

impl StatusFilter {
    /// Build the storage query for one page of results.
    pub fn to_query(&self, page: &PageParams) -> ApiResult<SuggestionQuery> {
        let status = self
            .status
            .as_deref()
            .map(str::parse::<ModerationStatus>)
            .transpose()
            .map_err(ApiError::BadRequest)?;

        Ok(SuggestionQuery {
            status,
            limit: Some(page.limit()),
            offset: Some(page.offset()),
        })
    }
}

/// Optional body of a deny call.
#[derive(Debug, Default, Deserialize)]
pub struct DenyRequest {
    #[serde(default)]
    pub admin_comment: Option<String>,
}

impl DenyRequest {
    /// An empty body denies without touching the stored comment.
    pub fn from_body(body: &Bytes) -> ApiResult<Self> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        Ok(serde_json::from_slice(body)?)
    }
}

/// List suggestions of one family visible to the caller
pub async fn list_suggestions(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(kind): Path<String>,
    Query(page): Query<PageParams>,
    Query(filter): Query<StatusFilter>,
) -> ApiResult<Response> {
    let kind: ComponentKind = kind.parse()?;
    let query = filter.to_query(&page)?;

    let body = with_component_family!(kind, F => {
        let (items, total) = state.suggestions.list::<F>(&actor, &query).await?;
        json_value(&Page::new(items, &page, total))?
    });

    Ok(ApiResponse::ok(body))
}

/// Submit a new suggestion
pub async fn create_suggestion(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(kind): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Response> {
    let Json(payload) = payload?;
    let kind: ComponentKind = kind.parse()?;

    let body = with_component_family!(kind, F => {
        let input: SuggestionInput<F> = serde_json::from_value(payload)?;
        let suggestion = state.suggestions.create::<F>(&actor, &input).await?;
        info!("{} submitted {} suggestion {}", actor.id, kind, suggestion.id());
        json_value(&suggestion)?
    });

    Ok(ApiResponse::created(body))
}

pub async fn get_suggestion(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path((kind, id)): Path<(String, String)>,
) -> ApiResult<Response> {
    let kind: ComponentKind = kind.parse()?;

    let body = with_component_family!(kind, F => {
        let suggestion = state.suggestions.get::<F>(&actor, &id).await?;
        json_value(&suggestion)?
    });

    Ok(ApiResponse::ok(body))
}

/// Edit a pending or denied suggestion
pub async fn update_suggestion(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path((kind, id)): Path<(String, String)>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Response> {
    let Json(payload) = payload?;
    let kind: ComponentKind = kind.parse()?;

    let body = with_component_family!(kind, F => {
        let input: SuggestionInput<F> = serde_json::from_value(payload)?;
        let suggestion = state.suggestions.update::<F>(&actor, &id, &input).await?;
        json_value(&suggestion)?
    });

    Ok(ApiResponse::ok(body))
}

pub async fn delete_suggestion(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path((kind, id)): Path<(String, String)>,
) -> ApiResult<Response> {
    let kind: ComponentKind = kind.parse()?;
    info!("{} deleting {} suggestion {}", actor.id, kind, id);

    with_component_family!(kind, F => {
        state.suggestions.delete::<F>(&actor, &id).await?;
    });

    Ok(ApiResponse::ok(Value::Null))
}

/// Remove one nested detail from a suggestion
pub async fn delete_suggestion_detail(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path((kind, id, detail_id)): Path<(String, String, String)>,
) -> ApiResult<Response> {
    let kind: ComponentKind = kind.parse()?;

    with_component_family!(kind, F => {
        state.suggestions.delete_detail::<F>(&actor, &id, &detail_id).await?;
    });

    Ok(ApiResponse::ok(Value::Null))
}

/// Promote a suggestion into the catalog
pub async fn accept_suggestion(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path((kind, id)): Path<(String, String)>,
) -> ApiResult<Response> {
    let kind: ComponentKind = kind.parse()?;

    let promotion = with_component_family!(kind, F => {
        state.moderation.accept::<F>(&actor, &id).await?
    });

    Ok(ApiResponse::ok(promotion))
}

pub async fn deny_suggestion(
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
            .deny::<F>(&actor, &id, request.admin_comment.as_deref())
            .await?
    });

    Ok(ApiResponse::ok(meta))
}
