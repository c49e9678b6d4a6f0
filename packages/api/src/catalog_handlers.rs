// ABOUTME: HTTP handlers for the canonical component catalog and lookup tables
// ABOUTME: Family-specific payloads are dispatched from the `{kind}` path segment

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use quadbase_attachments::AttachmentOwner;
use quadbase_catalog::{
    with_component_family, ComponentKind, ComponentQuery, ComponentSpec, LookupKind, Visibility,
};
use quadbase_core::Actor;
use serde::Deserialize;
use serde_json::Value;
use tracing::info;

use crate::actor::CurrentActor;
use crate::error::{ApiError, ApiResult};
use crate::pagination::{Page, PageParams};
use crate::response::{json_value, ApiResponse};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct CatalogSearch {
    #[serde(default)]
    pub search: Option<String>,
}

/// Body of a direct catalog create.
#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = ""))]
struct CreateComponentRequest<T: ComponentSpec> {
    #[serde(flatten)]
    data: T,
    #[serde(default)]
    details: Vec<T::Detail>,
}

fn visibility_for(actor: Option<&Actor>) -> Visibility {
    match actor {
        None => Visibility::Public,
        Some(actor) if actor.is_moderator => Visibility::All,
        Some(actor) => Visibility::PublicAndOwner(actor.id.clone()),
    }
}

/// Private items are invisible to everyone but their owner and moderators.
fn ensure_visible(
    actor: Option<&Actor>,
    owner_id: Option<&str>,
    kind: ComponentKind,
    id: &str,
) -> ApiResult<()> {
    match owner_id {
        None => Ok(()),
        Some(owner) if actor.is_some_and(|a| a.can_access(owner)) => Ok(()),
        Some(_) => Err(ApiError::NotFound(format!("{} {}", kind.display_name(), id))),
    }
}

/// Public items change only through moderators; private items through their owner.
fn ensure_editable(actor: &Actor, owner_id: Option<&str>) -> ApiResult<()> {
    match owner_id {
        None if actor.is_moderator => Ok(()),
        None => Err(ApiError::forbidden(
            "Only moderators may change public catalog items",
        )),
        Some(owner) if actor.can_access(owner) => Ok(()),
        Some(_) => Err(ApiError::forbidden(
            "You do not have permission to change this item",
        )),
    }
}

/// List components of one family
pub async fn list_components(
    State(state): State<AppState>,
    actor: Option<CurrentActor>,
    Path(kind): Path<String>,
    Query(page): Query<PageParams>,
    Query(filter): Query<CatalogSearch>,
) -> ApiResult<Response> {
    let kind: ComponentKind = kind.parse()?;
    let query = ComponentQuery {
        visibility: visibility_for(actor.as_ref().map(|a| &a.0)),
        search: filter.search,
        limit: Some(page.limit()),
        offset: Some(page.offset()),
    };

    let body = with_component_family!(kind, F => {
        let (items, total) = state.catalog.list_components::<F>(&query).await?;
        json_value(&Page::new(items, &page, total))?
    });

    Ok(ApiResponse::ok(body))
}

/// Get one component with its details and approved attachments
pub async fn get_component(
    State(state): State<AppState>,
    actor: Option<CurrentActor>,
    Path((kind, id)): Path<(String, String)>,
) -> ApiResult<Response> {
    let kind: ComponentKind = kind.parse()?;

    let mut body = with_component_family!(kind, F => {
        let entry = state.catalog.get_component::<F>(&id).await?;
        ensure_visible(actor.as_ref().map(|a| &a.0), entry.item.owner_id.as_deref(), kind, &id)?;
        json_value(&entry)?
    });

    let attachments = state
        .attachments
        .list_for_owner(&AttachmentOwner::canonical(kind, id.as_str()), None)
        .await?;
    if let Some(object) = body.as_object_mut() {
        object.insert("attachments".to_string(), json_value(&attachments)?);
    }

    Ok(ApiResponse::ok(body))
}

/// Create a component directly
///
/// Moderators publish public items; everyone else creates a private item
/// visible only to themselves.
pub async fn create_component(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(kind): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Response> {
    let Json(payload) = payload?;
    let kind: ComponentKind = kind.parse()?;
    let owner_id = if actor.is_moderator {
        None
    } else {
        Some(actor.id.as_str())
    };
    info!("Creating {} for {} (public: {})", kind, actor.id, owner_id.is_none());

    let body = with_component_family!(kind, F => {
        let request: CreateComponentRequest<F> = serde_json::from_value(payload)?;
        let entry = state
            .catalog
            .create_component::<F>(owner_id, &request.data, &request.details)
            .await?;
        json_value(&entry)?
    });

    Ok(ApiResponse::created(body))
}

/// Delete one detail of a catalog component
pub async fn delete_component_detail(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path((kind, id, detail_id)): Path<(String, String, String)>,
) -> ApiResult<Response> {
    let kind: ComponentKind = kind.parse()?;
    info!("Deleting detail {} of {} {}", detail_id, kind, id);

    with_component_family!(kind, F => {
        let entry = state.catalog.get_component::<F>(&id).await?;
        ensure_visible(Some(&actor), entry.item.owner_id.as_deref(), kind, &id)?;
        ensure_editable(&actor, entry.item.owner_id.as_deref())?;
        state.catalog.delete_detail::<F>(&id, &detail_id).await?;
    });

    Ok(ApiResponse::ok(Value::Null))
}

/// List the rows of one lookup table
pub async fn list_lookups(
    State(state): State<AppState>,
    Path(kind): Path<String>,
) -> ApiResult<Response> {
    let kind: LookupKind = kind.parse()?;
    let lookups = state.catalog.list_lookups(kind).await?;
    Ok(ApiResponse::ok(lookups))
}

/// Stream the bytes of one attachment
///
/// Attachments follow the visibility of their owner: the component for
/// approved files, the suggestion for pending ones.
pub async fn get_attachment(
    State(state): State<AppState>,
    actor: Option<CurrentActor>,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    let actor = actor.map(|a| a.0);
    let attachment = state.attachments.get(&id).await?;
    let kind = attachment.component_kind;

    match &attachment.owner {
        AttachmentOwner::Canonical { id: component_id, .. } => {
            with_component_family!(kind, F => {
                let entry = state.catalog.get_component::<F>(component_id).await?;
                ensure_visible(actor.as_ref(), entry.item.owner_id.as_deref(), kind, component_id)?;
            });
        }
        AttachmentOwner::Suggestion { id: suggestion_id } => {
            let actor = actor
                .as_ref()
                .ok_or_else(|| ApiError::NotFound(format!("Attachment {}", id)))?;
            with_component_family!(kind, F => {
                state.suggestions.get::<F>(actor, suggestion_id).await?;
            });
        }
    }

    let (attachment, bytes) = state.attachments.open(&id).await?;
    let disposition = format!("inline; filename=\"{}\"", attachment.file_name.replace('"', ""));

    Ok((
        [
            (header::CONTENT_TYPE, attachment.content_type),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visibility_scopes() {
        assert_eq!(visibility_for(None), Visibility::Public);
        assert_eq!(
            visibility_for(Some(&Actor::user("u1"))),
            Visibility::PublicAndOwner("u1".to_string())
        );
        assert_eq!(visibility_for(Some(&Actor::moderator("m1"))), Visibility::All);
    }

    #[test]
    fn test_private_items_hidden_from_strangers() {
        let owner = Actor::user("u1");
        let stranger = Actor::user("u2");

        assert!(ensure_visible(None, None, ComponentKind::Motor, "c1").is_ok());
        assert!(ensure_visible(Some(&owner), Some("u1"), ComponentKind::Motor, "c1").is_ok());
        assert!(matches!(
            ensure_visible(Some(&stranger), Some("u1"), ComponentKind::Motor, "c1"),
            Err(ApiError::NotFound(_))
        ));
        assert!(matches!(
            ensure_visible(None, Some("u1"), ComponentKind::Motor, "c1"),
            Err(ApiError::NotFound(_))
        ));
    }

    #[test]
    fn test_public_items_need_moderator_to_edit() {
        assert!(ensure_editable(&Actor::moderator("m1"), None).is_ok());
        assert!(matches!(
            ensure_editable(&Actor::user("u1"), None),
            Err(ApiError::Forbidden(_))
        ));
        assert!(ensure_editable(&Actor::user("u1"), Some("u1")).is_ok());
    }
}
