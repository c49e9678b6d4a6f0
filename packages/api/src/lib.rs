// ABOUTME: HTTP API layer for Quadbase providing REST endpoints and routing
// ABOUTME: Thin gateway over the catalog, moderation, and favorites packages

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Router,
};
use tower_http::trace::TraceLayer;

pub mod actor;
pub mod catalog_handlers;
pub mod detail_suggestion_handlers;
pub mod error;
pub mod health;
pub mod list_handlers;
pub mod lookup_suggestion_handlers;
pub mod pagination;
pub mod response;
pub mod state;
pub mod suggestion_handlers;

pub use actor::{CurrentActor, MODERATOR_HEADER, USER_ID_HEADER};
pub use error::{ApiError, ApiResult};
pub use response::ApiResponse;
pub use state::AppState;

/// Uploads of the maximum size that fit in one request body.
pub const UPLOADS_PER_REQUEST: usize = 4;

/// Allowance for the JSON fields around the uploads.
const BODY_OVERHEAD_BYTES: usize = 1024 * 1024;

/// Largest accepted request body for a given per-file upload limit.
///
/// Uploads travel base64-encoded inside JSON, so each costs 4/3 of its size.
pub fn request_body_limit(max_upload_bytes: usize) -> usize {
    max_upload_bytes
        .div_ceil(3)
        .saturating_mul(4)
        .saturating_mul(UPLOADS_PER_REQUEST)
        .saturating_add(BODY_OVERHEAD_BYTES)
}

/// Creates the catalog API router (nested under /api/catalog)
pub fn create_catalog_router() -> Router<AppState> {
    Router::new()
        .route(
            "/{kind}",
            get(catalog_handlers::list_components).post(catalog_handlers::create_component),
        )
        .route("/{kind}/{id}", get(catalog_handlers::get_component))
        .route(
            "/{kind}/{id}/details/{detail_id}",
            delete(catalog_handlers::delete_component_detail),
        )
}

/// Creates the whole-component suggestions router (nested under /api/suggestions)
pub fn create_suggestions_router() -> Router<AppState> {
    Router::new()
        .route(
            "/{kind}",
            get(suggestion_handlers::list_suggestions).post(suggestion_handlers::create_suggestion),
        )
        .route(
            "/{kind}/{id}",
            get(suggestion_handlers::get_suggestion)
                .put(suggestion_handlers::update_suggestion)
                .delete(suggestion_handlers::delete_suggestion),
        )
        .route(
            "/{kind}/{id}/accept",
            post(suggestion_handlers::accept_suggestion),
        )
        .route("/{kind}/{id}/deny", post(suggestion_handlers::deny_suggestion))
        .route(
            "/{kind}/{id}/details/{detail_id}",
            delete(suggestion_handlers::delete_suggestion_detail),
        )
}

/// Creates the existing-detail suggestions router (nested under /api/detail-suggestions)
pub fn create_detail_suggestions_router() -> Router<AppState> {
    Router::new()
        .route(
            "/{kind}",
            get(detail_suggestion_handlers::list_detail_suggestions)
                .post(detail_suggestion_handlers::create_detail_suggestion),
        )
        .route(
            "/{kind}/{id}",
            get(detail_suggestion_handlers::get_detail_suggestion)
                .delete(detail_suggestion_handlers::delete_detail_suggestion),
        )
        .route(
            "/{kind}/{id}/accept",
            post(detail_suggestion_handlers::accept_detail_suggestion),
        )
        .route(
            "/{kind}/{id}/deny",
            post(detail_suggestion_handlers::deny_detail_suggestion),
        )
}

/// Creates the lookup suggestions router (nested under /api/lookup-suggestions)
pub fn create_lookup_suggestions_router() -> Router<AppState> {
    Router::new()
        .route(
            "/{kind}",
            get(lookup_suggestion_handlers::list_lookup_suggestions)
                .post(lookup_suggestion_handlers::create_lookup_suggestion),
        )
        .route(
            "/{kind}/{id}",
            get(lookup_suggestion_handlers::get_lookup_suggestion)
                .delete(lookup_suggestion_handlers::delete_lookup_suggestion),
        )
        .route(
            "/{kind}/{id}/accept",
            post(lookup_suggestion_handlers::accept_lookup_suggestion),
        )
        .route(
            "/{kind}/{id}/deny",
            post(lookup_suggestion_handlers::deny_lookup_suggestion),
        )
}

/// Creates the favorites lists router (nested under /api/lists)
pub fn create_lists_router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(list_handlers::list_lists).post(list_handlers::create_list),
        )
        .route(
            "/{id}",
            get(list_handlers::get_list)
                .put(list_handlers::rename_list)
                .delete(list_handlers::delete_list),
        )
        .route(
            "/{id}/items",
            get(list_handlers::list_items).post(list_handlers::add_item),
        )
        .route("/{id}/items/{item_id}", delete(list_handlers::remove_item))
        .route("/{id}/counts", get(list_handlers::count_items))
}

/// Full application router with request tracing.
pub fn create_router(state: AppState) -> Router {
    let body_limit = request_body_limit(state.attachments.max_upload_bytes());

    Router::new()
        .route("/api/health", get(health::health_check))
        .route("/api/lookups/{kind}", get(catalog_handlers::list_lookups))
        .route(
            "/api/attachments/{id}",
            get(catalog_handlers::get_attachment),
        )
        .nest("/api/catalog", create_catalog_router())
        .nest("/api/suggestions", create_suggestions_router())
        .nest("/api/detail-suggestions", create_detail_suggestions_router())
        .nest("/api/lookup-suggestions", create_lookup_suggestions_router())
        .nest("/api/lists", create_lists_router())
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
