// ABOUTME: Shared application state handed to every handler
// ABOUTME: Bundles the catalog, attachment, suggestion, moderation, and list stores over one pool

use quadbase_attachments::{AttachmentStorage, BlobStore};
use quadbase_catalog::CatalogStorage;
use quadbase_lists::ListStorage;
use quadbase_suggestions::{
    DetailSuggestionStorage, LookupSuggestionStorage, ModerationEngine, SuggestionStorage,
};
use sqlx::SqlitePool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<CatalogStorage>,
    pub attachments: Arc<AttachmentStorage>,
    pub suggestions: Arc<SuggestionStorage>,
    pub detail_suggestions: Arc<DetailSuggestionStorage>,
    pub lookup_suggestions: Arc<LookupSuggestionStorage>,
    pub moderation: Arc<ModerationEngine>,
    pub lists: Arc<ListStorage>,
}

impl AppState {
    pub fn new(pool: SqlitePool, blobs: Arc<dyn BlobStore>, max_upload_bytes: usize) -> Self {
        let attachments = Arc::new(
            AttachmentStorage::new(pool.clone(), blobs).with_max_upload_bytes(max_upload_bytes),
        );

        Self {
            catalog: Arc::new(CatalogStorage::new(pool.clone())),
            suggestions: Arc::new(SuggestionStorage::new(pool.clone(), attachments.clone())),
            attachments,
            detail_suggestions: Arc::new(DetailSuggestionStorage::new(pool.clone())),
            lookup_suggestions: Arc::new(LookupSuggestionStorage::new(pool.clone())),
            moderation: Arc::new(ModerationEngine::with_flag_policy(pool.clone())),
            lists: Arc::new(ListStorage::new(pool)),
        }
    }
}
