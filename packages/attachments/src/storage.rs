// ABOUTME: Attachment storage layer combining SQLite rows with a blob store
// ABOUTME: Handles upload preparation, owner-scoped listing, and blob release after deletes

use quadbase_core::constants::DEFAULT_MAX_UPLOAD_BYTES;
use quadbase_core::ComponentKind;
use sqlx::SqlitePool;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::blob::{BlobPins, BlobStore};
use crate::error::{AttachmentError, AttachmentResult};
use crate::types::{Attachment, AttachmentInput, AttachmentKind, AttachmentOwner, StoredUpload};
use crate::upload::decode_upload;
use crate::writes;

pub struct AttachmentStorage {
    pool: SqlitePool,
    blobs: Arc<dyn BlobStore>,
    max_upload_bytes: usize,
    pins: BlobPins,
    /// Orders pinning against the check-then-delete in `release_blobs`.
    release_lock: Mutex<()>,
}

impl AttachmentStorage {
    pub fn new(pool: SqlitePool, blobs: Arc<dyn BlobStore>) -> Self {
        Self {
            pool,
            blobs,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            pins: BlobPins::new(),
            release_lock: Mutex::new(()),
        }
    }

    pub fn with_max_upload_bytes(mut self, max_upload_bytes: usize) -> Self {
        self.max_upload_bytes = max_upload_bytes;
        self
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_bytes
    }

    pub fn blobs(&self) -> &Arc<dyn BlobStore> {
        &self.blobs
    }

    /// Decode an upload item and write its body to the blob store.
    ///
    /// Rows are inserted separately so the caller can do it inside its own transaction.
    /// The blob stays pinned until the returned upload is dropped, so hold it until
    /// that transaction has committed or rolled back.
    pub async fn prepare(
        &self,
        kind: AttachmentKind,
        component_kind: ComponentKind,
        input: &AttachmentInput,
        field: &str,
    ) -> AttachmentResult<StoredUpload> {
        let upload = decode_upload(kind, input, self.max_upload_bytes, field)?;
        let storage_key = upload.storage_key(component_kind);

        let pin = {
            let _guard = self.release_lock.lock().await;
            self.pins.pin(&storage_key)
        };
        if !self.blobs.exists(&storage_key).await? {
            self.blobs.put(&storage_key, &upload.bytes).await?;
        }

        Ok(StoredUpload {
            kind,
            file_name: upload.file_name,
            content_type: upload.content_type,
            size_bytes: upload.bytes.len() as i64,
            storage_key,
            position: upload.position,
            _pin: pin,
        })
    }

    /// Upload straight to a canonical component; such attachments are accepted immediately.
    pub async fn attach_to_component(
        &self,
        kind: AttachmentKind,
        component_kind: ComponentKind,
        component_id: &str,
        input: &AttachmentInput,
    ) -> AttachmentResult<Attachment> {
        let upload = self
            .prepare(kind, component_kind, input, kind.dir())
            .await?;
        let mut conn = self.pool.acquire().await?;
        writes::insert_attachment(
            &mut conn,
            component_kind,
            &AttachmentOwner::canonical(component_kind, component_id),
            &upload,
        )
        .await
    }

    /// Upload to a pending suggestion; the attachment waits for promotion.
    pub async fn attach_to_suggestion(
        &self,
        kind: AttachmentKind,
        component_kind: ComponentKind,
        suggestion_id: &str,
        input: &AttachmentInput,
    ) -> AttachmentResult<Attachment> {
        let upload = self
            .prepare(kind, component_kind, input, kind.dir())
            .await?;
        let mut conn = self.pool.acquire().await?;
        writes::insert_attachment(
            &mut conn,
            component_kind,
            &AttachmentOwner::suggestion(suggestion_id),
            &upload,
        )
        .await
    }

    pub async fn get(&self, id: &str) -> AttachmentResult<Attachment> {
        let mut conn = self.pool.acquire().await?;
        writes::fetch_attachment(&mut conn, id)
            .await?
            .ok_or_else(|| AttachmentError::NotFound(format!("Attachment {}", id)))
    }

    /// Attachment metadata together with its body.
    pub async fn open(&self, id: &str) -> AttachmentResult<(Attachment, Vec<u8>)> {
        let attachment = self.get(id).await?;
        let bytes = self.blobs.get(&attachment.storage_key).await?;
        Ok((attachment, bytes))
    }

    pub async fn list_for_owner(
        &self,
        owner: &AttachmentOwner,
        kind: Option<AttachmentKind>,
    ) -> AttachmentResult<Vec<Attachment>> {
        let mut conn = self.pool.acquire().await?;
        writes::list_for_owner(&mut conn, owner, kind).await
    }

    /// Move a suggestion's pending attachments onto a canonical component.
    pub async fn reattach_orphans(
        &self,
        suggestion_id: &str,
        component_id: &str,
    ) -> AttachmentResult<u64> {
        let mut tx = self.pool.begin().await?;
        let moved = writes::reattach_orphans(&mut tx, suggestion_id, component_id).await?;
        tx.commit().await?;
        Ok(moved)
    }

    pub async fn delete(&self, id: &str) -> AttachmentResult<()> {
        let mut conn = self.pool.acquire().await?;
        let key = writes::delete_attachment(&mut conn, id)
            .await?
            .ok_or_else(|| AttachmentError::NotFound(format!("Attachment {}", id)))?;
        drop(conn);

        self.release_blobs(&[key]).await;
        Ok(())
    }

    /// Delete every attachment a suggestion still owns.
    pub async fn delete_for_suggestion(&self, suggestion_id: &str) -> AttachmentResult<usize> {
        let mut conn = self.pool.acquire().await?;
        let keys = writes::delete_for_suggestion(&mut conn, suggestion_id).await?;
        drop(conn);

        let count = keys.len();
        self.release_blobs(&keys).await;
        Ok(count)
    }

    /// Remove blobs no attachment row refers to any more.
    ///
    /// Call after the deleting transaction commits. Blobs pinned by an upload in
    /// flight are kept. Failures are logged, not returned.
    pub async fn release_blobs(&self, keys: &[String]) {
        let _guard = self.release_lock.lock().await;
        for key in keys {
            if self.pins.is_pinned(key) {
                debug!("Blob {} pinned by a pending upload, keeping it", key);
                continue;
            }

            let still_used: Result<i64, sqlx::Error> =
                sqlx::query_scalar("SELECT COUNT(*) FROM attachments WHERE storage_key = ?")
                    .bind(key)
                    .fetch_one(&self.pool)
                    .await;

            match still_used {
                Ok(0) => {
                    if let Err(e) = self.blobs.delete(key).await {
                        warn!("Failed to delete blob {}: {}", key, e);
                    } else {
                        debug!("Released blob {}", key);
                    }
                }
                Ok(_) => debug!("Blob {} still referenced, keeping it", key),
                Err(e) => warn!("Failed to check blob references for {}: {}", key, e),
            }
        }
    }
}
