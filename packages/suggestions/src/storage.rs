// ABOUTME: Suggestion Entity Store for whole-component create and edit proposals
// ABOUTME: Nested details and attachments are written in the same transaction as the suggestion

use chrono::Utc;
use quadbase_attachments::writes as attachment_writes;
use quadbase_attachments::{
    AttachmentInput, AttachmentKind, AttachmentOwner, AttachmentStorage, StoredUpload,
};
use quadbase_catalog::writes as catalog_writes;
use quadbase_catalog::{CatalogError, CatalogResult, ComponentSpec, DetailSpec};
use quadbase_core::utils::generate_id;
use quadbase_core::{Actor, ValidationErrors};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection, SqlitePool};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::details;
use crate::error::{ModerationError, ModerationResult};
use crate::moderated::{self, ModeratedTable};
use crate::types::{NestedDetail, Suggestion, SuggestionInput, SuggestionQuery};

const TABLE: ModeratedTable = ModeratedTable::Suggestions;

/// One item of an attachment set after uploads have been written to the blob store.
#[derive(Debug)]
enum PlannedAttachment {
    Existing { id: String, position: Option<i64> },
    New(StoredUpload),
}

#[derive(Debug)]
struct PlannedSet {
    kind: AttachmentKind,
    items: Vec<PlannedAttachment>,
}

impl PlannedSet {
    fn new_keys(&self) -> impl Iterator<Item = String> + '_ {
        self.items.iter().filter_map(|item| match item {
            PlannedAttachment::New(upload) => Some(upload.storage_key.clone()),
            PlannedAttachment::Existing { .. } => None,
        })
    }

    /// Unpin and release the blobs of a set that will not be stored.
    async fn abandon(self, attachments: &AttachmentStorage) {
        let keys: Vec<String> = self.new_keys().collect();
        drop(self);
        attachments.release_blobs(&keys).await;
    }
}

/// Attachment sets of a submission; `None` leaves the current set untouched.
#[derive(Debug, Default)]
struct PlannedUploads {
    images: Option<PlannedSet>,
    documents: Option<PlannedSet>,
}

impl PlannedUploads {
    fn sets(&self) -> impl Iterator<Item = &PlannedSet> {
        self.images.iter().chain(self.documents.iter())
    }

    fn new_keys(&self) -> Vec<String> {
        self.sets().flat_map(PlannedSet::new_keys).collect()
    }

    /// Unpin and release the blobs of uploads that will not be stored.
    async fn abandon(self, attachments: &AttachmentStorage) {
        let keys = self.new_keys();
        drop(self);
        attachments.release_blobs(&keys).await;
    }

    fn has_existing_refs(&self) -> bool {
        self.sets().any(|set| {
            set.items
                .iter()
                .any(|item| matches!(item, PlannedAttachment::Existing { .. }))
        })
    }
}

/// Fold a catalog validation result into `errors`, optionally under `prefix`.
pub(crate) fn absorb(
    errors: &mut ValidationErrors,
    result: CatalogResult<()>,
    prefix: Option<&str>,
) -> ModerationResult<()> {
    match result {
        Ok(()) => Ok(()),
        Err(CatalogError::Validation(inner)) => {
            match prefix {
                Some(prefix) => errors.extend_nested(prefix, inner),
                None => errors.extend(inner),
            }
            Ok(())
        }
        Err(other) => Err(other.into()),
    }
}

pub(crate) fn invalid_pk(id: &str) -> String {
    format!("Invalid pk \"{}\" - object does not exist.", id)
}

pub(crate) async fn load_suggestion<T: ComponentSpec>(
    conn: &mut SqliteConnection,
    row: &SqliteRow,
) -> ModerationResult<Suggestion<T>> {
    let meta = moderated::row_to_meta(row)?;
    let data: String = row.try_get("data")?;
    let owner = AttachmentOwner::suggestion(meta.id.clone());

    let details = details::fetch_suggested_details::<T::Detail>(conn, &meta.id).await?;
    let images = attachment_writes::list_for_owner(conn, &owner, Some(AttachmentKind::Image)).await?;
    let documents =
        attachment_writes::list_for_owner(conn, &owner, Some(AttachmentKind::Document)).await?;

    Ok(Suggestion {
        meta,
        kind: T::KIND,
        data: serde_json::from_str(&data)?,
        details,
        images,
        documents,
    })
}

pub struct SuggestionStorage {
    pool: SqlitePool,
    attachments: Arc<AttachmentStorage>,
}

impl SuggestionStorage {
    pub fn new(pool: SqlitePool, attachments: Arc<AttachmentStorage>) -> Self {
        Self { pool, attachments }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn attachments(&self) -> &Arc<AttachmentStorage> {
        &self.attachments
    }

    /// Submit a new suggestion in `pending` state, owned by `actor`.
    pub async fn create<T: ComponentSpec>(
        &self,
        actor: &Actor,
        input: &SuggestionInput<T>,
    ) -> ModerationResult<Suggestion<T>> {
        if let Some(id) = input
            .details
            .iter()
            .flatten()
            .find_map(|detail| detail.id.as_deref())
        {
            return Err(details::detail_not_found(id));
        }

        let uploads = self.plan_uploads::<T>(input).await?;
        if uploads.has_existing_refs() {
            uploads.abandon(&self.attachments).await;
            return Err(ModerationError::NotFound(
                "Attachment referenced by a new suggestion".to_string(),
            ));
        }

        match self.create_inner(actor, input, &uploads).await {
            Ok(id) => {
                drop(uploads);
                self.get::<T>(actor, &id).await
            }
            Err(e) => {
                uploads.abandon(&self.attachments).await;
                Err(e)
            }
        }
    }

    async fn create_inner<T: ComponentSpec>(
        &self,
        actor: &Actor,
        input: &SuggestionInput<T>,
        uploads: &PlannedUploads,
    ) -> ModerationResult<String> {
        let mut tx = self.pool.begin().await?;
        let nested: &[NestedDetail<T::Detail>] = input.details.as_deref().unwrap_or_default();

        let mut errors = ValidationErrors::new();
        validate_submission(&mut tx, actor, input, nested, &mut errors).await?;
        if input.related_instance_id.is_none() {
            for detail_kind in T::DETAIL_KINDS {
                if !nested.iter().any(|d| d.data.detail_kind() == *detail_kind) {
                    errors.push(
                        "details",
                        format!("At least one {} detail is required.", detail_kind),
                    );
                }
            }
        }
        errors.into_result()?;

        let id = generate_id("sug");
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO suggestions (
                id, kind, user_id, status, request_description, related_instance_id,
                data, created_at, updated_at
            )
            VALUES (?, ?, ?, 'pending', ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(T::KIND.as_str())
        .bind(&actor.id)
        .bind(&input.request_description)
        .bind(&input.related_instance_id)
        .bind(serde_json::to_string(&input.data)?)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        for detail in nested {
            details::insert_suggested_detail(&mut tx, &id, &detail.data).await?;
        }

        let owner = AttachmentOwner::suggestion(&id);
        for set in uploads.sets() {
            for item in &set.items {
                if let PlannedAttachment::New(upload) = item {
                    attachment_writes::insert_attachment(&mut tx, T::KIND, &owner, upload).await?;
                }
            }
        }

        tx.commit().await?;

        info!(
            "Created {} suggestion {} by {} ({})",
            T::KIND,
            id,
            actor.id,
            if input.related_instance_id.is_some() { "edit" } else { "new" }
        );
        Ok(id)
    }

    /// Edit a suggestion. Approved suggestions are read-only; denied ones reopen as pending.
    pub async fn update<T: ComponentSpec>(
        &self,
        actor: &Actor,
        id: &str,
        input: &SuggestionInput<T>,
    ) -> ModerationResult<Suggestion<T>> {
        let uploads = self.plan_uploads::<T>(input).await?;

        match self.update_inner(actor, id, input, &uploads).await {
            Ok(removed_keys) => {
                drop(uploads);
                self.attachments.release_blobs(&removed_keys).await;
                self.get::<T>(actor, id).await
            }
            Err(e) => {
                uploads.abandon(&self.attachments).await;
                Err(e)
            }
        }
    }

    async fn update_inner<T: ComponentSpec>(
        &self,
        actor: &Actor,
        id: &str,
        input: &SuggestionInput<T>,
        uploads: &PlannedUploads,
    ) -> ModerationResult<Vec<String>> {
        let mut tx = self.pool.begin().await?;
        let (_, next_status) =
            moderated::claim_for_edit(&mut tx, TABLE, T::KIND.as_str(), id, actor)
                .await
                .inspect_err(|e| {
                    if matches!(e, ModerationError::StateConflict(_)) {
                        warn!("Rejected edit of approved suggestion {}", id);
                    }
                })?;

        // Nested ids must belong to this suggestion
        let owned_details: HashSet<String> =
            details::detail_ids(&mut tx, id).await?.into_iter().collect();
        if let Some(nested) = &input.details {
            for detail in nested {
                if let Some(detail_id) = &detail.id {
                    if !owned_details.contains(detail_id) {
                        return Err(details::detail_not_found(detail_id));
                    }
                }
            }
        }
        for set in uploads.sets() {
            for item in &set.items {
                if let PlannedAttachment::Existing { id: attachment_id, .. } = item {
                    let owned = attachment_writes::fetch_attachment(&mut tx, attachment_id)
                        .await?
                        .filter(|a| a.suggestion_id() == Some(id) && a.kind == set.kind);
                    if owned.is_none() {
                        return Err(ModerationError::NotFound(format!(
                            "Attachment {}",
                            attachment_id
                        )));
                    }
                }
            }
        }

        let nested: &[NestedDetail<T::Detail>] = input.details.as_deref().unwrap_or_default();
        let mut errors = ValidationErrors::new();
        validate_submission(&mut tx, actor, input, nested, &mut errors).await?;
        errors.into_result()?;

        sqlx::query(
            r#"
            UPDATE suggestions
            SET data = ?, request_description = ?, related_instance_id = ?, status = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(serde_json::to_string(&input.data)?)
        .bind(&input.request_description)
        .bind(&input.related_instance_id)
        .bind(next_status.as_str())
        .bind(Utc::now())
        .bind(id)
        .execute(&mut *tx)
        .await?;

        if let Some(nested) = &input.details {
            let mut kept = HashSet::new();
            for detail in nested {
                match &detail.id {
                    Some(detail_id) => {
                        details::update_suggested_detail(&mut tx, detail_id, &detail.data).await?;
                        kept.insert(detail_id.clone());
                    }
                    None => {
                        let new_id =
                            details::insert_suggested_detail(&mut tx, id, &detail.data).await?;
                        kept.insert(new_id);
                    }
                }
            }
            for detail_id in owned_details.difference(&kept) {
                details::remove_suggested_detail(&mut tx, detail_id).await?;
            }
        }

        let mut removed_keys = Vec::new();
        let owner = AttachmentOwner::suggestion(id);
        for set in uploads.sets() {
            let mut kept = HashSet::new();
            for item in &set.items {
                match item {
                    PlannedAttachment::Existing {
                        id: attachment_id,
                        position,
                    } => {
                        if let Some(position) = position {
                            attachment_writes::update_position(&mut tx, attachment_id, *position)
                                .await?;
                        }
                        kept.insert(attachment_id.clone());
                    }
                    PlannedAttachment::New(upload) => {
                        let stored =
                            attachment_writes::insert_attachment(&mut tx, T::KIND, &owner, upload)
                                .await?;
                        kept.insert(stored.id);
                    }
                }
            }

            let current = attachment_writes::list_for_owner(&mut tx, &owner, Some(set.kind)).await?;
            for attachment in current.iter().filter(|a| !kept.contains(&a.id)) {
                if let Some(key) = attachment_writes::delete_attachment(&mut tx, &attachment.id).await? {
                    removed_keys.push(key);
                }
            }
        }

        if input.related_instance_id.is_none() {
            let missing = details::missing_detail_kinds(&mut tx, id, T::DETAIL_KINDS).await?;
            let mut errors = ValidationErrors::new();
            for detail_kind in missing {
                errors.push(
                    "details",
                    format!("At least one {} detail is required.", detail_kind),
                );
            }
            errors.into_result()?;
        }

        tx.commit().await?;

        info!(
            "Updated {} suggestion {} (status now {})",
            T::KIND,
            id,
            next_status
        );
        Ok(removed_keys)
    }

    pub async fn get<T: ComponentSpec>(
        &self,
        actor: &Actor,
        id: &str,
    ) -> ModerationResult<Suggestion<T>> {
        let mut conn = self.pool.acquire().await?;
        let row = moderated::fetch_visible(&mut conn, TABLE, T::KIND.as_str(), id, actor).await?;
        load_suggestion::<T>(&mut conn, &row).await
    }

    /// Suggestions of family `T` visible to `actor`, newest first.
    pub async fn list<T: ComponentSpec>(
        &self,
        actor: &Actor,
        query: &SuggestionQuery,
    ) -> ModerationResult<(Vec<Suggestion<T>>, i64)> {
        debug!("Listing {} suggestions for {} ({:?})", T::KIND, actor.id, query);

        let mut conn = self.pool.acquire().await?;
        let (rows, total) =
            moderated::list_visible(&mut conn, TABLE, T::KIND.as_str(), actor, query).await?;

        let mut suggestions = Vec::with_capacity(rows.len());
        for row in &rows {
            suggestions.push(load_suggestion::<T>(&mut conn, row).await?);
        }
        Ok((suggestions, total))
    }

    /// Delete a suggestion with its details and any attachments it still owns.
    ///
    /// Attachments already promoted belong to the canonical component and stay.
    pub async fn delete<T: ComponentSpec>(&self, actor: &Actor, id: &str) -> ModerationResult<()> {
        let mut tx = self.pool.begin().await?;
        moderated::fetch_visible(&mut tx, TABLE, T::KIND.as_str(), id, actor).await?;
        let keys = attachment_writes::delete_for_suggestion(&mut tx, id).await?;
        moderated::delete_row(&mut tx, TABLE, id).await?;
        tx.commit().await?;

        info!("Deleted {} suggestion {}", T::KIND, id);
        self.attachments.release_blobs(&keys).await;
        Ok(())
    }

    /// Delete one nested detail unless it is the last of its kind.
    pub async fn delete_detail<T: ComponentSpec>(
        &self,
        actor: &Actor,
        suggestion_id: &str,
        detail_id: &str,
    ) -> ModerationResult<()> {
        let mut tx = self.pool.begin().await?;
        let (_, next_status) =
            moderated::claim_for_edit(&mut tx, TABLE, T::KIND.as_str(), suggestion_id, actor)
                .await?;
        details::delete_suggested_detail(&mut tx, suggestion_id, detail_id).await?;
        moderated::mark_edited(&mut tx, TABLE, suggestion_id, next_status).await?;
        tx.commit().await?;
        Ok(())
    }

    /// Decode and store new uploads ahead of the database transaction.
    async fn plan_uploads<T: ComponentSpec>(
        &self,
        input: &SuggestionInput<T>,
    ) -> ModerationResult<PlannedUploads> {
        let mut planned = PlannedUploads::default();
        let mut errors = ValidationErrors::new();

        for (kind, items) in [
            (AttachmentKind::Image, &input.images),
            (AttachmentKind::Document, &input.documents),
        ] {
            let Some(items) = items else { continue };
            let set = match self.plan_set::<T>(kind, items, &mut errors).await {
                Ok(set) => set,
                Err(e) => {
                    planned.abandon(&self.attachments).await;
                    return Err(e);
                }
            };
            match kind {
                AttachmentKind::Image => planned.images = Some(set),
                AttachmentKind::Document => planned.documents = Some(set),
            }
        }

        if !errors.is_empty() {
            planned.abandon(&self.attachments).await;
            return Err(errors.into());
        }
        Ok(planned)
    }

    async fn plan_set<T: ComponentSpec>(
        &self,
        kind: AttachmentKind,
        items: &[AttachmentInput],
        errors: &mut ValidationErrors,
    ) -> ModerationResult<PlannedSet> {
        let mut set = PlannedSet {
            kind,
            items: Vec::with_capacity(items.len()),
        };

        for (index, item) in items.iter().enumerate() {
            if let Some(id) = &item.id {
                set.items.push(PlannedAttachment::Existing {
                    id: id.clone(),
                    position: item.position,
                });
                continue;
            }

            let field = format!("{}[{}]", kind.dir(), index);
            match self.attachments.prepare(kind, T::KIND, item, &field).await {
                Ok(upload) => set.items.push(PlannedAttachment::New(upload)),
                Err(quadbase_attachments::AttachmentError::Validation(inner)) => {
                    errors.extend(inner)
                }
                Err(other) => {
                    set.abandon(&self.attachments).await;
                    return Err(other.into());
                }
            }
        }
        Ok(set)
    }
}

/// Field rules, references, nested detail rules, and the edited component's existence.
async fn validate_submission<T: ComponentSpec>(
    conn: &mut SqliteConnection,
    actor: &Actor,
    input: &SuggestionInput<T>,
    nested: &[NestedDetail<T::Detail>],
    errors: &mut ValidationErrors,
) -> ModerationResult<()> {
    absorb(
        errors,
        catalog_writes::validate_component(conn, &input.data).await,
        None,
    )?;
    errors.check_optional_chars(
        "request_description",
        input.request_description.as_deref(),
        5000,
    );

    if let Some(component_id) = &input.related_instance_id {
        let visible = catalog_writes::fetch_component::<T>(conn, component_id)
            .await?
            .is_some_and(|item| item.owner_id.as_deref().map_or(true, |o| actor.can_access(o)));
        if !visible {
            errors.push("related_instance_id", invalid_pk(component_id));
        }
    }

    for (index, detail) in nested.iter().enumerate() {
        absorb(
            errors,
            catalog_writes::validate_detail(conn, &detail.data).await,
            Some(&format!("details[{}]", index)),
        )?;
    }
    Ok(())
}
