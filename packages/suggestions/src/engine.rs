// ABOUTME: Promotion engine: accept and deny for every kind of suggestion
// ABOUTME: Each accept runs in one transaction that creates or updates canonical records idempotently

use quadbase_attachments::writes as attachment_writes;
use quadbase_catalog::writes as catalog_writes;
use quadbase_catalog::{CatalogDetail, ComponentSpec, Lookup, LookupData};
use quadbase_core::{Actor, LookupKind};
use sqlx::{Row, SqlitePool};
use std::sync::Arc;
use tracing::{info, warn};

use crate::details;
use crate::error::{ModerationError, ModerationResult};
use crate::moderated::{self, ModeratedTable};
use crate::policy::{ModerationPolicy, ModeratorFlagPolicy};
use crate::types::{ModerationMeta, Promotion};

pub struct ModerationEngine {
    pool: SqlitePool,
    policy: Arc<dyn ModerationPolicy>,
}

impl ModerationEngine {
    pub fn new(pool: SqlitePool, policy: Arc<dyn ModerationPolicy>) -> Self {
        Self { pool, policy }
    }

    /// Engine trusting the actor's moderator flag.
    pub fn with_flag_policy(pool: SqlitePool) -> Self {
        Self::new(pool, Arc::new(ModeratorFlagPolicy))
    }

    fn authorize(&self, actor: &Actor, action: &str, id: &str) -> ModerationResult<()> {
        self.policy.require_moderator(actor).inspect_err(|_| {
            warn!("{} may not {} suggestion {}", actor.id, action, id);
        })
    }

    /// Promote a whole-component suggestion into the catalog.
    ///
    /// Re-accepting an approved suggestion updates the component and details it
    /// produced the first time instead of creating new ones. Any failure rolls
    /// back every write, leaving the suggestion as it was.
    pub async fn accept<T: ComponentSpec>(
        &self,
        actor: &Actor,
        id: &str,
    ) -> ModerationResult<Promotion> {
        self.authorize(actor, "accept", id)?;

        let mut tx = self.pool.begin().await?;
        let row = moderated::claim(&mut tx, ModeratedTable::Suggestions, T::KIND.as_str(), id).await?;
        let meta = moderated::row_to_meta(&row)?;
        let data: String = row.try_get("data")?;
        let data: T = serde_json::from_str(&data)?;

        let (component_id, created) = match &meta.related_instance_id {
            Some(component_id) => {
                catalog_writes::update_component::<T>(&mut tx, component_id, &data).await?;
                (component_id.clone(), false)
            }
            None => {
                let item = catalog_writes::insert_component::<T>(&mut tx, None, &data).await?;
                (item.id, true)
            }
        };

        let attachments_moved = attachment_writes::reattach_orphans(&mut tx, id, &component_id).await?;

        let suggested = details::fetch_suggested_details::<T::Detail>(&mut tx, id).await?;
        let mut details_created = 0;
        let mut details_updated = 0;
        for (index, detail) in suggested.iter().enumerate() {
            let prefix = format!("details[{}]", index);

            let updated = match &detail.related_instance_id {
                Some(detail_id) => {
                    catalog_writes::update_detail::<T>(&mut tx, &component_id, detail_id, &detail.data)
                        .await
                        .map_err(|e| ModerationError::from(e).nested(&prefix))?
                }
                None => None,
            };

            if updated.is_some() {
                details_updated += 1;
            } else {
                let promoted = catalog_writes::insert_detail::<T>(&mut tx, &component_id, &detail.data)
                    .await
                    .map_err(|e| ModerationError::from(e).nested(&prefix))?;
                details::link_promoted_detail(&mut tx, &detail.id, &promoted.id).await?;
                details_created += 1;
            }
        }

        catalog_writes::ensure_detail_coverage::<T>(&mut tx, &component_id).await?;
        moderated::mark_approved(&mut tx, ModeratedTable::Suggestions, id, &component_id).await?;
        tx.commit().await?;

        info!(
            "{} accepted {} suggestion {} into {} ({}; {} details created, {} updated, {} attachments moved)",
            actor.id,
            T::KIND,
            id,
            component_id,
            if created { "created" } else { "updated" },
            details_created,
            details_updated,
            attachments_moved
        );

        Ok(Promotion {
            suggestion_id: id.to_string(),
            component_id,
            created,
            details_created,
            details_updated,
            attachments_moved,
        })
    }

    /// Deny a whole-component suggestion. Nothing outside the suggestion row changes.
    /// Denying an already approved suggestion fails with `StateConflict`.
    pub async fn deny<T: ComponentSpec>(
        &self,
        actor: &Actor,
        id: &str,
        admin_comment: Option<&str>,
    ) -> ModerationResult<ModerationMeta> {
        self.deny_row(actor, ModeratedTable::Suggestions, T::KIND.as_str(), id, admin_comment)
            .await
    }

    /// Promote a proposed detail onto its existing component.
    pub async fn accept_detail<T: ComponentSpec>(
        &self,
        actor: &Actor,
        id: &str,
    ) -> ModerationResult<CatalogDetail<T::Detail>> {
        self.authorize(actor, "accept", id)?;

        let mut tx = self.pool.begin().await?;
        let row = moderated::claim(
            &mut tx,
            ModeratedTable::DetailSuggestions,
            T::KIND.as_str(),
            id,
        )
        .await?;
        let meta = moderated::row_to_meta(&row)?;
        let component_id: String = row.try_get("component_id")?;
        let data: String = row.try_get("data")?;
        let data: T::Detail = serde_json::from_str(&data)?;

        let existing = match &meta.related_instance_id {
            Some(detail_id) => {
                catalog_writes::update_detail::<T>(&mut tx, &component_id, detail_id, &data).await?
            }
            None => None,
        };
        let detail = match existing {
            Some(detail) => detail,
            None => catalog_writes::insert_detail::<T>(&mut tx, &component_id, &data).await?,
        };

        moderated::mark_approved(&mut tx, ModeratedTable::DetailSuggestions, id, &detail.id)
            .await?;
        tx.commit().await?;

        info!(
            "{} accepted {} detail suggestion {} as {}",
            actor.id,
            T::KIND,
            id,
            detail.id
        );
        Ok(detail)
    }

    pub async fn deny_detail<T: ComponentSpec>(
        &self,
        actor: &Actor,
        id: &str,
        admin_comment: Option<&str>,
    ) -> ModerationResult<ModerationMeta> {
        self.deny_row(
            actor,
            ModeratedTable::DetailSuggestions,
            T::KIND.as_str(),
            id,
            admin_comment,
        )
        .await
    }

    /// Create or update the lookup a lookup suggestion proposes.
    pub async fn accept_lookup(
        &self,
        actor: &Actor,
        kind: LookupKind,
        id: &str,
    ) -> ModerationResult<Lookup> {
        self.authorize(actor, "accept", id)?;

        let mut tx = self.pool.begin().await?;
        let row = moderated::claim(&mut tx, ModeratedTable::LookupSuggestions, kind.as_str(), id)
            .await?;
        let meta = moderated::row_to_meta(&row)?;
        let data: String = row.try_get("data")?;
        let data: LookupData = serde_json::from_str(&data)?;

        let lookup = match &meta.related_instance_id {
            Some(lookup_id) => catalog_writes::update_lookup(&mut tx, lookup_id, &data).await?,
            None => catalog_writes::insert_lookup(&mut tx, &data).await?,
        };

        moderated::mark_approved(&mut tx, ModeratedTable::LookupSuggestions, id, &lookup.id)
            .await?;
        tx.commit().await?;

        info!(
            "{} accepted {} lookup suggestion {} as {}",
            actor.id, kind, id, lookup.id
        );
        Ok(lookup)
    }

    pub async fn deny_lookup(
        &self,
        actor: &Actor,
        kind: LookupKind,
        id: &str,
        admin_comment: Option<&str>,
    ) -> ModerationResult<ModerationMeta> {
        self.deny_row(
            actor,
            ModeratedTable::LookupSuggestions,
            kind.as_str(),
            id,
            admin_comment,
        )
        .await
    }

    async fn deny_row(
        &self,
        actor: &Actor,
        table: ModeratedTable,
        kind: &str,
        id: &str,
        admin_comment: Option<&str>,
    ) -> ModerationResult<ModerationMeta> {
        self.authorize(actor, "deny", id)?;

        let mut tx = self.pool.begin().await?;
        let row = moderated::claim(&mut tx, table, kind, id).await?;
        moderated::row_to_meta(&row)?.status.ensure_deniable()?;

        moderated::mark_denied(&mut tx, table, id, admin_comment).await?;
        let row = moderated::fetch_row(&mut tx, table, kind, id)
            .await?
            .ok_or_else(|| table.not_found(id))?;
        let meta = moderated::row_to_meta(&row)?;
        tx.commit().await?;

        info!("{} denied {} {}", actor.id, table.label().to_lowercase(), id);
        Ok(meta)
    }
}
