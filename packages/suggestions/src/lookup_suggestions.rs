// ABOUTME: Proposals of new or edited lookup table entries (connectors, video formats, ...)
// ABOUTME: Accepting one creates or updates the lookup named by related_instance_id

use chrono::Utc;
use quadbase_catalog::writes as catalog_writes;
use quadbase_core::utils::generate_id;
use quadbase_core::{Actor, LookupKind};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection, SqlitePool};
use tracing::info;

use crate::error::ModerationResult;
use crate::moderated::{self, ModeratedTable};
use crate::storage::invalid_pk;
use crate::types::{LookupSuggestion, LookupSuggestionInput, SuggestionQuery};

const TABLE: ModeratedTable = ModeratedTable::LookupSuggestions;

pub(crate) fn row_to_lookup_suggestion(row: &SqliteRow) -> ModerationResult<LookupSuggestion> {
    let data: String = row.try_get("data")?;
    let data: quadbase_catalog::LookupData = serde_json::from_str(&data)?;
    Ok(LookupSuggestion {
        meta: moderated::row_to_meta(row)?,
        lookup_kind: data.kind(),
        label: data.name(),
        data,
    })
}

async fn validate(
    conn: &mut SqliteConnection,
    kind: LookupKind,
    input: &LookupSuggestionInput,
) -> ModerationResult<()> {
    let mut errors = input.data.validate().err().unwrap_or_default();

    if input.data.kind() != kind {
        errors.push(
            "kind",
            format!("Expected {} lookup data.", kind.as_str()),
        );
    }

    if let Some(lookup_id) = &input.related_instance_id {
        let matches = catalog_writes::fetch_lookup(conn, lookup_id)
            .await?
            .is_some_and(|lookup| lookup.data.kind() == kind);
        if !matches {
            errors.push("related_instance_id", invalid_pk(lookup_id));
        }
    }

    errors.check_optional_chars(
        "request_description",
        input.request_description.as_deref(),
        5000,
    );
    errors.into_result()?;
    Ok(())
}

pub struct LookupSuggestionStorage {
    pool: SqlitePool,
}

impl LookupSuggestionStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        actor: &Actor,
        kind: LookupKind,
        input: &LookupSuggestionInput,
    ) -> ModerationResult<LookupSuggestion> {
        let mut tx = self.pool.begin().await?;
        validate(&mut tx, kind, input).await?;

        let id = generate_id("lsg");
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO lookup_suggestions (
                id, kind, user_id, status, request_description, related_instance_id,
                data, created_at, updated_at
            )
            VALUES (?, ?, ?, 'pending', ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(kind.as_str())
        .bind(&actor.id)
        .bind(&input.request_description)
        .bind(&input.related_instance_id)
        .bind(serde_json::to_string(&input.data)?)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        info!("Created {} lookup suggestion {} by {}", kind, id, actor.id);
        self.get(actor, kind, &id).await
    }

    pub async fn update(
        &self,
        actor: &Actor,
        kind: LookupKind,
        id: &str,
        input: &LookupSuggestionInput,
    ) -> ModerationResult<LookupSuggestion> {
        let mut tx = self.pool.begin().await?;
        let (_, next_status) =
            moderated::claim_for_edit(&mut tx, TABLE, kind.as_str(), id, actor).await?;
        validate(&mut tx, kind, input).await?;

        sqlx::query(
            r#"
            UPDATE lookup_suggestions
            SET request_description = ?, related_instance_id = ?, data = ?, status = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&input.request_description)
        .bind(&input.related_instance_id)
        .bind(serde_json::to_string(&input.data)?)
        .bind(next_status.as_str())
        .bind(Utc::now())
        .bind(id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        self.get(actor, kind, id).await
    }

    pub async fn get(
        &self,
        actor: &Actor,
        kind: LookupKind,
        id: &str,
    ) -> ModerationResult<LookupSuggestion> {
        let mut conn = self.pool.acquire().await?;
        let row = moderated::fetch_visible(&mut conn, TABLE, kind.as_str(), id, actor).await?;
        row_to_lookup_suggestion(&row)
    }

    pub async fn list(
        &self,
        actor: &Actor,
        kind: LookupKind,
        query: &SuggestionQuery,
    ) -> ModerationResult<(Vec<LookupSuggestion>, i64)> {
        let mut conn = self.pool.acquire().await?;
        let (rows, total) =
            moderated::list_visible(&mut conn, TABLE, kind.as_str(), actor, query).await?;
        let items = rows
            .iter()
            .map(row_to_lookup_suggestion)
            .collect::<ModerationResult<Vec<_>>>()?;
        Ok((items, total))
    }

    pub async fn delete(&self, actor: &Actor, kind: LookupKind, id: &str) -> ModerationResult<()> {
        let mut conn = self.pool.acquire().await?;
        moderated::delete_visible(&mut conn, TABLE, kind.as_str(), id, actor).await
    }
}
