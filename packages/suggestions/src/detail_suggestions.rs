// ABOUTME: Proposals of a new detail for a component that is already in the catalog
// ABOUTME: Same status lifecycle as whole-component suggestions, scoped to one detail

use chrono::Utc;
use quadbase_catalog::writes as catalog_writes;
use quadbase_catalog::{ComponentSpec, DetailSpec};
use quadbase_core::utils::generate_id;
use quadbase_core::{Actor, ValidationErrors};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection, SqlitePool};
use tracing::info;

use crate::error::ModerationResult;
use crate::moderated::{self, ModeratedTable};
use crate::storage::{absorb, invalid_pk};
use crate::types::{DetailSuggestion, DetailSuggestionInput, SuggestionQuery};

const TABLE: ModeratedTable = ModeratedTable::DetailSuggestions;

pub(crate) fn row_to_detail_suggestion<T: ComponentSpec>(
    row: &SqliteRow,
) -> ModerationResult<DetailSuggestion<T::Detail>> {
    let data: String = row.try_get("data")?;
    Ok(DetailSuggestion {
        meta: moderated::row_to_meta(row)?,
        kind: T::KIND,
        component_id: row.try_get("component_id")?,
        detail_kind: row.try_get("detail_kind")?,
        data: serde_json::from_str(&data)?,
    })
}

async fn validate<T: ComponentSpec>(
    conn: &mut SqliteConnection,
    actor: &Actor,
    input: &DetailSuggestionInput<T::Detail>,
) -> ModerationResult<()> {
    let mut errors = ValidationErrors::new();

    let visible = catalog_writes::fetch_component::<T>(conn, &input.component_id)
        .await?
        .is_some_and(|item| item.owner_id.as_deref().map_or(true, |o| actor.can_access(o)));
    if !visible {
        errors.push("component_id", invalid_pk(&input.component_id));
    }

    absorb(
        &mut errors,
        catalog_writes::validate_detail(conn, &input.data).await,
        None,
    )?;
    errors.check_optional_chars(
        "request_description",
        input.request_description.as_deref(),
        5000,
    );
    errors.into_result()?;
    Ok(())
}

pub struct DetailSuggestionStorage {
    pool: SqlitePool,
}

impl DetailSuggestionStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create<T: ComponentSpec>(
        &self,
        actor: &Actor,
        input: &DetailSuggestionInput<T::Detail>,
    ) -> ModerationResult<DetailSuggestion<T::Detail>> {
        let mut tx = self.pool.begin().await?;
        validate::<T>(&mut tx, actor, input).await?;

        let id = generate_id("dsg");
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO detail_suggestions (
                id, kind, component_id, detail_kind, user_id, status,
                request_description, data, created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, 'pending', ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(T::KIND.as_str())
        .bind(&input.component_id)
        .bind(input.data.detail_kind())
        .bind(&actor.id)
        .bind(&input.request_description)
        .bind(serde_json::to_string(&input.data)?)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        info!(
            "Created {} detail suggestion {} for {} by {}",
            T::KIND,
            id,
            input.component_id,
            actor.id
        );
        self.get::<T>(actor, &id).await
    }

    pub async fn update<T: ComponentSpec>(
        &self,
        actor: &Actor,
        id: &str,
        input: &DetailSuggestionInput<T::Detail>,
    ) -> ModerationResult<DetailSuggestion<T::Detail>> {
        let mut tx = self.pool.begin().await?;
        let (_, next_status) =
            moderated::claim_for_edit(&mut tx, TABLE, T::KIND.as_str(), id, actor).await?;
        validate::<T>(&mut tx, actor, input).await?;

        sqlx::query(
            r#"
            UPDATE detail_suggestions
            SET component_id = ?, detail_kind = ?, request_description = ?, data = ?,
                status = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&input.component_id)
        .bind(input.data.detail_kind())
        .bind(&input.request_description)
        .bind(serde_json::to_string(&input.data)?)
        .bind(next_status.as_str())
        .bind(Utc::now())
        .bind(id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        self.get::<T>(actor, id).await
    }

    pub async fn get<T: ComponentSpec>(
        &self,
        actor: &Actor,
        id: &str,
    ) -> ModerationResult<DetailSuggestion<T::Detail>> {
        let mut conn = self.pool.acquire().await?;
        let row = moderated::fetch_visible(&mut conn, TABLE, T::KIND.as_str(), id, actor).await?;
        row_to_detail_suggestion::<T>(&row)
    }

    pub async fn list<T: ComponentSpec>(
        &self,
        actor: &Actor,
        query: &SuggestionQuery,
    ) -> ModerationResult<(Vec<DetailSuggestion<T::Detail>>, i64)> {
        let mut conn = self.pool.acquire().await?;
        let (rows, total) =
            moderated::list_visible(&mut conn, TABLE, T::KIND.as_str(), actor, query).await?;
        let items = rows
            .iter()
            .map(row_to_detail_suggestion::<T>)
            .collect::<ModerationResult<Vec<_>>>()?;
        Ok((items, total))
    }

    pub async fn delete<T: ComponentSpec>(&self, actor: &Actor, id: &str) -> ModerationResult<()> {
        let mut conn = self.pool.acquire().await?;
        moderated::delete_visible(&mut conn, TABLE, T::KIND.as_str(), id, actor).await
    }
}
