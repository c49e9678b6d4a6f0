// ABOUTME: SQLite storage for favorites lists and their items
// ABOUTME: Every operation is scoped to the acting user's own lists

use chrono::Utc;
use quadbase_core::utils::generate_id;
use quadbase_core::{Actor, ComponentKind, ValidationErrors};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection, SqlitePool};
use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::error::{ListError, ListResult};
use crate::types::{FavoriteList, ListInput, ListItem};

const DUPLICATE_NAME: &str = "You already have a list with this name.";
const DUPLICATE_ITEM: &str = "This item is already in the list.";

fn row_to_list(row: &SqliteRow) -> ListResult<FavoriteList> {
    let description: Option<String> = row.try_get("description")?;
    Ok(FavoriteList {
        id: row.try_get("id")?,
        owner_id: row.try_get("owner_id")?,
        name: row.try_get("name")?,
        description: description.unwrap_or_default(),
        item_count: row.try_get("item_count")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn row_to_item(row: &SqliteRow) -> ListResult<ListItem> {
    let kind: String = row.try_get("component_kind")?;
    Ok(ListItem {
        id: row.try_get("id")?,
        list_id: row.try_get("list_id")?,
        component_kind: kind
            .parse()
            .map_err(|e: quadbase_core::UnknownKind| {
                quadbase_storage::StorageError::Database(e.to_string())
            })?,
        component_id: row.try_get("component_id")?,
        manufacturer: row.try_get("manufacturer")?,
        model: row.try_get("model")?,
        added_at: row.try_get("added_at")?,
    })
}

fn validate_input(input: &ListInput) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    errors.require_text("name", &input.name, 100);
    errors.check_max_chars("description", &input.description, 5000);
    errors.into_result()
}

fn map_name_conflict(e: sqlx::Error) -> ListError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            ListError::Validation(ValidationErrors::single("name", DUPLICATE_NAME))
        }
        _ => e.into(),
    }
}

const LIST_COLUMNS: &str = r#"
    SELECT l.*, (SELECT COUNT(*) FROM list_items i WHERE i.list_id = l.id) AS item_count
    FROM lists l
"#;

/// Fetch a list owned by `actor`; anything else looks missing.
async fn owned_list(
    conn: &mut SqliteConnection,
    actor: &Actor,
    id: &str,
) -> ListResult<FavoriteList> {
    let sql = format!("{} WHERE l.id = ? AND l.owner_id = ?", LIST_COLUMNS);
    let row = sqlx::query(&sql)
        .bind(id)
        .bind(&actor.id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| ListError::NotFound(format!("List {}", id)))?;
    row_to_list(&row)
}

pub struct ListStorage {
    pool: SqlitePool,
}

impl ListStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create_list(&self, actor: &Actor, input: &ListInput) -> ListResult<FavoriteList> {
        validate_input(input)?;
        let id = generate_id("lst");
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO lists (id, owner_id, name, description, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&actor.id)
        .bind(input.name.trim())
        .bind(&input.description)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(map_name_conflict)?;

        info!("Created list {} for {}", id, actor.id);
        self.get_list(actor, &id).await
    }

    /// Change a list's name and description.
    pub async fn rename_list(
        &self,
        actor: &Actor,
        id: &str,
        input: &ListInput,
    ) -> ListResult<FavoriteList> {
        validate_input(input)?;
        let result = sqlx::query(
            "UPDATE lists SET name = ?, description = ?, updated_at = ? WHERE id = ? AND owner_id = ?",
        )
        .bind(input.name.trim())
        .bind(&input.description)
        .bind(Utc::now())
        .bind(id)
        .bind(&actor.id)
        .execute(&self.pool)
        .await
        .map_err(map_name_conflict)?;

        if result.rows_affected() == 0 {
            return Err(ListError::NotFound(format!("List {}", id)));
        }
        self.get_list(actor, id).await
    }

    pub async fn get_list(&self, actor: &Actor, id: &str) -> ListResult<FavoriteList> {
        let mut conn = self.pool.acquire().await?;
        owned_list(&mut conn, actor, id).await
    }

    /// The actor's lists ordered by name.
    pub async fn list_lists(&self, actor: &Actor) -> ListResult<Vec<FavoriteList>> {
        let sql = format!("{} WHERE l.owner_id = ? ORDER BY l.name", LIST_COLUMNS);
        let rows = sqlx::query(&sql)
            .bind(&actor.id)
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(row_to_list).collect()
    }

    pub async fn delete_list(&self, actor: &Actor, id: &str) -> ListResult<()> {
        let result = sqlx::query("DELETE FROM lists WHERE id = ? AND owner_id = ?")
            .bind(id)
            .bind(&actor.id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(ListError::NotFound(format!("List {}", id)));
        }
        info!("Deleted list {}", id);
        Ok(())
    }

    /// Add a component the actor can see. The kind must match the component.
    pub async fn add_item(
        &self,
        actor: &Actor,
        list_id: &str,
        kind: ComponentKind,
        component_id: &str,
    ) -> ListResult<ListItem> {
        let mut tx = self.pool.begin().await?;
        owned_list(&mut tx, actor, list_id).await?;

        let owner: Option<Option<String>> =
            sqlx::query_scalar("SELECT owner_id FROM components WHERE id = ? AND kind = ?")
                .bind(component_id)
                .bind(kind.as_str())
                .fetch_optional(&mut *tx)
                .await?;
        let visible = owner.is_some_and(|owner| owner.map_or(true, |o| actor.can_access(&o)));
        if !visible {
            return Err(ValidationErrors::single(
                "component_id",
                format!("Invalid pk \"{}\" - object does not exist.", component_id),
            )
            .into());
        }

        let id = generate_id("itm");
        sqlx::query(
            r#"
            INSERT INTO list_items (id, list_id, component_kind, component_id, added_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(list_id)
        .bind(kind.as_str())
        .bind(component_id)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                ListError::Validation(ValidationErrors::single("component_id", DUPLICATE_ITEM))
            }
            _ => e.into(),
        })?;

        tx.commit().await?;
        debug!("Added {} {} to list {}", kind, component_id, list_id);

        self.list_items(actor, list_id, None)
            .await?
            .into_iter()
            .find(|item| item.id == id)
            .ok_or_else(|| ListError::NotFound(format!("List item {}", id)))
    }

    pub async fn remove_item(&self, actor: &Actor, list_id: &str, item_id: &str) -> ListResult<()> {
        let mut tx = self.pool.begin().await?;
        owned_list(&mut tx, actor, list_id).await?;

        let result = sqlx::query("DELETE FROM list_items WHERE id = ? AND list_id = ?")
            .bind(item_id)
            .bind(list_id)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(ListError::NotFound(format!("List item {}", item_id)));
        }
        tx.commit().await?;
        Ok(())
    }

    /// Items of a list, most recently added first, optionally of one family.
    pub async fn list_items(
        &self,
        actor: &Actor,
        list_id: &str,
        kind: Option<ComponentKind>,
    ) -> ListResult<Vec<ListItem>> {
        let mut conn = self.pool.acquire().await?;
        owned_list(&mut conn, actor, list_id).await?;

        let mut sql = String::from(
            r#"
            SELECT i.*, c.manufacturer, c.model
            FROM list_items i
            JOIN components c ON c.id = i.component_id
            WHERE i.list_id = ?
            "#,
        );
        if kind.is_some() {
            sql.push_str(" AND i.component_kind = ?");
        }
        sql.push_str(" ORDER BY i.added_at DESC, i.rowid DESC");

        let mut query = sqlx::query(&sql).bind(list_id);
        if let Some(kind) = kind {
            query = query.bind(kind.as_str());
        }
        let rows = query.fetch_all(&mut *conn).await?;
        rows.iter().map(row_to_item).collect()
    }

    /// Item counts per family. Families with no items are reported as zero.
    pub async fn count_by_kind(
        &self,
        actor: &Actor,
        list_id: &str,
    ) -> ListResult<BTreeMap<ComponentKind, i64>> {
        let mut conn = self.pool.acquire().await?;
        owned_list(&mut conn, actor, list_id).await?;

        let rows: Vec<(String, i64)> = sqlx::query_as(
            "SELECT component_kind, COUNT(*) FROM list_items WHERE list_id = ? GROUP BY component_kind",
        )
        .bind(list_id)
        .fetch_all(&mut *conn)
        .await?;

        let mut counts: BTreeMap<ComponentKind, i64> =
            ComponentKind::ALL.iter().map(|kind| (*kind, 0)).collect();
        for (kind, count) in rows {
            if let Ok(kind) = kind.parse::<ComponentKind>() {
                counts.insert(kind, count);
            }
        }
        Ok(counts)
    }
}
