// ABOUTME: Table-level helpers shared by entity, detail, and lookup suggestions
// ABOUTME: Row claiming, visibility scoping, and the status writes for edit, accept, and deny

use chrono::Utc;
use quadbase_core::Actor;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};
use tracing::debug;

use crate::error::{ModerationError, ModerationResult};
use crate::status::ModerationStatus;
use crate::types::{ModerationMeta, SuggestionQuery};

/// The three tables holding moderated proposals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeratedTable {
    Suggestions,
    DetailSuggestions,
    LookupSuggestions,
}

impl ModeratedTable {
    pub fn table(&self) -> &'static str {
        match self {
            ModeratedTable::Suggestions => "suggestions",
            ModeratedTable::DetailSuggestions => "detail_suggestions",
            ModeratedTable::LookupSuggestions => "lookup_suggestions",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ModeratedTable::Suggestions => "Suggestion",
            ModeratedTable::DetailSuggestions => "Detail suggestion",
            ModeratedTable::LookupSuggestions => "Lookup suggestion",
        }
    }

    pub(crate) fn not_found(&self, id: &str) -> ModerationError {
        ModerationError::NotFound(format!("{} {}", self.label(), id))
    }
}

pub(crate) fn row_to_meta(row: &SqliteRow) -> ModerationResult<ModerationMeta> {
    let status: String = row.try_get("status")?;
    Ok(ModerationMeta {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        status: status
            .parse()
            .map_err(|e: String| quadbase_storage::StorageError::Database(e))?,
        admin_comment: row.try_get("admin_comment")?,
        request_description: row.try_get("request_description")?,
        related_instance_id: row.try_get("related_instance_id")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
        reviewed_at: row.try_get("reviewed_at")?,
    })
}

pub async fn fetch_row(
    conn: &mut SqliteConnection,
    table: ModeratedTable,
    kind: &str,
    id: &str,
) -> ModerationResult<Option<SqliteRow>> {
    let sql = format!("SELECT * FROM {} WHERE id = ? AND kind = ?", table.table());
    let row = sqlx::query(&sql)
        .bind(id)
        .bind(kind)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(row)
}

/// Fetch a row the actor may see. Rows owned by someone else look missing.
pub async fn fetch_visible(
    conn: &mut SqliteConnection,
    table: ModeratedTable,
    kind: &str,
    id: &str,
    actor: &Actor,
) -> ModerationResult<SqliteRow> {
    let row = fetch_row(conn, table, kind, id)
        .await?
        .ok_or_else(|| table.not_found(id))?;

    let owner: String = row.try_get("user_id")?;
    if !actor.can_access(&owner) {
        return Err(table.not_found(id));
    }
    Ok(row)
}

/// Take the write lock on a suggestion row before reading it.
///
/// The no-op UPDATE is the transaction's first write, so a second transaction
/// claiming the same row waits until this one commits or rolls back.
pub async fn claim(
    conn: &mut SqliteConnection,
    table: ModeratedTable,
    kind: &str,
    id: &str,
) -> ModerationResult<SqliteRow> {
    let sql = format!(
        "UPDATE {} SET updated_at = updated_at WHERE id = ? AND kind = ?",
        table.table()
    );
    let result = sqlx::query(&sql)
        .bind(id)
        .bind(kind)
        .execute(&mut *conn)
        .await?;

    if result.rows_affected() == 0 {
        return Err(table.not_found(id));
    }

    fetch_row(conn, table, kind, id)
        .await?
        .ok_or_else(|| table.not_found(id))
}

/// Claim a row for an edit by its submitter (or a moderator).
///
/// Returns the row and the status the edit leaves it in.
pub async fn claim_for_edit(
    conn: &mut SqliteConnection,
    table: ModeratedTable,
    kind: &str,
    id: &str,
    actor: &Actor,
) -> ModerationResult<(SqliteRow, ModerationStatus)> {
    let row = claim(conn, table, kind, id).await?;
    let meta = row_to_meta(&row)?;
    if !actor.can_access(&meta.user_id) {
        return Err(table.not_found(id));
    }
    let next = meta.status.after_edit()?;
    Ok((row, next))
}

/// Record an edit: bump `updated_at` and apply the post-edit status.
pub async fn mark_edited(
    conn: &mut SqliteConnection,
    table: ModeratedTable,
    id: &str,
    status: ModerationStatus,
) -> ModerationResult<()> {
    let sql = format!(
        "UPDATE {} SET status = ?, updated_at = ? WHERE id = ?",
        table.table()
    );
    sqlx::query(&sql)
        .bind(status.as_str())
        .bind(Utc::now())
        .bind(id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

pub async fn mark_approved(
    conn: &mut SqliteConnection,
    table: ModeratedTable,
    id: &str,
    related_instance_id: &str,
) -> ModerationResult<()> {
    let now = Utc::now();
    let sql = format!(
        r#"
        UPDATE {}
        SET status = 'approved', related_instance_id = ?, reviewed_at = ?, updated_at = ?
        WHERE id = ?
        "#,
        table.table()
    );
    sqlx::query(&sql)
        .bind(related_instance_id)
        .bind(now)
        .bind(now)
        .bind(id)
        .execute(&mut *conn)
        .await?;
    debug!("{} {} approved", table.label(), id);
    Ok(())
}

/// Mark denied. A missing or blank comment keeps whatever comment was there.
pub async fn mark_denied(
    conn: &mut SqliteConnection,
    table: ModeratedTable,
    id: &str,
    admin_comment: Option<&str>,
) -> ModerationResult<()> {
    let admin_comment = admin_comment.map(str::trim).filter(|c| !c.is_empty());
    let now = Utc::now();
    let sql = format!(
        r#"
        UPDATE {}
        SET status = 'denied', admin_comment = COALESCE(?, admin_comment), reviewed_at = ?, updated_at = ?
        WHERE id = ?
        "#,
        table.table()
    );
    sqlx::query(&sql)
        .bind(admin_comment)
        .bind(now)
        .bind(now)
        .bind(id)
        .execute(&mut *conn)
        .await?;
    debug!("{} {} denied", table.label(), id);
    Ok(())
}

/// Rows of one kind the actor may see, newest first, with the total count.
pub async fn list_visible(
    conn: &mut SqliteConnection,
    table: ModeratedTable,
    kind: &str,
    actor: &Actor,
    query: &SuggestionQuery,
) -> ModerationResult<(Vec<SqliteRow>, i64)> {
    let mut clauses = vec!["kind = ?"];
    let mut binds: Vec<String> = vec![kind.to_string()];

    if !actor.is_moderator {
        clauses.push("user_id = ?");
        binds.push(actor.id.clone());
    }
    if let Some(status) = query.status {
        clauses.push("status = ?");
        binds.push(status.as_str().to_string());
    }
    let where_clause = clauses.join(" AND ");

    let count_sql = format!(
        "SELECT COUNT(*) FROM {} WHERE {}",
        table.table(),
        where_clause
    );
    let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
    for value in &binds {
        count_query = count_query.bind(value);
    }
    let total = count_query.fetch_one(&mut *conn).await?;

    let mut sql = format!(
        "SELECT * FROM {} WHERE {} ORDER BY created_at DESC, id",
        table.table(),
        where_clause
    );
    if let Some(limit) = query.limit {
        sql.push_str(&format!(" LIMIT {}", limit));
        if let Some(offset) = query.offset {
            sql.push_str(&format!(" OFFSET {}", offset));
        }
    }

    let mut select = sqlx::query(&sql);
    for value in &binds {
        select = select.bind(value);
    }
    let rows = select.fetch_all(&mut *conn).await?;
    Ok((rows, total))
}

pub async fn delete_row(
    conn: &mut SqliteConnection,
    table: ModeratedTable,
    id: &str,
) -> ModerationResult<()> {
    let sql = format!("DELETE FROM {} WHERE id = ?", table.table());
    sqlx::query(&sql).bind(id).execute(&mut *conn).await?;
    debug!("Deleted {} {}", table.label(), id);
    Ok(())
}

/// Delete a row the actor may see.
pub async fn delete_visible(
    conn: &mut SqliteConnection,
    table: ModeratedTable,
    kind: &str,
    id: &str,
    actor: &Actor,
) -> ModerationResult<()> {
    fetch_visible(conn, table, kind, id, actor).await?;
    delete_row(conn, table, id).await
}
