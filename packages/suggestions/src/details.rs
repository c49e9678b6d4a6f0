// ABOUTME: Suggested detail rows nested under whole-component suggestions
// ABOUTME: Mirrors canonical details, including the last-detail-of-a-kind protection

use chrono::Utc;
use quadbase_catalog::DetailSpec;
use quadbase_core::constants::LAST_DETAIL_MESSAGE;
use quadbase_core::utils::generate_id;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};
use tracing::debug;

use crate::error::{ModerationError, ModerationResult};
use crate::types::SuggestedDetail;

fn row_to_suggested_detail<D: DetailSpec>(row: &SqliteRow) -> ModerationResult<SuggestedDetail<D>> {
    let data: String = row.try_get("data")?;
    Ok(SuggestedDetail {
        id: row.try_get("id")?,
        suggestion_id: row.try_get("suggestion_id")?,
        detail_kind: row.try_get("detail_kind")?,
        data: serde_json::from_str(&data)?,
        related_instance_id: row.try_get("related_instance_id")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

pub(crate) fn detail_not_found(id: &str) -> ModerationError {
    ModerationError::NotFound(format!("Suggested detail {}", id))
}

pub async fn fetch_suggested_details<D: DetailSpec>(
    conn: &mut SqliteConnection,
    suggestion_id: &str,
) -> ModerationResult<Vec<SuggestedDetail<D>>> {
    let rows = sqlx::query(
        "SELECT * FROM suggested_details WHERE suggestion_id = ? ORDER BY rowid",
    )
    .bind(suggestion_id)
    .fetch_all(&mut *conn)
    .await?;

    rows.iter().map(row_to_suggested_detail).collect()
}

pub async fn detail_ids(
    conn: &mut SqliteConnection,
    suggestion_id: &str,
) -> ModerationResult<Vec<String>> {
    let ids = sqlx::query_scalar("SELECT id FROM suggested_details WHERE suggestion_id = ?")
        .bind(suggestion_id)
        .fetch_all(&mut *conn)
        .await?;
    Ok(ids)
}

pub async fn insert_suggested_detail<D: DetailSpec>(
    conn: &mut SqliteConnection,
    suggestion_id: &str,
    data: &D,
) -> ModerationResult<String> {
    let id = generate_id("sdt");
    let now = Utc::now();

    sqlx::query(
        r#"
        INSERT INTO suggested_details (id, suggestion_id, detail_kind, data, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(suggestion_id)
    .bind(data.detail_kind())
    .bind(serde_json::to_string(data)?)
    .bind(now)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    debug!("Added suggested {} detail {}", data.detail_kind(), id);
    Ok(id)
}

pub async fn update_suggested_detail<D: DetailSpec>(
    conn: &mut SqliteConnection,
    id: &str,
    data: &D,
) -> ModerationResult<()> {
    sqlx::query(
        "UPDATE suggested_details SET detail_kind = ?, data = ?, updated_at = ? WHERE id = ?",
    )
    .bind(data.detail_kind())
    .bind(serde_json::to_string(data)?)
    .bind(Utc::now())
    .bind(id)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

/// Record which canonical detail a suggested detail was promoted to.
pub async fn link_promoted_detail(
    conn: &mut SqliteConnection,
    id: &str,
    canonical_detail_id: &str,
) -> ModerationResult<()> {
    sqlx::query("UPDATE suggested_details SET related_instance_id = ? WHERE id = ?")
        .bind(canonical_detail_id)
        .bind(id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

/// Remove a suggested detail row without the last-detail check.
pub(crate) async fn remove_suggested_detail(
    conn: &mut SqliteConnection,
    id: &str,
) -> ModerationResult<()> {
    sqlx::query("DELETE FROM suggested_details WHERE id = ?")
        .bind(id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

/// Delete one suggested detail unless it is the last of its kind in the suggestion.
pub async fn delete_suggested_detail(
    conn: &mut SqliteConnection,
    suggestion_id: &str,
    detail_id: &str,
) -> ModerationResult<()> {
    let detail_kind: Option<String> = sqlx::query_scalar(
        "SELECT detail_kind FROM suggested_details WHERE id = ? AND suggestion_id = ?",
    )
    .bind(detail_id)
    .bind(suggestion_id)
    .fetch_optional(&mut *conn)
    .await?;

    let Some(detail_kind) = detail_kind else {
        return Err(detail_not_found(detail_id));
    };

    let siblings: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM suggested_details WHERE suggestion_id = ? AND detail_kind = ?",
    )
    .bind(suggestion_id)
    .bind(&detail_kind)
    .fetch_one(&mut *conn)
    .await?;

    if siblings <= 1 {
        return Err(ModerationError::StateConflict(LAST_DETAIL_MESSAGE.to_string()));
    }

    remove_suggested_detail(conn, detail_id).await?;
    debug!("Deleted suggested detail {} from {}", detail_id, suggestion_id);
    Ok(())
}

/// Detail kinds in `required` with no suggested detail under the suggestion.
pub async fn missing_detail_kinds(
    conn: &mut SqliteConnection,
    suggestion_id: &str,
    required: &[&'static str],
) -> ModerationResult<Vec<&'static str>> {
    let present: Vec<String> =
        sqlx::query_scalar("SELECT DISTINCT detail_kind FROM suggested_details WHERE suggestion_id = ?")
            .bind(suggestion_id)
            .fetch_all(&mut *conn)
            .await?;

    Ok(required
        .iter()
        .copied()
        .filter(|kind| !present.iter().any(|p| p == kind))
        .collect())
}
