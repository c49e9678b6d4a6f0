// ABOUTME: Connection-level attachment queries used inside suggestion and promotion transactions
// ABOUTME: Ownership moves from a suggestion to a canonical component in one UPDATE

use chrono::Utc;
use quadbase_core::utils::generate_id;
use quadbase_core::ComponentKind;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};
use tracing::debug;

use crate::error::{AttachmentError, AttachmentResult};
use crate::types::{Attachment, AttachmentKind, AttachmentOwner, StoredUpload};

pub(crate) fn row_to_attachment(row: &SqliteRow) -> AttachmentResult<Attachment> {
    let kind: String = row.try_get("attachment_kind")?;
    let component_kind: String = row.try_get("component_kind")?;
    let component_kind: ComponentKind = component_kind
        .parse()
        .map_err(|e: quadbase_core::UnknownKind| AttachmentError::Blob(e.to_string()))?;
    let component_id: Option<String> = row.try_get("component_id")?;
    let suggestion_id: Option<String> = row.try_get("suggestion_id")?;

    let owner = match (component_id, suggestion_id) {
        (Some(id), None) => AttachmentOwner::Canonical {
            kind: component_kind,
            id,
        },
        (None, Some(id)) => AttachmentOwner::Suggestion { id },
        _ => {
            return Err(AttachmentError::Blob(
                "attachment row must have exactly one owner".to_string(),
            ))
        }
    };

    Ok(Attachment {
        id: row.try_get("id")?,
        kind: kind.parse().map_err(AttachmentError::Blob)?,
        component_kind,
        owner,
        origin_suggestion_id: row.try_get("origin_suggestion_id")?,
        file_name: row.try_get("file_name")?,
        content_type: row.try_get("content_type")?,
        size_bytes: row.try_get("size_bytes")?,
        storage_key: row.try_get("storage_key")?,
        position: row.try_get("position")?,
        created_at: row.try_get("created_at")?,
    })
}

fn owner_columns(owner: &AttachmentOwner) -> (Option<&str>, Option<&str>) {
    match owner {
        AttachmentOwner::Canonical { id, .. } => (Some(id.as_str()), None),
        AttachmentOwner::Suggestion { id } => (None, Some(id.as_str())),
    }
}

pub async fn insert_attachment(
    conn: &mut SqliteConnection,
    component_kind: ComponentKind,
    owner: &AttachmentOwner,
    upload: &StoredUpload,
) -> AttachmentResult<Attachment> {
    let id = generate_id("att");
    let (component_id, suggestion_id) = owner_columns(owner);

    debug!("Storing {} {} for {:?}", upload.kind, id, owner);

    sqlx::query(
        r#"
        INSERT INTO attachments (
            id, attachment_kind, component_kind, component_id, suggestion_id,
            file_name, content_type, size_bytes, storage_key, position, created_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(upload.kind.as_str())
    .bind(component_kind.as_str())
    .bind(component_id)
    .bind(suggestion_id)
    .bind(&upload.file_name)
    .bind(&upload.content_type)
    .bind(upload.size_bytes)
    .bind(&upload.storage_key)
    .bind(upload.position)
    .bind(Utc::now())
    .execute(&mut *conn)
    .await?;

    fetch_attachment(conn, &id)
        .await?
        .ok_or_else(|| AttachmentError::NotFound(format!("Attachment {}", id)))
}

pub async fn fetch_attachment(
    conn: &mut SqliteConnection,
    id: &str,
) -> AttachmentResult<Option<Attachment>> {
    let row = sqlx::query("SELECT * FROM attachments WHERE id = ?")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    row.as_ref().map(row_to_attachment).transpose()
}

pub async fn list_for_owner(
    conn: &mut SqliteConnection,
    owner: &AttachmentOwner,
    kind: Option<AttachmentKind>,
) -> AttachmentResult<Vec<Attachment>> {
    let (column, id) = match owner {
        AttachmentOwner::Canonical { id, .. } => ("component_id", id),
        AttachmentOwner::Suggestion { id } => ("suggestion_id", id),
    };

    let sql = match kind {
        Some(_) => format!(
            "SELECT * FROM attachments WHERE {} = ? AND attachment_kind = ? ORDER BY position, created_at",
            column
        ),
        None => format!(
            "SELECT * FROM attachments WHERE {} = ? ORDER BY attachment_kind, position, created_at",
            column
        ),
    };

    let mut query = sqlx::query(&sql).bind(id);
    if let Some(kind) = kind {
        query = query.bind(kind.as_str());
    }
    let rows = query.fetch_all(&mut *conn).await?;
    rows.iter().map(row_to_attachment).collect()
}

/// Move every attachment still owned by `suggestion_id` onto the canonical component.
///
/// Attachments the component already owns are left untouched. Returns the number moved.
pub async fn reattach_orphans(
    conn: &mut SqliteConnection,
    suggestion_id: &str,
    component_id: &str,
) -> AttachmentResult<u64> {
    let result = sqlx::query(
        r#"
        UPDATE attachments
        SET component_id = ?, suggestion_id = NULL, origin_suggestion_id = ?
        WHERE suggestion_id = ?
        "#,
    )
    .bind(component_id)
    .bind(suggestion_id)
    .bind(suggestion_id)
    .execute(&mut *conn)
    .await?;

    debug!(
        "Reattached {} attachments from suggestion {} to {}",
        result.rows_affected(),
        suggestion_id,
        component_id
    );
    Ok(result.rows_affected())
}

pub async fn update_position(
    conn: &mut SqliteConnection,
    id: &str,
    position: i64,
) -> AttachmentResult<()> {
    sqlx::query("UPDATE attachments SET position = ? WHERE id = ?")
        .bind(position)
        .bind(id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

/// Delete one attachment row, returning its blob key.
pub async fn delete_attachment(
    conn: &mut SqliteConnection,
    id: &str,
) -> AttachmentResult<Option<String>> {
    let key: Option<String> =
        sqlx::query_scalar("DELETE FROM attachments WHERE id = ? RETURNING storage_key")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;
    Ok(key)
}

/// Delete attachments still owned by a suggestion, returning their blob keys.
pub async fn delete_for_suggestion(
    conn: &mut SqliteConnection,
    suggestion_id: &str,
) -> AttachmentResult<Vec<String>> {
    let keys: Vec<String> = sqlx::query_scalar(
        "DELETE FROM attachments WHERE suggestion_id = ? RETURNING storage_key",
    )
    .bind(suggestion_id)
    .fetch_all(&mut *conn)
    .await?;
    Ok(keys)
}
