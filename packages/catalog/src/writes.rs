// ABOUTME: Connection-level catalog reads and writes that can join a caller's transaction
// ABOUTME: Validation, reference checks, identity uniqueness, and the last-detail rule live here

use chrono::Utc;
use quadbase_core::constants::LAST_DETAIL_MESSAGE;
use quadbase_core::utils::generate_id;
use quadbase_core::{ComponentKind, LookupKind, ValidationErrors};
use quadbase_storage::StorageError;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};
use tracing::debug;

use crate::error::{CatalogError, CatalogResult};
use crate::lookups::LookupData;
use crate::traits::{ComponentSpec, DetailSpec, RefTarget, Reference};
use crate::types::{CatalogDetail, CatalogItem, Lookup};

pub(crate) fn row_to_item<T: ComponentSpec>(row: &SqliteRow) -> CatalogResult<CatalogItem<T>> {
    let data: String = row.try_get("data")?;
    Ok(CatalogItem {
        id: row.try_get("id")?,
        kind: T::KIND,
        owner_id: row.try_get("owner_id")?,
        data: serde_json::from_str(&data)?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn row_to_detail<D: DetailSpec>(row: &SqliteRow) -> CatalogResult<CatalogDetail<D>> {
    let data: String = row.try_get("data")?;
    Ok(CatalogDetail {
        id: row.try_get("id")?,
        component_id: row.try_get("component_id")?,
        detail_kind: row.try_get("detail_kind")?,
        data: serde_json::from_str(&data)?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

pub(crate) fn row_to_lookup(row: &SqliteRow) -> CatalogResult<Lookup> {
    let data: String = row.try_get("data")?;
    Ok(Lookup {
        id: row.try_get("id")?,
        label: row.try_get("name")?,
        data: serde_json::from_str(&data)?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

/// Re-key validation errors under `prefix`, leaving other errors untouched.
pub fn nest_validation(err: CatalogError, prefix: &str) -> CatalogError {
    match err {
        CatalogError::Validation(inner) => {
            let mut errors = ValidationErrors::new();
            errors.extend_nested(prefix, inner);
            CatalogError::Validation(errors)
        }
        other => other,
    }
}

/// Report every reference that does not resolve to a row of the expected kind.
pub async fn check_references(
    conn: &mut SqliteConnection,
    refs: &[Reference],
) -> CatalogResult<ValidationErrors> {
    let mut errors = ValidationErrors::new();
    for reference in refs {
        let (sql, kind) = match reference.target {
            RefTarget::Lookup(kind) => (
                "SELECT COUNT(*) FROM lookups WHERE id = ? AND kind = ?",
                kind.as_str(),
            ),
            RefTarget::Component(kind) => (
                "SELECT COUNT(*) FROM components WHERE id = ? AND kind = ?",
                kind.as_str(),
            ),
        };
        let count: i64 = sqlx::query_scalar(sql)
            .bind(&reference.id)
            .bind(kind)
            .fetch_one(&mut *conn)
            .await?;
        if count == 0 {
            errors.push(
                reference.field,
                format!("Invalid pk \"{}\" - object does not exist.", reference.id),
            );
        }
    }
    Ok(errors)
}

/// Field rules plus reference existence for a component payload.
pub async fn validate_component<T: ComponentSpec>(
    conn: &mut SqliteConnection,
    data: &T,
) -> CatalogResult<()> {
    let mut errors = data.validate().err().unwrap_or_default();
    errors.extend(check_references(conn, &data.references()).await?);
    errors.into_result()?;
    Ok(())
}

/// Field rules plus reference existence for a detail payload.
pub async fn validate_detail<D: DetailSpec>(
    conn: &mut SqliteConnection,
    data: &D,
) -> CatalogResult<()> {
    let mut errors = data.validate().err().unwrap_or_default();
    errors.extend(check_references(conn, &data.references()).await?);
    errors.into_result()?;
    Ok(())
}

fn duplicate_identity(kind: ComponentKind) -> CatalogError {
    CatalogError::Validation(ValidationErrors::single(
        "model",
        format!(
            "{} with this manufacturer and model already exists.",
            kind.display_name()
        ),
    ))
}

async fn ensure_identity_available<T: ComponentSpec>(
    conn: &mut SqliteConnection,
    data: &T,
    owner_id: Option<&str>,
    exclude_id: Option<&str>,
) -> CatalogResult<()> {
    let count: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(*) FROM components
        WHERE kind = ? AND manufacturer = ? AND model = ? AND owner_id IS ? AND id <> ?
        "#,
    )
    .bind(T::KIND.as_str())
    .bind(data.manufacturer())
    .bind(data.model())
    .bind(owner_id)
    .bind(exclude_id.unwrap_or(""))
    .fetch_one(&mut *conn)
    .await?;

    if count > 0 {
        return Err(duplicate_identity(T::KIND));
    }
    Ok(())
}

fn map_write_error(kind: ComponentKind, e: sqlx::Error) -> CatalogError {
    let err = StorageError::Sqlx(e);
    if err.is_unique_violation() {
        duplicate_identity(kind)
    } else {
        CatalogError::Storage(err)
    }
}

/// Replace every stored reference of a component with `refs`.
async fn replace_component_refs(
    conn: &mut SqliteConnection,
    component_id: &str,
    refs: &[Reference],
) -> CatalogResult<()> {
    sqlx::query("DELETE FROM component_lookup_refs WHERE component_id = ?")
        .bind(component_id)
        .execute(&mut *conn)
        .await?;
    sqlx::query("DELETE FROM component_refs WHERE component_id = ?")
        .bind(component_id)
        .execute(&mut *conn)
        .await?;

    for reference in refs {
        let sql = match reference.target {
            RefTarget::Lookup(_) => {
                "INSERT OR IGNORE INTO component_lookup_refs (component_id, field, lookup_id) VALUES (?, ?, ?)"
            }
            RefTarget::Component(_) => {
                "INSERT OR IGNORE INTO component_refs (component_id, field, target_id) VALUES (?, ?, ?)"
            }
        };
        sqlx::query(sql)
            .bind(component_id)
            .bind(reference.field)
            .bind(&reference.id)
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

async fn replace_detail_refs(
    conn: &mut SqliteConnection,
    detail_id: &str,
    refs: &[Reference],
) -> CatalogResult<()> {
    sqlx::query("DELETE FROM detail_lookup_refs WHERE detail_id = ?")
        .bind(detail_id)
        .execute(&mut *conn)
        .await?;

    for reference in refs {
        if let RefTarget::Lookup(_) = reference.target {
            sqlx::query(
                "INSERT OR IGNORE INTO detail_lookup_refs (detail_id, field, lookup_id) VALUES (?, ?, ?)",
            )
            .bind(detail_id)
            .bind(reference.field)
            .bind(&reference.id)
            .execute(&mut *conn)
            .await?;
        }
    }
    Ok(())
}

pub async fn fetch_component<T: ComponentSpec>(
    conn: &mut SqliteConnection,
    id: &str,
) -> CatalogResult<Option<CatalogItem<T>>> {
    let row = sqlx::query("SELECT * FROM components WHERE id = ? AND kind = ?")
        .bind(id)
        .bind(T::KIND.as_str())
        .fetch_optional(&mut *conn)
        .await?;

    row.as_ref().map(row_to_item::<T>).transpose()
}

pub async fn component_exists(
    conn: &mut SqliteConnection,
    kind: ComponentKind,
    id: &str,
) -> CatalogResult<bool> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM components WHERE id = ? AND kind = ?")
        .bind(id)
        .bind(kind.as_str())
        .fetch_one(&mut *conn)
        .await?;
    Ok(count > 0)
}

async fn require_component<T: ComponentSpec>(
    conn: &mut SqliteConnection,
    id: &str,
) -> CatalogResult<CatalogItem<T>> {
    fetch_component::<T>(conn, id)
        .await?
        .ok_or_else(|| CatalogError::NotFound(format!("{} {}", T::KIND.display_name(), id)))
}

/// Insert a component after validating fields, references, and identity.
pub async fn insert_component<T: ComponentSpec>(
    conn: &mut SqliteConnection,
    owner_id: Option<&str>,
    data: &T,
) -> CatalogResult<CatalogItem<T>> {
    validate_component(conn, data).await?;
    ensure_identity_available(conn, data, owner_id, None).await?;

    let id = generate_id("cmp");
    let now = Utc::now();

    debug!(
        "Creating {} {} ({} {})",
        T::KIND,
        id,
        data.manufacturer(),
        data.model()
    );

    sqlx::query(
        r#"
        INSERT INTO components (id, kind, manufacturer, model, description, owner_id, data, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(T::KIND.as_str())
    .bind(data.manufacturer())
    .bind(data.model())
    .bind(&data.header().description)
    .bind(owner_id)
    .bind(serde_json::to_string(data)?)
    .bind(now)
    .bind(now)
    .execute(&mut *conn)
    .await
    .map_err(|e| map_write_error(T::KIND, e))?;

    replace_component_refs(conn, &id, &data.references()).await?;
    require_component::<T>(conn, &id).await
}

/// Replace the scalar fields and every reference set of an existing component.
pub async fn update_component<T: ComponentSpec>(
    conn: &mut SqliteConnection,
    id: &str,
    data: &T,
) -> CatalogResult<CatalogItem<T>> {
    let existing = require_component::<T>(conn, id).await?;
    validate_component(conn, data).await?;
    ensure_identity_available(conn, data, existing.owner_id.as_deref(), Some(id)).await?;

    debug!("Updating {} {}", T::KIND, id);

    sqlx::query(
        r#"
        UPDATE components
        SET manufacturer = ?, model = ?, description = ?, data = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(data.manufacturer())
    .bind(data.model())
    .bind(&data.header().description)
    .bind(serde_json::to_string(data)?)
    .bind(Utc::now())
    .bind(id)
    .execute(&mut *conn)
    .await
    .map_err(|e| map_write_error(T::KIND, e))?;

    replace_component_refs(conn, id, &data.references()).await?;
    require_component::<T>(conn, id).await
}

pub async fn delete_component(
    conn: &mut SqliteConnection,
    kind: ComponentKind,
    id: &str,
) -> CatalogResult<()> {
    let result = sqlx::query("DELETE FROM components WHERE id = ? AND kind = ?")
        .bind(id)
        .bind(kind.as_str())
        .execute(&mut *conn)
        .await
        .map_err(StorageError::Sqlx)
        .map_err(|err| {
            if err.is_foreign_key_violation() {
                CatalogError::Protected(
                    "Cannot delete this component because other catalog items reference it."
                        .to_string(),
                )
            } else {
                CatalogError::Storage(err)
            }
        })?;

    if result.rows_affected() == 0 {
        return Err(CatalogError::NotFound(format!(
            "{} {}",
            kind.display_name(),
            id
        )));
    }
    Ok(())
}

async fn fetch_detail<D: DetailSpec>(
    conn: &mut SqliteConnection,
    component_id: &str,
    detail_id: &str,
) -> CatalogResult<Option<CatalogDetail<D>>> {
    let row = sqlx::query("SELECT * FROM component_details WHERE id = ? AND component_id = ?")
        .bind(detail_id)
        .bind(component_id)
        .fetch_optional(&mut *conn)
        .await?;

    row.as_ref().map(row_to_detail::<D>).transpose()
}

pub async fn fetch_details<T: ComponentSpec>(
    conn: &mut SqliteConnection,
    component_id: &str,
) -> CatalogResult<Vec<CatalogDetail<T::Detail>>> {
    let rows = sqlx::query(
        "SELECT * FROM component_details WHERE component_id = ? ORDER BY created_at, id",
    )
    .bind(component_id)
    .fetch_all(&mut *conn)
    .await?;

    rows.iter().map(row_to_detail::<T::Detail>).collect()
}

async fn count_details_of_kind(
    conn: &mut SqliteConnection,
    component_id: &str,
    detail_kind: &str,
) -> CatalogResult<i64> {
    let count = sqlx::query_scalar(
        "SELECT COUNT(*) FROM component_details WHERE component_id = ? AND detail_kind = ?",
    )
    .bind(component_id)
    .bind(detail_kind)
    .fetch_one(&mut *conn)
    .await?;
    Ok(count)
}

/// Add a detail under an existing component of family `T`.
pub async fn insert_detail<T: ComponentSpec>(
    conn: &mut SqliteConnection,
    component_id: &str,
    data: &T::Detail,
) -> CatalogResult<CatalogDetail<T::Detail>> {
    require_component::<T>(conn, component_id).await?;
    validate_detail(conn, data).await?;

    let id = generate_id("dtl");
    let now = Utc::now();

    debug!(
        "Adding {} detail {} to {}",
        data.detail_kind(),
        id,
        component_id
    );

    sqlx::query(
        r#"
        INSERT INTO component_details (id, component_id, detail_kind, data, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(component_id)
    .bind(data.detail_kind())
    .bind(serde_json::to_string(data)?)
    .bind(now)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    replace_detail_refs(conn, &id, &data.references()).await?;
    fetch_detail::<T::Detail>(conn, component_id, &id)
        .await?
        .ok_or_else(|| CatalogError::NotFound(format!("Detail {}", id)))
}

/// Overwrite a detail in place.
///
/// Returns `None` when `detail_id` is not a detail of `component_id`.
pub async fn update_detail<T: ComponentSpec>(
    conn: &mut SqliteConnection,
    component_id: &str,
    detail_id: &str,
    data: &T::Detail,
) -> CatalogResult<Option<CatalogDetail<T::Detail>>> {
    let Some(existing) = fetch_detail::<T::Detail>(conn, component_id, detail_id).await? else {
        return Ok(None);
    };
    validate_detail(conn, data).await?;

    // Moving a detail to another kind removes one from its old kind
    if existing.detail_kind != data.detail_kind()
        && count_details_of_kind(conn, component_id, &existing.detail_kind).await? <= 1
    {
        return Err(CatalogError::Protected(LAST_DETAIL_MESSAGE.to_string()));
    }

    sqlx::query(
        "UPDATE component_details SET detail_kind = ?, data = ?, updated_at = ? WHERE id = ?",
    )
    .bind(data.detail_kind())
    .bind(serde_json::to_string(data)?)
    .bind(Utc::now())
    .bind(detail_id)
    .execute(&mut *conn)
    .await?;

    replace_detail_refs(conn, detail_id, &data.references()).await?;
    fetch_detail::<T::Detail>(conn, component_id, detail_id).await
}

/// Delete one detail unless it is the last of its kind under the component.
pub async fn delete_detail(
    conn: &mut SqliteConnection,
    component_id: &str,
    detail_id: &str,
) -> CatalogResult<()> {
    let detail_kind: Option<String> = sqlx::query_scalar(
        "SELECT detail_kind FROM component_details WHERE id = ? AND component_id = ?",
    )
    .bind(detail_id)
    .bind(component_id)
    .fetch_optional(&mut *conn)
    .await?;

    let Some(detail_kind) = detail_kind else {
        return Err(CatalogError::NotFound(format!("Detail {}", detail_id)));
    };

    if count_details_of_kind(conn, component_id, &detail_kind).await? <= 1 {
        return Err(CatalogError::Protected(LAST_DETAIL_MESSAGE.to_string()));
    }

    sqlx::query("DELETE FROM component_details WHERE id = ?")
        .bind(detail_id)
        .execute(&mut *conn)
        .await?;

    debug!("Deleted detail {} from {}", detail_id, component_id);
    Ok(())
}

/// Every detail kind the family defines must be present at least once.
pub async fn ensure_detail_coverage<T: ComponentSpec>(
    conn: &mut SqliteConnection,
    component_id: &str,
) -> CatalogResult<()> {
    let mut errors = ValidationErrors::new();
    for detail_kind in T::DETAIL_KINDS {
        if count_details_of_kind(conn, component_id, detail_kind).await? == 0 {
            errors.push(
                "details",
                format!("At least one {} detail is required.", detail_kind),
            );
        }
    }
    errors.into_result()?;
    Ok(())
}

pub async fn fetch_lookup(conn: &mut SqliteConnection, id: &str) -> CatalogResult<Option<Lookup>> {
    let row = sqlx::query("SELECT * FROM lookups WHERE id = ?")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    row.as_ref().map(row_to_lookup).transpose()
}

async fn ensure_lookup_name_available(
    conn: &mut SqliteConnection,
    kind: LookupKind,
    name: &str,
    exclude_id: Option<&str>,
) -> CatalogResult<()> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM lookups WHERE kind = ? AND name = ? AND id <> ?")
            .bind(kind.as_str())
            .bind(name)
            .bind(exclude_id.unwrap_or(""))
            .fetch_one(&mut *conn)
            .await?;

    if count > 0 {
        return Err(CatalogError::Validation(ValidationErrors::single(
            "name",
            format!("{} with this name already exists.", kind),
        )));
    }
    Ok(())
}

pub async fn insert_lookup(conn: &mut SqliteConnection, data: &LookupData) -> CatalogResult<Lookup> {
    data.validate()?;
    let name = data.name();
    ensure_lookup_name_available(conn, data.kind(), &name, None).await?;

    let id = generate_id("lkp");
    let now = Utc::now();

    debug!("Creating {} lookup {} ({})", data.kind(), id, name);

    sqlx::query(
        r#"
        INSERT INTO lookups (id, kind, name, data, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(data.kind().as_str())
    .bind(&name)
    .bind(serde_json::to_string(data)?)
    .bind(now)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    fetch_lookup(conn, &id)
        .await?
        .ok_or_else(|| CatalogError::NotFound(format!("Lookup {}", id)))
}

pub async fn update_lookup(
    conn: &mut SqliteConnection,
    id: &str,
    data: &LookupData,
) -> CatalogResult<Lookup> {
    let existing = fetch_lookup(conn, id)
        .await?
        .ok_or_else(|| CatalogError::NotFound(format!("Lookup {}", id)))?;

    if existing.data.kind() != data.kind() {
        return Err(CatalogError::Validation(ValidationErrors::single(
            "kind",
            "Lookup kind cannot be changed.",
        )));
    }
    data.validate()?;
    let name = data.name();
    ensure_lookup_name_available(conn, data.kind(), &name, Some(id)).await?;

    sqlx::query("UPDATE lookups SET name = ?, data = ?, updated_at = ? WHERE id = ?")
        .bind(&name)
        .bind(serde_json::to_string(data)?)
        .bind(Utc::now())
        .bind(id)
        .execute(&mut *conn)
        .await?;

    fetch_lookup(conn, id)
        .await?
        .ok_or_else(|| CatalogError::NotFound(format!("Lookup {}", id)))
}
