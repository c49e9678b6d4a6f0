// ABOUTME: Catalog storage layer using SQLite
// ABOUTME: Pool-level CRUD for components, details, and lookups, each write in its own transaction

use quadbase_core::{ComponentKind, LookupKind};
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{CatalogError, CatalogResult};
use crate::lookups::LookupData;
use crate::traits::ComponentSpec;
use crate::types::{CatalogDetail, CatalogEntry, CatalogItem, ComponentQuery, Lookup, Visibility};
use crate::writes;

pub struct CatalogStorage {
    pool: SqlitePool,
}

impl CatalogStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Create a component together with its initial details.
    ///
    /// `owner_id == None` creates a public item. Families with details must
    /// supply at least one detail of every kind they define.
    pub async fn create_component<T: ComponentSpec>(
        &self,
        owner_id: Option<&str>,
        data: &T,
        details: &[T::Detail],
    ) -> CatalogResult<CatalogEntry<T>> {
        let mut tx = self.pool.begin().await?;

        let item = writes::insert_component::<T>(&mut tx, owner_id, data).await?;
        let mut created = Vec::with_capacity(details.len());
        for (index, detail) in details.iter().enumerate() {
            let row = writes::insert_detail::<T>(&mut tx, &item.id, detail)
                .await
                .map_err(|e| writes::nest_validation(e, &format!("details[{}]", index)))?;
            created.push(row);
        }
        writes::ensure_detail_coverage::<T>(&mut tx, &item.id).await?;

        tx.commit().await?;

        info!("Created {} {}", T::KIND, item.id);
        Ok(CatalogEntry {
            item,
            details: created,
        })
    }

    /// Replace scalar fields and reference sets of a component.
    pub async fn update_component<T: ComponentSpec>(
        &self,
        id: &str,
        data: &T,
    ) -> CatalogResult<CatalogItem<T>> {
        let mut tx = self.pool.begin().await?;
        let item = writes::update_component::<T>(&mut tx, id, data).await?;
        tx.commit().await?;
        Ok(item)
    }

    pub async fn get_component<T: ComponentSpec>(&self, id: &str) -> CatalogResult<CatalogEntry<T>> {
        debug!("Fetching {} {}", T::KIND, id);
        let mut conn = self.pool.acquire().await?;

        let item = writes::fetch_component::<T>(&mut conn, id)
            .await?
            .ok_or_else(|| CatalogError::NotFound(format!("{} {}", T::KIND.display_name(), id)))?;
        let details = writes::fetch_details::<T>(&mut conn, id).await?;

        Ok(CatalogEntry { item, details })
    }

    /// List components of one family, newest first, with a total count.
    pub async fn list_components<T: ComponentSpec>(
        &self,
        query: &ComponentQuery,
    ) -> CatalogResult<(Vec<CatalogItem<T>>, i64)> {
        debug!("Listing {} (query: {:?})", T::KIND, query);

        let mut clauses = vec!["kind = ?".to_string()];
        let mut binds: Vec<String> = vec![T::KIND.as_str().to_string()];

        match &query.visibility {
            Visibility::Public => clauses.push("owner_id IS NULL".to_string()),
            Visibility::PublicAndOwner(owner) => {
                clauses.push("(owner_id IS NULL OR owner_id = ?)".to_string());
                binds.push(owner.clone());
            }
            Visibility::All => {}
        }

        if let Some(search) = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            clauses.push("(manufacturer LIKE ? OR model LIKE ?)".to_string());
            let pattern = format!("%{}%", search);
            binds.push(pattern.clone());
            binds.push(pattern);
        }

        let where_clause = clauses.join(" AND ");

        let count_sql = format!("SELECT COUNT(*) FROM components WHERE {}", where_clause);
        let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
        for value in &binds {
            count_query = count_query.bind(value);
        }
        let total = count_query.fetch_one(&self.pool).await?;

        let mut sql = format!(
            "SELECT * FROM components WHERE {} ORDER BY created_at DESC, id",
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
        let rows = select.fetch_all(&self.pool).await?;

        let items = rows
            .iter()
            .map(writes::row_to_item::<T>)
            .collect::<Result<Vec<_>, _>>()?;

        Ok((items, total))
    }

    pub async fn count_components(&self, kind: ComponentKind) -> CatalogResult<i64> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM components WHERE kind = ?")
            .bind(kind.as_str())
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    pub async fn delete_component<T: ComponentSpec>(&self, id: &str) -> CatalogResult<()> {
        let mut conn = self.pool.acquire().await?;
        writes::delete_component(&mut conn, T::KIND, id).await?;
        info!("Deleted {} {}", T::KIND, id);
        Ok(())
    }

    pub async fn add_detail<T: ComponentSpec>(
        &self,
        component_id: &str,
        data: &T::Detail,
    ) -> CatalogResult<CatalogDetail<T::Detail>> {
        let mut tx = self.pool.begin().await?;
        let detail = writes::insert_detail::<T>(&mut tx, component_id, data).await?;
        tx.commit().await?;
        Ok(detail)
    }

    pub async fn update_detail<T: ComponentSpec>(
        &self,
        component_id: &str,
        detail_id: &str,
        data: &T::Detail,
    ) -> CatalogResult<CatalogDetail<T::Detail>> {
        let mut tx = self.pool.begin().await?;
        let detail = writes::update_detail::<T>(&mut tx, component_id, detail_id, data)
            .await?
            .ok_or_else(|| CatalogError::NotFound(format!("Detail {}", detail_id)))?;
        tx.commit().await?;
        Ok(detail)
    }

    pub async fn list_details<T: ComponentSpec>(
        &self,
        component_id: &str,
    ) -> CatalogResult<Vec<CatalogDetail<T::Detail>>> {
        let mut conn = self.pool.acquire().await?;
        writes::fetch_details::<T>(&mut conn, component_id).await
    }

    /// Delete one detail; the last detail of its kind is protected.
    pub async fn delete_detail<T: ComponentSpec>(
        &self,
        component_id: &str,
        detail_id: &str,
    ) -> CatalogResult<()> {
        let mut tx = self.pool.begin().await?;
        if !writes::component_exists(&mut tx, T::KIND, component_id).await? {
            return Err(CatalogError::NotFound(format!(
                "{} {}",
                T::KIND.display_name(),
                component_id
            )));
        }
        writes::delete_detail(&mut tx, component_id, detail_id).await?;
        tx.commit().await?;
        Ok(())
    }

    pub async fn create_lookup(&self, data: &LookupData) -> CatalogResult<Lookup> {
        let mut tx = self.pool.begin().await?;
        let lookup = writes::insert_lookup(&mut tx, data).await?;
        tx.commit().await?;
        Ok(lookup)
    }

    pub async fn update_lookup(&self, id: &str, data: &LookupData) -> CatalogResult<Lookup> {
        let mut tx = self.pool.begin().await?;
        let lookup = writes::update_lookup(&mut tx, id, data).await?;
        tx.commit().await?;
        Ok(lookup)
    }

    pub async fn get_lookup(&self, id: &str) -> CatalogResult<Lookup> {
        let mut conn = self.pool.acquire().await?;
        writes::fetch_lookup(&mut conn, id)
            .await?
            .ok_or_else(|| CatalogError::NotFound(format!("Lookup {}", id)))
    }

    pub async fn list_lookups(&self, kind: LookupKind) -> CatalogResult<Vec<Lookup>> {
        let rows = sqlx::query("SELECT * FROM lookups WHERE kind = ? ORDER BY name")
            .bind(kind.as_str())
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(writes::row_to_lookup).collect()
    }
}
