// ABOUTME: Persisted catalog records and query parameters
// ABOUTME: Generic over the family payload so each family reuses one record shape

use chrono::{DateTime, Utc};
use quadbase_core::ComponentKind;
use serde::Serialize;

use crate::lookups::LookupData;
use crate::traits::{ComponentSpec, DetailSpec};

/// A stored component of family `T`.
#[derive(Debug, Clone, Serialize)]
#[serde(bound(serialize = ""))]
pub struct CatalogItem<T: ComponentSpec> {
    pub id: String,
    pub kind: ComponentKind,
    /// `None` for public items; the owning user for private items.
    pub owner_id: Option<String>,
    #[serde(flatten)]
    pub data: T,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl<T: ComponentSpec> CatalogItem<T> {
    pub fn is_public(&self) -> bool {
        self.owner_id.is_none()
    }
}

/// A stored detail row under a component.
#[derive(Debug, Clone, Serialize)]
#[serde(bound(serialize = ""))]
pub struct CatalogDetail<D: DetailSpec> {
    pub id: String,
    pub component_id: String,
    pub detail_kind: String,
    #[serde(flatten)]
    pub data: D,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A component together with its details.
#[derive(Debug, Clone, Serialize)]
#[serde(bound(serialize = ""))]
pub struct CatalogEntry<T: ComponentSpec> {
    #[serde(flatten)]
    pub item: CatalogItem<T>,
    pub details: Vec<CatalogDetail<T::Detail>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Lookup {
    pub id: String,
    /// Display name, unique within the lookup kind
    pub label: String,
    #[serde(flatten)]
    pub data: LookupData,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Which components a listing may return.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Visibility {
    /// Public items only.
    #[default]
    Public,
    /// Public items plus the given user's private items.
    PublicAndOwner(String),
    /// Every item, public or private.
    All,
}

#[derive(Debug, Clone, Default)]
pub struct ComponentQuery {
    pub visibility: Visibility,
    /// Case-insensitive match on manufacturer or model.
    pub search: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}
