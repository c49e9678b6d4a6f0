// ABOUTME: Canonical component catalog for Quadbase
// ABOUTME: Component families, their details, lookup tables, and SQLite-backed storage

pub mod error;
pub mod families;
pub mod lookups;
pub mod storage;
pub mod traits;
pub mod types;
pub mod writes;

pub use error::{CatalogError, CatalogResult};
pub use lookups::LookupData;
pub use quadbase_core::{ComponentKind, LookupKind};
pub use storage::CatalogStorage;
pub use traits::{ComponentHeader, ComponentSpec, DetailSpec, NoDetail, RefTarget, Reference};
pub use types::{CatalogDetail, CatalogEntry, CatalogItem, ComponentQuery, Lookup, Visibility};
