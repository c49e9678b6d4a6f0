// ABOUTME: Favorites list records and payloads
// ABOUTME: Items point at catalog components by family and id

use chrono::{DateTime, Utc};
use quadbase_core::ComponentKind;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FavoriteList {
    pub id: String,
    pub owner_id: String,
    pub name: String,
    pub description: String,
    pub item_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListItem {
    pub id: String,
    pub list_id: String,
    pub component_kind: ComponentKind,
    pub component_id: String,
    pub manufacturer: String,
    pub model: String,
    pub added_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListInput {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

impl ListInput {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ListItemInput {
    pub component_kind: ComponentKind,
    pub component_id: String,
}
