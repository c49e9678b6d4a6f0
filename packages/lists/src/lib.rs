// ABOUTME: User favorites lists for Quadbase
// ABOUTME: Named per-user lists of catalog components of any family

pub mod error;
pub mod storage;
pub mod types;

pub use error::{ListError, ListResult};
pub use storage::ListStorage;
pub use types::{FavoriteList, ListInput, ListItem, ListItemInput};
