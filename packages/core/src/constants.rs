// ABOUTME: Shared constants and well-known filesystem locations
// ABOUTME: Resolves the Quadbase data directory and its default contents

use std::env;
use std::path::PathBuf;

/// Fixed message returned whenever the last detail of a kind would be removed.
pub const LAST_DETAIL_MESSAGE: &str = "Cannot delete the only Detail for this object.";

/// Default upper bound on a single decoded attachment (10 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Get the path to the Quadbase directory (~/.quadbase)
pub fn quadbase_dir() -> PathBuf {
    // HOME wins so tests can redirect the data directory
    if let Ok(home) = env::var("HOME") {
        PathBuf::from(home).join(".quadbase")
    } else {
        dirs::home_dir()
            .unwrap_or_else(env::temp_dir)
            .join(".quadbase")
    }
}

/// Default SQLite database location (~/.quadbase/quadbase.db)
pub fn default_database_path() -> PathBuf {
    quadbase_dir().join("quadbase.db")
}

/// Default attachment blob directory (~/.quadbase/media)
pub fn default_media_dir() -> PathBuf {
    quadbase_dir().join("media")
}
