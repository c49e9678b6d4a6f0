// ABOUTME: Test helpers for creating throwaway databases
// ABOUTME: Backed by temporary files so every pooled connection shares one database

use sqlx::SqlitePool;
use tempfile::TempDir;

use crate::{Database, StorageConfig};

/// A migrated database living in a temporary directory.
///
/// Keep the value alive for the duration of the test; dropping it removes the file.
pub struct TestDatabase {
    pub pool: SqlitePool,
    dir: TempDir,
}

impl TestDatabase {
    pub async fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let config = StorageConfig {
            max_connections: 4,
            busy_timeout_seconds: 5,
            ..StorageConfig::with_path(dir.path().join("test.db"))
        };
        let database = Database::open(&config)
            .await
            .expect("Failed to open test database");

        Self {
            pool: database.into_pool(),
            dir,
        }
    }

    pub fn path(&self) -> &std::path::Path {
        self.dir.path()
    }
}
