// ABOUTME: Blob storage backends for attachment bodies
// ABOUTME: Filesystem store for production and an in-memory store for tests and embedding

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::{AttachmentError, AttachmentResult};

/// Content store addressed by relative keys such as `images/antenna/<sha>.png`.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn put(&self, key: &str, bytes: &[u8]) -> AttachmentResult<()>;

    async fn get(&self, key: &str) -> AttachmentResult<Vec<u8>>;

    async fn delete(&self, key: &str) -> AttachmentResult<()>;

    async fn exists(&self, key: &str) -> AttachmentResult<bool>;
}

/// Stores blobs as files under a root directory.
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> AttachmentResult<PathBuf> {
        let relative = Path::new(key);
        let safe = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
        if !safe || key.is_empty() {
            return Err(AttachmentError::Blob(format!("Invalid blob key: {}", key)));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn put(&self, key: &str, bytes: &[u8]) -> AttachmentResult<()> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        debug!("Writing blob {} ({} bytes)", key, bytes.len());
        tokio::fs::write(&path, bytes).await?;
        Ok(())
    }

    async fn get(&self, key: &str) -> AttachmentResult<Vec<u8>> {
        let path = self.path_for(key)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(AttachmentError::NotFound(format!("Blob {}", key)))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, key: &str) -> AttachmentResult<()> {
        let path = self.path_for(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn exists(&self, key: &str) -> AttachmentResult<bool> {
        let path = self.path_for(key)?;
        Ok(tokio::fs::try_exists(&path).await?)
    }
}

#[derive(Default)]
pub struct MemoryBlobStore {
    blobs: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.blobs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.blobs.read().await.is_empty()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(&self, key: &str, bytes: &[u8]) -> AttachmentResult<()> {
        self.blobs
            .write()
            .await
            .insert(key.to_string(), bytes.to_vec());
        Ok(())
    }

    async fn get(&self, key: &str) -> AttachmentResult<Vec<u8>> {
        self.blobs
            .read()
            .await
            .get(key)
            .cloned()
            .ok_or_else(|| AttachmentError::NotFound(format!("Blob {}", key)))
    }

    async fn delete(&self, key: &str) -> AttachmentResult<()> {
        self.blobs.write().await.remove(key);
        Ok(())
    }

    async fn exists(&self, key: &str) -> AttachmentResult<bool> {
        Ok(self.blobs.read().await.contains_key(key))
    }
}

/// Blob keys held by uploads whose attachment rows are not committed yet.
///
/// A pinned key is never released, even when no committed row refers to it.
#[derive(Debug, Clone, Default)]
pub struct BlobPins {
    counts: Arc<Mutex<HashMap<String, usize>>>,
}

impl BlobPins {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pin(&self, key: &str) -> BlobPin {
        let mut counts = self.counts.lock().unwrap_or_else(|p| p.into_inner());
        *counts.entry(key.to_string()).or_insert(0) += 1;
        BlobPin {
            key: key.to_string(),
            counts: self.counts.clone(),
        }
    }

    pub fn is_pinned(&self, key: &str) -> bool {
        self.counts
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .contains_key(key)
    }
}

/// Unpins its key when dropped.
#[derive(Debug)]
pub struct BlobPin {
    key: String,
    counts: Arc<Mutex<HashMap<String, usize>>>,
}

impl Drop for BlobPin {
    fn drop(&mut self) {
        let mut counts = self.counts.lock().unwrap_or_else(|p| p.into_inner());
        if let Some(count) = counts.get_mut(&self.key) {
            *count -= 1;
            if *count == 0 {
                counts.remove(&self.key);
            }
        }
    }
}
