//! # Object Storage
//!
//! Product images live outside the database. The catalog only ever sees
//! the URL an object was stored under.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  put(bytes, "image/png")  ──►  {dir}/3f2a...c9.png                      │
//! │                           ◄──  "/uploads/3f2a...c9.png"                 │
//! │                                                                         │
//! │  get("/uploads/3f2a...c9.png")     ──► bytes                            │
//! │  delete("/uploads/3f2a...c9.png")  ──► file removed                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

/// URL prefix of objects served by the local store.
pub const URL_PREFIX: &str = "/uploads/";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("object not found: {0}")]
    NotFound(String),

    #[error("invalid object url: {0}")]
    InvalidUrl(String),

    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Blob store for product images.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Stores `bytes` and returns the URL to reference them by.
    async fn put(&self, bytes: Vec<u8>, content_type: &str) -> StorageResult<String>;

    async fn get(&self, url: &str) -> StorageResult<Vec<u8>>;

    async fn delete(&self, url: &str) -> StorageResult<()>;
}

/// Stores objects as files in one directory, named by UUID.
#[derive(Debug, Clone)]
pub struct LocalObjectStore {
    root: PathBuf,
}

impl LocalObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        LocalObjectStore { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Maps a URL back to its file, refusing anything outside the root.
    fn path_for(&self, url: &str) -> StorageResult<PathBuf> {
        let key = url
            .strip_prefix(URL_PREFIX)
            .ok_or_else(|| StorageError::InvalidUrl(url.to_string()))?;

        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-')
            && !key.starts_with('.');
        if !valid {
            return Err(StorageError::InvalidUrl(url.to_string()));
        }

        Ok(self.root.join(key))
    }
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    async fn put(&self, bytes: Vec<u8>, content_type: &str) -> StorageResult<String> {
        tokio::fs::create_dir_all(&self.root).await?;

        let key = format!("{}.{}", Uuid::new_v4().simple(), extension_for(content_type));
        tokio::fs::write(self.root.join(&key), &bytes).await?;

        debug!(%key, size = bytes.len(), "Object stored");
        Ok(format!("{URL_PREFIX}{key}"))
    }

    async fn get(&self, url: &str) -> StorageResult<Vec<u8>> {
        let path = self.path_for(url)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(url.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, url: &str) -> StorageResult<()> {
        let path = self.path_for(url)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                debug!(%url, "Object deleted");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(url.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }
}

fn extension_for(content_type: &str) -> &'static str {
    match content_type {
        "image/png" => "png",
        "image/jpeg" | "image/jpg" => "jpg",
        "image/gif" => "gif",
        "image/webp" => "webp",
        _ => "bin",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_get_delete() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalObjectStore::new(dir.path().join("uploads"));

        let url = store.put(b"png-bytes".to_vec(), "image/png").await.unwrap();
        assert!(url.starts_with(URL_PREFIX));
        assert!(url.ends_with(".png"));

        assert_eq!(store.get(&url).await.unwrap(), b"png-bytes");

        store.delete(&url).await.unwrap();
        assert!(matches!(store.get(&url).await, Err(StorageError::NotFound(_))));
        assert!(matches!(store.delete(&url).await, Err(StorageError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_rejects_paths_outside_root() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalObjectStore::new(dir.path());

        for url in ["/uploads/../secret", "/uploads/", "/etc/passwd", "/uploads/a/b.png"] {
            assert!(
                matches!(store.get(url).await, Err(StorageError::InvalidUrl(_))),
                "{url} should be rejected"
            );
        }
    }
}
