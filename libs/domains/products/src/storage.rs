//! Public storage area for uploaded product images.

use async_trait::async_trait;
use bytes::Bytes;
use core_config::storage::StorageConfig;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::ValidImage;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Invalid storage path: {0}")]
    InvalidPath(String),

    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// File store backing the public area.
///
/// Paths are relative to the area root and always use `/` separators.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ImageStorage: Send + Sync {
    /// Store `image` under `dir` with a fresh name and return its path
    async fn put(&self, dir: &str, image: &ValidImage) -> StorageResult<String>;

    /// Returns `false` if there was nothing to delete
    async fn delete(&self, path: &str) -> StorageResult<bool>;

    async fn exists(&self, path: &str) -> StorageResult<bool>;

    /// Public URL for a stored path
    fn url(&self, path: &str) -> String;

    /// Fails if the store cannot currently accept writes
    async fn health_check(&self) -> StorageResult<()>;
}

/// Reject anything that could escape the storage root.
fn check_path(path: &str) -> StorageResult<&str> {
    let invalid = path.is_empty()
        || path.starts_with('/')
        || path.contains('\\')
        || path
            .split('/')
            .any(|part| part.is_empty() || part == "." || part == "..");

    if invalid {
        Err(StorageError::InvalidPath(path.to_string()))
    } else {
        Ok(path)
    }
}

fn new_name(dir: &str, image: &ValidImage) -> StorageResult<String> {
    let dir = check_path(dir.trim_matches('/'))?;
    Ok(format!("{}/{}.{}", dir, Uuid::now_v7(), image.kind.extension()))
}

fn join_url(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path)
}

/// Images on the local filesystem
#[derive(Debug, Clone)]
pub struct LocalImageStorage {
    root: PathBuf,
    public_url: String,
}

impl LocalImageStorage {
    pub fn new(config: &StorageConfig) -> Self {
        Self {
            root: config.public_root.clone(),
            public_url: config.public_url.clone(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> StorageResult<PathBuf> {
        Ok(self.root.join(check_path(path)?))
    }
}

#[async_trait]
impl ImageStorage for LocalImageStorage {
    async fn put(&self, dir: &str, image: &ValidImage) -> StorageResult<String> {
        let path = new_name(dir, image)?;
        let target = self.resolve(&path)?;

        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&target, &image.bytes).await?;

        tracing::debug!(path = %path, bytes = image.bytes.len(), "Stored image");
        Ok(path)
    }

    async fn delete(&self, path: &str) -> StorageResult<bool> {
        let target = self.resolve(path)?;

        match tokio::fs::remove_file(&target).await {
            Ok(()) => {
                tracing::debug!(path = %path, "Deleted image");
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn exists(&self, path: &str) -> StorageResult<bool> {
        let target = self.resolve(path)?;
        Ok(tokio::fs::try_exists(&target).await?)
    }

    fn url(&self, path: &str) -> String {
        join_url(&self.public_url, path)
    }

    async fn health_check(&self) -> StorageResult<()> {
        tokio::fs::create_dir_all(&self.root).await?;
        let metadata = tokio::fs::metadata(&self.root).await?;
        if metadata.permissions().readonly() {
            return Err(StorageError::Io(std::io::Error::new(
                ErrorKind::PermissionDenied,
                format!("{} is read-only", self.root.display()),
            )));
        }
        Ok(())
    }
}

/// In-memory implementation of ImageStorage (for development/testing)
#[derive(Debug, Clone)]
pub struct InMemoryImageStorage {
    files: Arc<RwLock<HashMap<String, Bytes>>>,
    public_url: String,
}

impl Default for InMemoryImageStorage {
    fn default() -> Self {
        Self::new("/storage")
    }
}

impl InMemoryImageStorage {
    pub fn new(public_url: impl Into<String>) -> Self {
        Self {
            files: Arc::default(),
            public_url: public_url.into(),
        }
    }

    pub async fn get(&self, path: &str) -> Option<Bytes> {
        self.files.read().await.get(path).cloned()
    }

    pub async fn len(&self) -> usize {
        self.files.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.files.read().await.is_empty()
    }
}

#[async_trait]
impl ImageStorage for InMemoryImageStorage {
    async fn put(&self, dir: &str, image: &ValidImage) -> StorageResult<String> {
        let path = new_name(dir, image)?;
        self.files
            .write()
            .await
            .insert(path.clone(), image.bytes.clone());
        Ok(path)
    }

    async fn delete(&self, path: &str) -> StorageResult<bool> {
        check_path(path)?;
        Ok(self.files.write().await.remove(path).is_some())
    }

    async fn exists(&self, path: &str) -> StorageResult<bool> {
        check_path(path)?;
        Ok(self.files.read().await.contains_key(path))
    }

    fn url(&self, path: &str) -> String {
        join_url(&self.public_url, path)
    }

    async fn health_check(&self) -> StorageResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::ImageKind;

    fn png() -> ValidImage {
        ValidImage {
            kind: ImageKind::Png,
            bytes: Bytes::from_static(b"\x89PNG\r\n\x1a\nrest"),
        }
    }

    #[test]
    fn test_check_path() {
        assert!(check_path("products/a.png").is_ok());
        assert!(check_path("").is_err());
        assert!(check_path("/etc/passwd").is_err());
        assert!(check_path("products/../../secret").is_err());
        assert!(check_path("products/./a.png").is_err());
        assert!(check_path("products//a.png").is_err());
        assert!(check_path("products\\a.png").is_err());
    }

    #[test]
    fn test_new_name_uses_detected_extension() {
        let jpeg = ValidImage {
            kind: ImageKind::Jpeg,
            bytes: Bytes::new(),
        };
        let name = new_name("/products/", &jpeg).unwrap();
        assert!(name.starts_with("products/"));
        assert!(name.ends_with(".jpg"));
        assert!(new_name("..", &jpeg).is_err());
    }

    #[tokio::test]
    async fn test_local_storage_lifecycle() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalImageStorage::new(&StorageConfig::new(dir.path(), "/storage/"));

        let path = storage.put("products", &png()).await.unwrap();
        assert!(storage.exists(&path).await.unwrap());
        assert_eq!(
            std::fs::read(dir.path().join(&path)).unwrap(),
            png().bytes.to_vec()
        );
        assert_eq!(storage.url(&path), format!("/storage/{}", path));

        assert!(storage.delete(&path).await.unwrap());
        assert!(!storage.exists(&path).await.unwrap());
        assert!(!storage.delete(&path).await.unwrap());
    }

    #[tokio::test]
    async fn test_local_storage_rejects_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalImageStorage::new(&StorageConfig::new(dir.path(), "/storage"));

        let err = storage.delete("../outside.png").await.unwrap_err();
        assert!(matches!(err, StorageError::InvalidPath(_)));
    }

    #[tokio::test]
    async fn test_local_health_check_creates_root() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("public");
        let storage = LocalImageStorage::new(&StorageConfig::new(&root, "/storage"));

        storage.health_check().await.unwrap();
        assert!(root.is_dir());
    }

    #[tokio::test]
    async fn test_in_memory_storage() {
        let storage = InMemoryImageStorage::default();
        let path = storage.put("products", &png()).await.unwrap();

        assert_eq!(storage.len().await, 1);
        assert_eq!(storage.get(&path).await, Some(png().bytes));
        assert!(storage.delete(&path).await.unwrap());
        assert!(storage.is_empty().await);
    }
}
