use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;
use sha2::{Digest, Sha256};
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Invalid file path: {0}")]
    InvalidPath(String),
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A file accepted by the storage backend
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredFile {
    /// Path relative to the storage root, as recorded in `documents.file_path`
    pub path: String,
    pub url: String,
    pub size: u64,
    /// Hex sha256 of the contents
    pub checksum: String,
}

/// Upload target for documents
#[async_trait]
pub trait FileStorage: Send + Sync {
    async fn put(&self, folder: &str, file_name: &str, bytes: &[u8]) -> Result<StoredFile, StorageError>;

    async fn remove(&self, path: &str) -> Result<(), StorageError>;
}

/// Files under a directory on local disk, served at `public_url_prefix`
pub struct LocalDiskStorage {
    root: PathBuf,
    public_url_prefix: String,
}

impl LocalDiskStorage {
    pub fn new(root: impl Into<PathBuf>, public_url_prefix: impl Into<String>) -> Self {
        Self { root: root.into(), public_url_prefix: public_url_prefix.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> Result<PathBuf, StorageError> {
        let relative = Path::new(path);
        let safe = relative
            .components()
            .all(|c| matches!(c, std::path::Component::Normal(_)));
        if path.is_empty() || !safe {
            return Err(StorageError::InvalidPath(path.to_string()));
        }
        Ok(self.root.join(relative))
    }
}

/// Keeps the extension, replaces the name with a random one
fn stored_name(file_name: &str) -> String {
    let extension = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty() && e.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|e| format!(".{}", e.to_ascii_lowercase()))
        .unwrap_or_default();
    format!("{}-{}{}", Utc::now().format("%Y%m%d"), Uuid::new_v4().simple(), extension)
}

pub fn checksum(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

#[async_trait]
impl FileStorage for LocalDiskStorage {
    async fn put(&self, folder: &str, file_name: &str, bytes: &[u8]) -> Result<StoredFile, StorageError> {
        let relative = format!("{}/{}", folder.trim_matches('/'), stored_name(file_name));
        let target = self.resolve(&relative)?;
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&target, bytes).await?;
        tracing::debug!("Stored {} bytes at {}", bytes.len(), target.display());

        Ok(StoredFile {
            url: format!("{}/{}", self.public_url_prefix.trim_end_matches('/'), relative),
            path: relative,
            size: bytes.len() as u64,
            checksum: checksum(bytes),
        })
    }

    async fn remove(&self, path: &str) -> Result<(), StorageError> {
        let target = self.resolve(path)?;
        match tokio::fs::remove_file(&target).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn stores_and_removes_files() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalDiskStorage::new(dir.path(), "/storage");
        let stored = storage.put("documents", "Deed.PDF", b"%PDF-1.4").await.unwrap();

        assert!(stored.path.starts_with("documents/"));
        assert!(stored.path.ends_with(".pdf"));
        assert_eq!(stored.url, format!("/storage/{}", stored.path));
        assert_eq!(stored.size, 8);
        assert_eq!(stored.checksum, checksum(b"%PDF-1.4"));
        assert!(dir.path().join(&stored.path).exists());

        storage.remove(&stored.path).await.unwrap();
        assert!(!dir.path().join(&stored.path).exists());
        storage.remove(&stored.path).await.unwrap();
    }

    #[tokio::test]
    async fn refuses_paths_outside_the_root() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalDiskStorage::new(dir.path(), "/storage");
        assert!(matches!(storage.remove("../etc/passwd").await, Err(StorageError::InvalidPath(_))));
        assert!(matches!(storage.remove("/etc/passwd").await, Err(StorageError::InvalidPath(_))));
    }

    #[test]
    fn checksum_is_sha256_hex() {
        assert_eq!(checksum(b""), "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855");
    }
}
