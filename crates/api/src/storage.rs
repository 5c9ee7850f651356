//! Public file storage for uploaded images.
//!
//! Files live under a root directory and are addressed by relative keys
//! such as `products/<uuid>.png`. The public URL of a key is
//! `/storage/<key>`, which the router serves straight from the root.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// URL prefix under which stored files are served.
pub const PUBLIC_PREFIX: &str = "/storage/";

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The key escapes the storage root or is empty.
    #[error("invalid storage key: {0}")]
    InvalidKey(String),

    /// Filesystem operation failed.
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Storage backend for public files.
#[async_trait]
pub trait FileStorage: Send + Sync {
    /// Write `bytes` under `key`, replacing any existing file.
    async fn put(&self, key: &str, bytes: &[u8]) -> Result<(), StorageError>;

    /// Remove `key`. Returns `false` if it did not exist.
    async fn delete(&self, key: &str) -> Result<bool, StorageError>;

    /// Public URL for `key`.
    fn url(&self, key: &str) -> String {
        format!("{PUBLIC_PREFIX}{}", key.trim_start_matches('/'))
    }

    /// The key behind a public URL, if the URL points into this storage.
    fn path_from_url(&self, url: &str) -> Option<String> {
        let path = url.find(PUBLIC_PREFIX).map(|at| &url[at + PUBLIC_PREFIX.len()..])?;
        (!path.is_empty()).then(|| path.to_owned())
    }
}

/// Local-disk storage rooted at a directory.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root: PathBuf,
}

impl LocalStorage {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The storage root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, key: &str) -> Result<PathBuf, StorageError> {
        let relative = Path::new(key);
        let safe = !key.is_empty()
            && relative
                .components()
                .all(|component| matches!(component, Component::Normal(_)));
        if !safe {
            return Err(StorageError::InvalidKey(key.to_owned()));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl FileStorage for LocalStorage {
    async fn put(&self, key: &str, bytes: &[u8]) -> Result<(), StorageError> {
        let path = self.resolve(key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        // Write to a sibling temp file, then rename into place
        let tmp = path.with_extension("part");
        let mut file = fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.sync_all().await?;
        drop(file);
        fs::rename(&tmp, &path).await?;

        tracing::debug!(key, size = bytes.len(), "Stored file");
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool, StorageError> {
        let path = self.resolve(key)?;
        match fs::remove_file(&path).await {
            Ok(()) => {
                tracing::debug!(key, "Deleted file");
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}
