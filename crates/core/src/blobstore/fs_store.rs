//! Filesystem blob store implementation.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;

use super::{BlobError, BlobStore};

/// Blob store writing each blob as a file under a root directory.
///
/// Writes go to a temp file first and are renamed into place, so a `get`
/// never observes a half-written blob.
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    /// Create a store rooted at the given directory, creating it if needed.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, BlobError> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// Keys map directly to file names, so path traversal must be rejected.
    fn path_for(&self, key: &str) -> Result<PathBuf, BlobError> {
        if key.is_empty()
            || !key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
            || key.starts_with('.')
        {
            return Err(BlobError::InvalidKey(key.to_string()));
        }
        Ok(self.root.join(key))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn put(&self, key: &str, bytes: &[u8]) -> Result<(), BlobError> {
        let dest = self.path_for(key)?;
        let tmp = self
            .root
            .join(format!("tmp-{}.partial", uuid::Uuid::new_v4()));

        fs::write(&tmp, bytes).await?;
        match fs::rename(&tmp, &dest).await {
            Ok(()) => Ok(()),
            Err(e) => {
                let _ = fs::remove_file(&tmp).await;
                Err(e.into())
            }
        }
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>, BlobError> {
        let path = self.path_for(key)?;
        match fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(BlobError::NotFound(key.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn exists(&self, key: &str) -> Result<bool, BlobError> {
        let path = self.path_for(key)?;
        Ok(fs::try_exists(&path).await?)
    }
}
