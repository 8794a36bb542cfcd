//! Binary blob storage for original uploads and rendered templates.

mod fs_store;

pub use fs_store::FsBlobStore;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BlobError {
    #[error("Blob not found: {0}")]
    NotFound(String),

    #[error("Invalid blob key: {0}")]
    InvalidKey(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Trait for blob storage backends.
///
/// Keys are flat, caller-chosen identifiers. A `put` must be atomic: readers
/// see either the whole blob or none of it, never a partial write.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store a blob under the given key, replacing any existing content.
    async fn put(&self, key: &str, bytes: &[u8]) -> Result<(), BlobError>;

    /// Fetch the blob stored under the given key.
    async fn get(&self, key: &str) -> Result<Vec<u8>, BlobError>;

    /// Returns true if a blob exists under the given key.
    async fn exists(&self, key: &str) -> Result<bool, BlobError>;
}
