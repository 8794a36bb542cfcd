//! Artwork storage trait and types.

use thiserror::Error;

use super::{Artwork, ArtworkStatus, MediumSuggestion, Palette};

/// Error type for artwork operations.
#[derive(Debug, Error)]
pub enum ArtworkError {
    #[error("Artwork not found: {0}")]
    NotFound(String),

    #[error("Artwork {artwork_id}: cannot transition from {from} to {to}")]
    InvalidTransition {
        artwork_id: String,
        from: String,
        to: String,
    },

    #[error("Database error: {0}")]
    Database(String),
}

/// Request to create a new artwork.
#[derive(Debug, Clone)]
pub struct CreateArtworkRequest {
    /// Opaque owner identifier from the upload, if any.
    pub owner: Option<String>,
    /// Blob key of the stored original image.
    pub original_image: String,
}

/// Filter for querying artworks.
#[derive(Debug, Clone)]
pub struct ArtworkFilter {
    /// Filter by status string ("pending", "processing", ...).
    pub status: Option<String>,
    /// Filter by owner.
    pub owner: Option<String>,
    /// Maximum number of results.
    pub limit: i64,
    /// Offset for pagination.
    pub offset: i64,
}

impl Default for ArtworkFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl ArtworkFilter {
    pub fn new() -> Self {
        Self {
            status: None,
            owner: None,
            limit: 100,
            offset: 0,
        }
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = Some(owner.into());
        self
    }

    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_offset(mut self, offset: i64) -> Self {
        self.offset = offset;
        self
    }
}

/// Trait for artwork storage backends.
///
/// Artworks are never deleted; terminal records stay queryable.
pub trait ArtworkStore: Send + Sync {
    /// Create a new artwork in Pending status.
    fn create(&self, request: CreateArtworkRequest) -> Result<Artwork, ArtworkError>;

    /// Get an artwork by ID.
    fn get(&self, id: &str) -> Result<Option<Artwork>, ArtworkError>;

    /// List artworks matching the filter, newest first.
    fn list(&self, filter: &ArtworkFilter) -> Result<Vec<Artwork>, ArtworkError>;

    /// Count artworks matching the filter.
    fn count(&self, filter: &ArtworkFilter) -> Result<i64, ArtworkError>;

    /// Move an artwork to a new status, enforcing transition legality.
    fn set_status(&self, id: &str, status: ArtworkStatus) -> Result<Artwork, ArtworkError>;

    /// Mark an artwork Completed together with its outputs.
    ///
    /// The status, template key, palettes and medium suggestion are written
    /// in a single statement so no reader observes Completed without them.
    fn complete(
        &self,
        id: &str,
        processed_image: &str,
        palettes: &[Palette],
        medium_suggestion: Option<&MediumSuggestion>,
    ) -> Result<Artwork, ArtworkError>;
}
