//! Upload ingestion gate.
//!
//! Validates incoming image uploads and turns accepted ones into `Pending`
//! artworks. Processing never starts here; callers kick off a job separately.

use std::sync::Arc;

use thiserror::Error;

use crate::artwork::{Artwork, ArtworkError, ArtworkStore, CreateArtworkRequest};
use crate::audit::{AuditEvent, AuditHandle};
use crate::blobstore::BlobStore;
use crate::config::UploadConfig;
use crate::metrics;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Upload is empty")]
    EmptyUpload,

    #[error("Upload of {size} bytes exceeds the {limit} byte limit")]
    TooLarge { size: u64, limit: u64 },

    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),

    #[error("Invalid image data: {0}")]
    InvalidImage(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error(transparent)]
    Store(#[from] ArtworkError),
}

/// Validates uploads and creates pending artworks from accepted ones.
pub struct IngestionGate {
    config: UploadConfig,
    blobs: Arc<dyn BlobStore>,
    artworks: Arc<dyn ArtworkStore>,
    audit: Option<AuditHandle>,
}

impl IngestionGate {
    pub fn new(
        config: UploadConfig,
        blobs: Arc<dyn BlobStore>,
        artworks: Arc<dyn ArtworkStore>,
    ) -> Self {
        Self {
            config,
            blobs,
            artworks,
            audit: None,
        }
    }

    pub fn with_audit(mut self, audit: AuditHandle) -> Self {
        self.audit = Some(audit);
        self
    }

    /// Validate an upload and create a `Pending` artwork from it.
    ///
    /// Checks run cheapest-first: size and declared media type before the
    /// decode probe. The original bytes are stored only after every check
    /// passes.
    pub async fn ingest(
        &self,
        bytes: &[u8],
        declared_mime: &str,
        owner: Option<String>,
    ) -> Result<Artwork, ValidationError> {
        match self.validate_and_store(bytes, declared_mime, owner).await {
            Ok(artwork) => {
                metrics::UPLOADS_TOTAL.with_label_values(&["accepted"]).inc();
                metrics::UPLOAD_SIZE_BYTES.observe(bytes.len() as f64);
                if let Some(ref audit) = self.audit {
                    audit
                        .emit(AuditEvent::ArtworkUploaded {
                            artwork_id: artwork.id.clone(),
                            owner: artwork.owner.clone(),
                            size_bytes: bytes.len() as u64,
                            content_type: normalize_mime(declared_mime),
                        })
                        .await;
                }
                Ok(artwork)
            }
            Err(e) => {
                metrics::UPLOADS_TOTAL.with_label_values(&["rejected"]).inc();
                if let Some(ref audit) = self.audit {
                    audit
                        .emit(AuditEvent::UploadRejected {
                            reason: e.to_string(),
                            content_type: Some(normalize_mime(declared_mime)),
                            size_bytes: bytes.len() as u64,
                        })
                        .await;
                }
                Err(e)
            }
        }
    }

    async fn validate_and_store(
        &self,
        bytes: &[u8],
        declared_mime: &str,
        owner: Option<String>,
    ) -> Result<Artwork, ValidationError> {
        if bytes.is_empty() {
            return Err(ValidationError::EmptyUpload);
        }

        let size = bytes.len();
        if size > self.config.max_bytes {
            return Err(ValidationError::TooLarge {
                size: size as u64,
                limit: self.config.max_bytes as u64,
            });
        }

        let mime = normalize_mime(declared_mime);
        if !self.config.allowed_mime_types.contains(&mime) {
            return Err(ValidationError::UnsupportedMediaType(mime));
        }

        // Decode probe: the bytes must parse as an actual image of the
        // declared format, not just carry the right content type header.
        let format = image::guess_format(bytes)
            .map_err(|e| ValidationError::InvalidImage(e.to_string()))?;
        let format_mime = format.to_mime_type();
        if format_mime != mime {
            return Err(ValidationError::InvalidImage(format!(
                "declared {} but content is {}",
                mime, format_mime
            )));
        }
        image::load_from_memory(bytes)
            .map_err(|e| ValidationError::InvalidImage(e.to_string()))?;

        let key = format!("orig-{}", uuid::Uuid::new_v4());
        self.blobs
            .put(&key, bytes)
            .await
            .map_err(|e| ValidationError::Storage(e.to_string()))?;

        let artwork = self.artworks.create(CreateArtworkRequest {
            owner,
            original_image: key,
        })?;

        tracing::info!(
            artwork_id = %artwork.id,
            size_bytes = size,
            content_type = %mime,
            "Artwork ingested"
        );

        Ok(artwork)
    }
}

/// Lowercase and strip parameters, e.g. "image/JPEG; charset=x" -> "image/jpeg".
fn normalize_mime(mime: &str) -> String {
    mime.split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase()
}
