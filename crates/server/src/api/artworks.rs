//! Artwork API handlers: upload, query and processing kickoff.

use axum::{
    extract::{Multipart, Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use fotopainter_core::{
    Artwork, ArtworkFilter, ArtworkStatus, MediumSuggestion, Palette, StartError, ValidationError,
};

use super::jobs::JobResponse;
use super::middleware::UploadOwner;
use crate::state::AppState;

/// Maximum allowed limit for artwork queries
const MAX_LIMIT: i64 = 1000;

/// Default limit for artwork queries
const DEFAULT_LIMIT: i64 = 100;

/// Query parameters for listing artworks
#[derive(Debug, Deserialize)]
pub struct ListArtworksParams {
    /// Filter by status ("pending", "processing", "completed", "failed")
    pub status: Option<String>,
    /// Filter by owner
    pub owner: Option<String>,
    /// Maximum number of artworks to return
    pub limit: Option<i64>,
    /// Pagination offset
    pub offset: Option<i64>,
}

/// Response for artwork operations
#[derive(Debug, Serialize)]
pub struct ArtworkResponse {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    pub status: ArtworkStatus,
    pub palettes: Vec<Palette>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub medium_suggestion: Option<MediumSuggestion>,
    /// True once a rendered template is available for download.
    pub has_template: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Artwork> for ArtworkResponse {
    fn from(artwork: Artwork) -> Self {
        Self {
            id: artwork.id,
            owner: artwork.owner,
            status: artwork.status,
            palettes: artwork.palettes,
            medium_suggestion: artwork.medium_suggestion,
            has_template: artwork.processed_image.is_some(),
            created_at: artwork.created_at.to_rfc3339(),
            updated_at: artwork.updated_at.to_rfc3339(),
        }
    }
}

/// Response for listing artworks
#[derive(Debug, Serialize)]
pub struct ListArtworksResponse {
    pub artworks: Vec<ArtworkResponse>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ArtworkErrorResponse {
    pub error: String,
}

fn error_response(status: StatusCode, error: impl Into<String>) -> (StatusCode, Json<ArtworkErrorResponse>) {
    (
        status,
        Json(ArtworkErrorResponse {
            error: error.into(),
        }),
    )
}

fn validation_error(e: ValidationError) -> (StatusCode, Json<ArtworkErrorResponse>) {
    let status = match e {
        ValidationError::EmptyUpload | ValidationError::InvalidImage(_) => StatusCode::BAD_REQUEST,
        ValidationError::TooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
        ValidationError::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
        ValidationError::Storage(_) | ValidationError::Store(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    error_response(status, e.to_string())
}

/// Upload an image and create a pending artwork.
///
/// Expects a multipart body with an `image` field; the field's declared
/// content type is validated against the actual bytes.
pub async fn upload_artwork(
    State(state): State<Arc<AppState>>,
    UploadOwner(owner): UploadOwner,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<ArtworkResponse>), (StatusCode, Json<ArtworkErrorResponse>)> {
    let mut upload: Option<(Vec<u8>, String)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| error_response(StatusCode::BAD_REQUEST, e.to_string()))?
    {
        if field.name() == Some("image") {
            let content_type = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| error_response(StatusCode::BAD_REQUEST, e.to_string()))?;
            upload = Some((bytes.to_vec(), content_type));
            break;
        }
    }

    let (bytes, content_type) = upload.ok_or_else(|| {
        error_response(
            StatusCode::BAD_REQUEST,
            "multipart field 'image' is required",
        )
    })?;

    match state.ingest().ingest(&bytes, &content_type, owner).await {
        Ok(artwork) => Ok((StatusCode::CREATED, Json(ArtworkResponse::from(artwork)))),
        Err(e) => Err(validation_error(e)),
    }
}

/// Get an artwork by ID
pub async fn get_artwork(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ArtworkResponse>, (StatusCode, Json<ArtworkErrorResponse>)> {
    match state.artwork_store().get(&id) {
        Ok(Some(artwork)) => Ok(Json(ArtworkResponse::from(artwork))),
        Ok(None) => Err(error_response(
            StatusCode::NOT_FOUND,
            format!("Artwork not found: {}", id),
        )),
        Err(e) => Err(error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            e.to_string(),
        )),
    }
}

/// List artworks with optional filters
pub async fn list_artworks(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListArtworksParams>,
) -> Result<Json<ListArtworksResponse>, (StatusCode, Json<ArtworkErrorResponse>)> {
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let offset = params.offset.unwrap_or(0).max(0);

    let mut filter = ArtworkFilter::new().with_limit(limit).with_offset(offset);

    if let Some(ref status) = params.status {
        filter = filter.with_status(status);
    }

    if let Some(ref owner) = params.owner {
        filter = filter.with_owner(owner);
    }

    let artworks = state.artwork_store().list(&filter).map_err(|e| {
        error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    })?;

    // Total count without pagination
    let count_filter = ArtworkFilter {
        limit: i64::MAX,
        offset: 0,
        ..filter
    };
    let total = state.artwork_store().count(&count_filter).map_err(|e| {
        error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    })?;

    Ok(Json(ListArtworksResponse {
        artworks: artworks.into_iter().map(ArtworkResponse::from).collect(),
        total,
        limit,
        offset,
    }))
}

/// Download the rendered template PNG for a completed artwork.
pub async fn get_template(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, Json<ArtworkErrorResponse>)> {
    let artwork = match state.artwork_store().get(&id) {
        Ok(Some(artwork)) => artwork,
        Ok(None) => {
            return Err(error_response(
                StatusCode::NOT_FOUND,
                format!("Artwork not found: {}", id),
            ));
        }
        Err(e) => {
            return Err(error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                e.to_string(),
            ));
        }
    };

    let key = match artwork.processed_image {
        Some(key) if artwork.status == ArtworkStatus::Completed => key,
        _ => {
            return Err(error_response(
                StatusCode::NOT_FOUND,
                format!("Artwork {} has no template yet", id),
            ));
        }
    };

    let bytes = state.blob_store().get(&key).await.map_err(|e| {
        error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    })?;

    Ok(([(header::CONTENT_TYPE, "image/png")], bytes))
}

/// Start a processing job for an artwork. Returns 202 with the queued job.
pub async fn process_artwork(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<(StatusCode, Json<JobResponse>), (StatusCode, Json<ArtworkErrorResponse>)> {
    match state.orchestrator().start(&id).await {
        Ok(job) => Ok((StatusCode::ACCEPTED, Json(JobResponse::from(job)))),
        Err(e @ StartError::ArtworkNotFound(_)) => {
            Err(error_response(StatusCode::NOT_FOUND, e.to_string()))
        }
        Err(e @ (StartError::AlreadyCompleted(_) | StartError::AlreadyProcessing { .. })) => {
            Err(error_response(StatusCode::CONFLICT, e.to_string()))
        }
        Err(e @ StartError::CapacityExhausted) => {
            Err(error_response(StatusCode::SERVICE_UNAVAILABLE, e.to_string()))
        }
        Err(e) => Err(error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            e.to_string(),
        )),
    }
}
