//! Job API handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use fotopainter_core::{CancelError, Job, JobError, JobFilter, JobState};

use crate::state::AppState;

/// Maximum allowed limit for job queries
const MAX_LIMIT: u32 = 1000;

/// Default limit for job queries
const DEFAULT_LIMIT: u32 = 100;

/// Query parameters for listing jobs
#[derive(Debug, Deserialize)]
pub struct ListJobsParams {
    /// Filter by state type ("queued", "running", ...)
    pub state: Option<String>,
    /// Filter by artwork
    pub artwork_id: Option<String>,
    /// Maximum number of jobs to return
    pub limit: Option<u32>,
    /// Pagination offset
    pub offset: Option<u32>,
}

/// Response for job operations
#[derive(Debug, Serialize)]
pub struct JobResponse {
    pub id: String,
    pub artwork_id: String,
    pub state: JobState,
    pub progress: u8,
    pub attempt: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Job> for JobResponse {
    fn from(job: Job) -> Self {
        Self {
            id: job.id,
            artwork_id: job.artwork_id,
            state: job.state,
            progress: job.progress,
            attempt: job.attempt,
            error: job.error,
            created_at: job.created_at.to_rfc3339(),
            updated_at: job.updated_at.to_rfc3339(),
        }
    }
}

/// Response for listing jobs
#[derive(Debug, Serialize)]
pub struct ListJobsResponse {
    pub jobs: Vec<JobResponse>,
    pub total: u64,
    pub limit: u32,
    pub offset: u32,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct JobErrorResponse {
    pub error: String,
}

fn error_response(status: StatusCode, error: impl Into<String>) -> (StatusCode, Json<JobErrorResponse>) {
    (
        status,
        Json(JobErrorResponse {
            error: error.into(),
        }),
    )
}

/// Get a job by ID
pub async fn get_job(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<JobResponse>, (StatusCode, Json<JobErrorResponse>)> {
    match state.job_store().get(&id) {
        Ok(job) => Ok(Json(JobResponse::from(job))),
        Err(JobError::NotFound(id)) => Err(error_response(
            StatusCode::NOT_FOUND,
            format!("Job not found: {}", id),
        )),
        Err(e) => Err(error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            e.to_string(),
        )),
    }
}

/// List jobs with optional filters
pub async fn list_jobs(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListJobsParams>,
) -> Result<Json<ListJobsResponse>, (StatusCode, Json<JobErrorResponse>)> {
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let offset = params.offset.unwrap_or(0);

    let mut filter = JobFilter::default().with_limit(limit).with_offset(offset);

    if let Some(ref state_filter) = params.state {
        filter = filter.with_state_type(state_filter);
    }

    if let Some(ref artwork_id) = params.artwork_id {
        filter = filter.with_artwork_id(artwork_id);
    }

    let jobs = state.job_store().list(&filter).map_err(|e| {
        error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    })?;

    // Total count without pagination
    let count_filter = JobFilter {
        limit: None,
        offset: None,
        ..filter
    };
    let total = state.job_store().count(&count_filter).map_err(|e| {
        error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    })?;

    Ok(Json(ListJobsResponse {
        jobs: jobs.into_iter().map(JobResponse::from).collect(),
        total,
        limit,
        offset,
    }))
}

/// Request cancellation of a running job.
///
/// Cancellation is cooperative: the response carries the job as it was when
/// the request was accepted, not yet in its terminal state.
pub async fn cancel_job(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<(StatusCode, Json<JobResponse>), (StatusCode, Json<JobErrorResponse>)> {
    match state.orchestrator().cancel(&id) {
        Ok(job) => Ok((StatusCode::ACCEPTED, Json(JobResponse::from(job)))),
        Err(e @ CancelError::NotFound(_)) => {
            Err(error_response(StatusCode::NOT_FOUND, e.to_string()))
        }
        Err(e @ CancelError::NotCancellable { .. }) => {
            Err(error_response(StatusCode::CONFLICT, e.to_string()))
        }
        Err(e) => Err(error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            e.to_string(),
        )),
    }
}
