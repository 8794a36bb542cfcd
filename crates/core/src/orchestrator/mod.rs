//! Job orchestration: bounded worker pool driving the processing pipeline.

mod config;
mod runner;

pub use config::OrchestratorConfig;

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use thiserror::Error;
use tokio::sync::Semaphore;

use crate::artwork::{ArtworkError, ArtworkStatus, ArtworkStore};
use crate::audit::{AuditEvent, AuditHandle};
use crate::blobstore::BlobStore;
use crate::config::{DifficultyConfig, PipelineConfig};
use crate::job::{Job, JobError, JobState, JobStore};
use crate::metrics;

#[derive(Debug, Error)]
pub enum StartError {
    #[error("Artwork not found: {0}")]
    ArtworkNotFound(String),

    #[error("Artwork {0} is already completed")]
    AlreadyCompleted(String),

    #[error("Artwork {artwork_id} already has an active job: {job_id}")]
    AlreadyProcessing { artwork_id: String, job_id: String },

    #[error("Worker pool is full, try again later")]
    CapacityExhausted,

    #[error(transparent)]
    Job(JobError),

    #[error(transparent)]
    Artwork(#[from] ArtworkError),
}

#[derive(Debug, Error)]
pub enum CancelError {
    #[error("Job not found: {0}")]
    NotFound(String),

    #[error("Job {job_id} is already {state}")]
    NotCancellable { job_id: String, state: String },

    #[error(transparent)]
    Job(#[from] JobError),
}

/// Worker pool counters, shared with the API for status reporting.
#[derive(Default)]
pub struct PoolStats {
    active: AtomicU64,
    total_processed: AtomicU64,
}

impl PoolStats {
    fn job_started(&self) {
        self.active.fetch_add(1, Ordering::Relaxed);
    }

    fn job_finished(&self) {
        self.active.fetch_sub(1, Ordering::Relaxed);
        self.total_processed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn active(&self) -> u64 {
        self.active.load(Ordering::Relaxed)
    }

    pub fn total_processed(&self) -> u64 {
        self.total_processed.load(Ordering::Relaxed)
    }
}

/// Shared state handed to each worker task.
#[derive(Clone)]
pub(crate) struct WorkerContext {
    pub jobs: Arc<dyn JobStore>,
    pub artworks: Arc<dyn ArtworkStore>,
    pub blobs: Arc<dyn BlobStore>,
    pub pipeline: PipelineConfig,
    pub difficulty: DifficultyConfig,
    pub config: OrchestratorConfig,
    pub audit: Option<AuditHandle>,
    pub stats: Arc<PoolStats>,
    cancel_flags: Arc<RwLock<HashMap<String, Arc<AtomicBool>>>>,
}

impl WorkerContext {
    fn remove_cancel_flag(&self, job_id: &str) {
        self.cancel_flags.write().unwrap().remove(job_id);
    }

    /// Update a job's state and audit the transition.
    async fn transition_job(
        &self,
        job_id: &str,
        artwork_id: &str,
        state: JobState,
        reason: Option<String>,
    ) {
        let from_state = match self.jobs.get(job_id) {
            Ok(job) => job.state.state_type().to_string(),
            Err(e) => {
                tracing::error!(job_id = %job_id, "Failed to read job state: {}", e);
                return;
            }
        };
        let to_state = state.state_type().to_string();

        if let Err(e) = self.jobs.update_state(job_id, &state) {
            tracing::error!(job_id = %job_id, "Failed to update job state: {}", e);
            return;
        }

        // Stage moves within Running are progress detail, not transitions.
        if from_state == to_state {
            return;
        }

        if let Some(ref audit) = self.audit {
            audit
                .emit(AuditEvent::JobStateChanged {
                    job_id: job_id.to_string(),
                    artwork_id: artwork_id.to_string(),
                    from_state,
                    to_state,
                    reason,
                })
                .await;
        }
    }
}

/// Orchestrates processing jobs over a bounded worker pool.
///
/// Backpressure is rejection: when all workers are busy, `start` returns
/// `CapacityExhausted` instead of queueing.
pub struct JobOrchestrator {
    jobs: Arc<dyn JobStore>,
    artworks: Arc<dyn ArtworkStore>,
    blobs: Arc<dyn BlobStore>,
    pipeline: PipelineConfig,
    difficulty: DifficultyConfig,
    config: OrchestratorConfig,
    audit: Option<AuditHandle>,
    semaphore: Arc<Semaphore>,
    stats: Arc<PoolStats>,
    cancel_flags: Arc<RwLock<HashMap<String, Arc<AtomicBool>>>>,
}

impl JobOrchestrator {
    pub fn new(
        jobs: Arc<dyn JobStore>,
        artworks: Arc<dyn ArtworkStore>,
        blobs: Arc<dyn BlobStore>,
        pipeline: PipelineConfig,
        difficulty: DifficultyConfig,
        config: OrchestratorConfig,
    ) -> Self {
        let semaphore = Arc::new(Semaphore::new(config.max_concurrent_jobs));
        Self {
            jobs,
            artworks,
            blobs,
            pipeline,
            difficulty,
            config,
            audit: None,
            semaphore,
            stats: Arc::new(PoolStats::default()),
            cancel_flags: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn with_audit(mut self, audit: AuditHandle) -> Self {
        self.audit = Some(audit);
        self
    }

    /// Start a processing job for an artwork.
    pub async fn start(&self, artwork_id: &str) -> Result<Job, StartError> {
        let artwork = self
            .artworks
            .get(artwork_id)?
            .ok_or_else(|| StartError::ArtworkNotFound(artwork_id.to_string()))?;

        if artwork.status == ArtworkStatus::Completed {
            return Err(StartError::AlreadyCompleted(artwork_id.to_string()));
        }

        let permit = match Arc::clone(&self.semaphore).try_acquire_owned() {
            Ok(permit) => permit,
            Err(_) => {
                metrics::JOBS_REJECTED_AT_CAPACITY.inc();
                return Err(StartError::CapacityExhausted);
            }
        };

        let job = self.jobs.create_for_artwork(artwork_id).map_err(|e| match e {
            JobError::AlreadyProcessing { artwork_id, job_id } => {
                StartError::AlreadyProcessing { artwork_id, job_id }
            }
            other => StartError::Job(other),
        })?;

        let cancel = Arc::new(AtomicBool::new(false));
        self.cancel_flags
            .write()
            .unwrap()
            .insert(job.id.clone(), Arc::clone(&cancel));

        metrics::JOBS_STARTED.inc();
        tracing::info!(job_id = %job.id, artwork_id = %artwork_id, "Job started");

        let ctx = WorkerContext {
            jobs: Arc::clone(&self.jobs),
            artworks: Arc::clone(&self.artworks),
            blobs: Arc::clone(&self.blobs),
            pipeline: self.pipeline.clone(),
            difficulty: self.difficulty.clone(),
            config: self.config.clone(),
            audit: self.audit.clone(),
            stats: Arc::clone(&self.stats),
            cancel_flags: Arc::clone(&self.cancel_flags),
        };

        tokio::spawn(runner::run_job(
            ctx,
            job.clone(),
            artwork,
            cancel,
            permit,
        ));

        Ok(job)
    }

    /// Request cooperative cancellation of a job.
    ///
    /// The worker observes the flag at the next stage boundary, marks the
    /// job `Cancelled` and returns the artwork to `Pending`.
    pub fn cancel(&self, job_id: &str) -> Result<Job, CancelError> {
        let job = match self.jobs.get(job_id) {
            Ok(job) => job,
            Err(JobError::NotFound(id)) => return Err(CancelError::NotFound(id)),
            Err(e) => return Err(e.into()),
        };

        if job.state.is_terminal() {
            return Err(CancelError::NotCancellable {
                job_id: job_id.to_string(),
                state: job.state.state_type().to_string(),
            });
        }

        if let Some(flag) = self.cancel_flags.read().unwrap().get(job_id) {
            flag.store(true, Ordering::Relaxed);
        }

        tracing::info!(job_id = %job_id, "Cancellation requested");
        Ok(job)
    }

    /// Non-blocking snapshot of a job.
    pub fn status(&self, job_id: &str) -> Result<Job, JobError> {
        self.jobs.get(job_id)
    }

    pub fn stats(&self) -> &PoolStats {
        &self.stats
    }
}
