//! Job store trait and filters.

use thiserror::Error;

use super::types::{Job, JobState};

#[derive(Debug, Error)]
pub enum JobError {
    #[error("Job not found: {0}")]
    NotFound(String),

    #[error("Artwork {artwork_id} already has an active job: {job_id}")]
    AlreadyProcessing { artwork_id: String, job_id: String },

    #[error("Database error: {0}")]
    Database(String),
}

/// Filter for job list queries.
#[derive(Debug, Clone, Default)]
pub struct JobFilter {
    /// Match on the state tag ("queued", "running", ...).
    pub state_type: Option<String>,
    pub artwork_id: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl JobFilter {
    pub fn with_state_type(mut self, state_type: impl Into<String>) -> Self {
        self.state_type = Some(state_type.into());
        self
    }

    pub fn with_artwork_id(mut self, artwork_id: impl Into<String>) -> Self {
        self.artwork_id = Some(artwork_id.into());
        self
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_offset(mut self, offset: u32) -> Self {
        self.offset = Some(offset);
        self
    }
}

/// Trait for job storage backends.
pub trait JobStore: Send + Sync {
    /// Create a queued job for an artwork.
    ///
    /// Atomic with respect to the active-job check: at most one non-terminal
    /// job may exist per artwork, others get `AlreadyProcessing`.
    fn create_for_artwork(&self, artwork_id: &str) -> Result<Job, JobError>;

    fn get(&self, id: &str) -> Result<Job, JobError>;

    fn list(&self, filter: &JobFilter) -> Result<Vec<Job>, JobError>;

    fn count(&self, filter: &JobFilter) -> Result<u64, JobError>;

    /// The artwork's non-terminal job, if any.
    fn active_for_artwork(&self, artwork_id: &str) -> Result<Option<Job>, JobError>;

    fn update_state(&self, id: &str, state: &JobState) -> Result<Job, JobError>;

    /// Raise progress to the given value. Lower values are ignored, so
    /// progress never moves backwards.
    fn set_progress(&self, id: &str, progress: u8) -> Result<Job, JobError>;

    fn set_attempt(&self, id: &str, attempt: u32) -> Result<Job, JobError>;
}
