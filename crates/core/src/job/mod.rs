//! Processing jobs: state machine and persistence.

mod sqlite_store;
mod store;
mod types;

pub use sqlite_store::SqliteJobStore;
pub use store::{JobError, JobFilter, JobStore};
pub use types::{Job, JobState, PipelineStage};
