//! Processing job types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Decode,
    Quantize,
    Template,
    Rank,
}

impl PipelineStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineStage::Decode => "decode",
            PipelineStage::Quantize => "quantize",
            PipelineStage::Template => "template",
            PipelineStage::Rank => "rank",
        }
    }
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Job lifecycle state.
///
/// Serialized as a tagged JSON object so the store can filter on
/// `$.type` without deserializing the whole state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum JobState {
    Queued,
    Running {
        stage: PipelineStage,
        started_at: DateTime<Utc>,
    },
    Completed {
        completed_at: DateTime<Utc>,
    },
    Failed {
        error: String,
        failed_at: DateTime<Utc>,
    },
    Cancelled {
        cancelled_at: DateTime<Utc>,
    },
}

impl JobState {
    pub fn state_type(&self) -> &'static str {
        match self {
            JobState::Queued => "queued",
            JobState::Running { .. } => "running",
            JobState::Completed { .. } => "completed",
            JobState::Failed { .. } => "failed",
            JobState::Cancelled { .. } => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobState::Completed { .. } | JobState::Failed { .. } | JobState::Cancelled { .. }
        )
    }

    /// Active jobs block new jobs for the same artwork.
    pub fn is_active(&self) -> bool {
        !self.is_terminal()
    }
}

/// A processing job for one artwork.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: String,
    pub artwork_id: String,
    pub state: JobState,
    /// Coarse completion percentage, 0 to 100, never decreasing.
    pub progress: u8,
    /// 1-based attempt counter, bumped on retry.
    pub attempt: u32,
    /// Last error message, kept across retries for observability.
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_serialization_tags() {
        let state = JobState::Queued;
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["type"], "queued");

        let state = JobState::Running {
            stage: PipelineStage::Quantize,
            started_at: Utc::now(),
        };
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["type"], "running");
        assert_eq!(json["stage"], "quantize");
    }

    #[test]
    fn test_terminal_states() {
        assert!(!JobState::Queued.is_terminal());
        assert!(!JobState::Running {
            stage: PipelineStage::Decode,
            started_at: Utc::now(),
        }
        .is_terminal());
        assert!(JobState::Completed {
            completed_at: Utc::now()
        }
        .is_terminal());
        assert!(JobState::Failed {
            error: "decode failed".to_string(),
            failed_at: Utc::now(),
        }
        .is_terminal());
        assert!(JobState::Cancelled {
            cancelled_at: Utc::now()
        }
        .is_terminal());
    }

    #[test]
    fn test_state_roundtrip() {
        let state = JobState::Failed {
            error: "image too large".to_string(),
            failed_at: Utc::now(),
        };
        let json = serde_json::to_string(&state).unwrap();
        let back: JobState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, state);
    }
}
