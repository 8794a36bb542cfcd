//! Orchestrator configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OrchestratorConfig {
    /// Worker pool size. Starts beyond this are rejected, not queued.
    #[serde(default = "default_max_concurrent_jobs")]
    pub max_concurrent_jobs: usize,
    /// Total attempts per job, including the first.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_retry_initial_delay_ms")]
    pub retry_initial_delay_ms: u64,
    #[serde(default = "default_retry_max_delay_ms")]
    pub retry_max_delay_ms: u64,
    /// Audit channel buffer size.
    #[serde(default = "default_audit_buffer_size")]
    pub audit_buffer_size: usize,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_concurrent_jobs: default_max_concurrent_jobs(),
            max_attempts: default_max_attempts(),
            retry_initial_delay_ms: default_retry_initial_delay_ms(),
            retry_max_delay_ms: default_retry_max_delay_ms(),
            audit_buffer_size: default_audit_buffer_size(),
        }
    }
}

fn default_max_concurrent_jobs() -> usize {
    4
}

fn default_max_attempts() -> u32 {
    3
}

fn default_retry_initial_delay_ms() -> u64 {
    500
}

fn default_retry_max_delay_ms() -> u64 {
    30_000
}

fn default_audit_buffer_size() -> usize {
    1000
}

impl OrchestratorConfig {
    /// Exponential backoff before the given attempt (2-based), capped at the
    /// configured maximum.
    pub fn retry_delay(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(2).min(20);
        let delay_ms = self
            .retry_initial_delay_ms
            .saturating_mul(1u64 << exp)
            .min(self.retry_max_delay_ms);
        Duration::from_millis(delay_ms)
    }
}
