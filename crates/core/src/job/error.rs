//! Error types for the job module.

use thiserror::Error;

use super::types::TaskId;

/// Errors raised by the job registry and the job/task state machines.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JobError {
    /// Job does not exist (never created, or already cleaned up).
    #[error("Job not found: {job_id}")]
    NotFound { job_id: String },

    /// Task id is not part of the job.
    #[error("Task {task_id} not found in job {job_id}")]
    TaskNotFound { job_id: String, task_id: TaskId },

    /// State machine refused the transition.
    #[error("Invalid state transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    /// Could not allocate an unused job id.
    #[error("Failed to allocate a unique job id after {attempts} attempts")]
    IdExhausted { attempts: u32 },
}

impl JobError {
    /// Creates a not found error.
    pub fn not_found(job_id: impl Into<String>) -> Self {
        Self::NotFound {
            job_id: job_id.into(),
        }
    }

    /// Creates an invalid transition error.
    pub fn invalid_transition(from: impl ToString, to: impl ToString) -> Self {
        Self::InvalidTransition {
            from: from.to_string(),
            to: to.to_string(),
        }
    }

    /// Whether the job has been removed from the registry.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
