//! Error types for the service module.

use thiserror::Error;

use crate::job::{JobError, JobStatus, TaskId, TaskStatus};

/// Errors returned to callers of [`super::JobService`].
///
/// Validation errors are returned before anything is mutated.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// No job with this id.
    #[error("Job not found: {job_id}")]
    JobNotFound { job_id: String },

    /// The job has no task with this id.
    #[error("Task {task_id} not found in job {job_id}")]
    TaskNotFound { job_id: String, task_id: TaskId },

    /// The job is still running; its archive does not exist yet.
    #[error("Job {job_id} is not finished (status: {status})")]
    NotReady { job_id: String, status: JobStatus },

    /// The task is still waiting or running.
    #[error("Task {task_id} is not finished (status: {status})")]
    TaskNotReady { task_id: TaskId, status: TaskStatus },

    /// The job or task finished without a downloadable artifact.
    #[error("No artifact available: {reason}")]
    ArtifactUnavailable { reason: String },

    /// The requested role does not exist.
    #[error("Unknown role: {role}")]
    InvalidRole { role: String },

    /// None of the uploaded files has an accepted extension.
    #[error("No accepted files; allowed extensions: {allowed}")]
    NoAcceptedFiles { allowed: String },

    /// Proofreading cannot run at all (e.g. missing API key).
    #[error("Service unavailable: {reason}")]
    Unavailable { reason: String },

    /// Uploads or job files could not be written or removed.
    #[error("Storage error: {reason}")]
    Storage { reason: String },

    /// Registry failure.
    #[error(transparent)]
    Job(#[from] JobError),
}

impl ServiceError {
    pub fn job_not_found(job_id: impl Into<String>) -> Self {
        Self::JobNotFound {
            job_id: job_id.into(),
        }
    }

    pub fn storage(reason: impl ToString) -> Self {
        Self::Storage {
            reason: reason.to_string(),
        }
    }

    /// Whether the error is caused by the request rather than the service.
    pub fn is_client_error(&self) -> bool {
        !matches!(
            self,
            Self::Unavailable { .. } | Self::Storage { .. } | Self::Job(_)
        )
    }
}
