//! Job model and the process-wide job registry.
//!
//! A job is one submitted batch of documents. Each document becomes a task
//! with its own state machine; the job status is derived from its tasks
//! once every task has reached a terminal state.

mod error;
mod registry;
mod types;

pub use error::JobError;
pub use registry::{InMemoryJobRegistry, JobRegistry, MAX_ID_ATTEMPTS};
pub use types::{ArtifactRef, JobId, JobRecord, JobStatus, TaskId, TaskState, TaskStatus};
