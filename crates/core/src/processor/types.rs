//! Types for the processor module.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::job::{JobStatus, TaskId};

/// A stored upload handed to the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskInput {
    /// Task the file belongs to.
    pub task_id: TaskId,
    /// Original (sanitized) file name.
    pub name: String,
    /// Where the upload was persisted.
    pub path: PathBuf,
}

/// How a pipeline run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineOutcome {
    /// The job reached a terminal status.
    Finished(JobStatus),
    /// The job was removed while running; nothing more was written.
    Aborted,
}

/// Dispatcher counters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatcherStatus {
    /// Whether new jobs are accepted.
    pub running: bool,
    /// Jobs currently being processed.
    pub active_jobs: usize,
    /// Jobs waiting for a processing slot.
    pub queued_jobs: usize,
    /// Maximum jobs processed at the same time.
    pub max_concurrent: usize,
    /// Jobs finished `complete` since startup.
    pub total_completed: u64,
    /// Jobs finished `failed` since startup.
    pub total_failed: u64,
    /// Jobs removed while in flight since startup.
    pub total_aborted: u64,
}
