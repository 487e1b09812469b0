//! Job and task types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use super::error::JobError;

/// External handle of a job (UUID v4 string).
pub type JobId = String;

/// Task id, unique within a job, assigned in upload order starting at 1.
pub type TaskId = u32;

/// Status of a single file within a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Queued,
    Processing,
    Complete,
    Error,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Queued => "queued",
            TaskStatus::Processing => "processing",
            TaskStatus::Complete => "complete",
            TaskStatus::Error => "error",
        }
    }

    /// Terminal states never transition again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Complete | TaskStatus::Error)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Aggregate status of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Queued,
    Processing,
    Complete,
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Processing => "processing",
            JobStatus::Complete => "complete",
            JobStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Complete | JobStatus::Failed)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reference to a file produced by processing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactRef {
    /// File name as presented to clients (and inside the archive).
    pub file_name: String,
    /// Location on disk.
    pub path: PathBuf,
    /// Size in bytes.
    pub size_bytes: u64,
    /// Hex-encoded SHA-256 of the file contents, when computed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,
}

/// State of one uploaded file.
///
/// Transitions: `queued -> processing -> {complete, error}`.
/// The artifact is present iff the task is complete, the error message
/// iff the task is in error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskState {
    id: TaskId,
    name: String,
    status: TaskStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    artifact: Option<ArtifactRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    char_count: Option<usize>,
}

impl TaskState {
    /// Creates a queued task.
    pub fn new(id: TaskId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            status: TaskStatus::Queued,
            artifact: None,
            error: None,
            char_count: None,
        }
    }

    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn status(&self) -> TaskStatus {
        self.status
    }

    pub fn artifact(&self) -> Option<&ArtifactRef> {
        self.artifact.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Number of characters extracted from the document, once known.
    pub fn char_count(&self) -> Option<usize> {
        self.char_count
    }

    /// `queued -> processing`
    pub fn start(&mut self) -> Result<(), JobError> {
        self.transition(TaskStatus::Queued, TaskStatus::Processing)
    }

    /// `processing -> complete`, attaching the produced artifact.
    pub fn complete(&mut self, artifact: ArtifactRef) -> Result<(), JobError> {
        self.transition(TaskStatus::Processing, TaskStatus::Complete)?;
        self.artifact = Some(artifact);
        Ok(())
    }

    /// `processing -> error`, recording the diagnostic.
    pub fn fail(&mut self, error: impl Into<String>) -> Result<(), JobError> {
        self.transition(TaskStatus::Processing, TaskStatus::Error)?;
        self.error = Some(error.into());
        Ok(())
    }

    /// Records the extracted character count while processing.
    pub fn record_char_count(&mut self, count: usize) -> Result<(), JobError> {
        if self.status != TaskStatus::Processing {
            return Err(JobError::invalid_transition(self.status, self.status));
        }
        self.char_count = Some(count);
        Ok(())
    }

    fn transition(&mut self, from: TaskStatus, to: TaskStatus) -> Result<(), JobError> {
        if self.status != from {
            return Err(JobError::invalid_transition(self.status, to));
        }
        self.status = to;
        Ok(())
    }
}

/// A submitted batch and the state of each of its files.
///
/// Transitions: `queued -> processing -> {complete, failed}` plus
/// `queued -> failed` when the job could not be scheduled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    id: JobId,
    status: JobStatus,
    tasks: Vec<TaskState>,
    role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    archive: Option<ArtifactRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    last_error: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl JobRecord {
    /// Creates a queued job with one queued task per name, in order.
    pub fn new(id: impl Into<JobId>, task_names: Vec<String>, role: impl Into<String>) -> Self {
        let now = Utc::now();
        let tasks = task_names
            .into_iter()
            .enumerate()
            .map(|(i, name)| TaskState::new(i as TaskId + 1, name))
            .collect();

        Self {
            id: id.into(),
            status: JobStatus::Queued,
            tasks,
            role: role.into(),
            archive: None,
            last_error: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn status(&self) -> JobStatus {
        self.status
    }

    pub fn tasks(&self) -> &[TaskState] {
        &self.tasks
    }

    pub fn task(&self, task_id: TaskId) -> Option<&TaskState> {
        self.tasks.iter().find(|t| t.id == task_id)
    }

    pub(crate) fn task_mut(&mut self, task_id: TaskId) -> Option<&mut TaskState> {
        self.tasks.iter_mut().find(|t| t.id == task_id)
    }

    pub fn role(&self) -> &str {
        &self.role
    }

    pub fn archive(&self) -> Option<&ArtifactRef> {
        self.archive.as_ref()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Number of tasks in the given status.
    pub fn count(&self, status: TaskStatus) -> usize {
        self.tasks.iter().filter(|t| t.status == status).count()
    }

    pub fn all_tasks_terminal(&self) -> bool {
        self.tasks.iter().all(|t| t.status.is_terminal())
    }

    /// `queued -> processing`
    pub fn start(&mut self) -> Result<(), JobError> {
        if self.status != JobStatus::Queued {
            return Err(JobError::invalid_transition(
                self.status,
                JobStatus::Processing,
            ));
        }
        self.status = JobStatus::Processing;
        Ok(())
    }

    /// Moves a processing job to its final status once all tasks are terminal.
    ///
    /// The job ends `failed` if any task is in error, `complete` otherwise.
    pub fn finish(&mut self, archive: ArtifactRef) -> Result<JobStatus, JobError> {
        let target = if self.count(TaskStatus::Error) > 0 {
            JobStatus::Failed
        } else {
            JobStatus::Complete
        };

        if self.status != JobStatus::Processing || !self.all_tasks_terminal() {
            return Err(JobError::invalid_transition(self.status, target));
        }

        self.status = target;
        self.archive = Some(archive);
        Ok(target)
    }

    /// Fails a non-terminal job without an archive (scheduling or packaging failure).
    pub fn fail(&mut self, error: impl Into<String>) -> Result<(), JobError> {
        if self.status.is_terminal() {
            return Err(JobError::invalid_transition(self.status, JobStatus::Failed));
        }
        self.status = JobStatus::Failed;
        self.last_error = Some(error.into());
        Ok(())
    }

    /// Records the latest diagnostic without changing status.
    pub fn record_error(&mut self, error: impl Into<String>) {
        self.last_error = Some(error.into());
    }

    pub(crate) fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn artifact(name: &str) -> ArtifactRef {
        ArtifactRef {
            file_name: name.to_string(),
            path: PathBuf::from("/tmp").join(name),
            size_bytes: 10,
            sha256: None,
        }
    }

    #[test]
    fn test_new_job_has_queued_tasks_in_order() {
        let job = JobRecord::new(
            "job-1",
            vec!["a.docx".into(), "b.docx".into(), "c.docx".into()],
            "academic",
        );

        assert_eq!(job.status(), JobStatus::Queued);
        assert_eq!(job.tasks().len(), 3);
        let ids: Vec<_> = job.tasks().iter().map(|t| t.id()).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(job.tasks()[1].name(), "b.docx");
        assert!(job
            .tasks()
            .iter()
            .all(|t| t.status() == TaskStatus::Queued));
    }

    #[test]
    fn test_task_happy_path() {
        let mut task = TaskState::new(1, "a.docx");
        task.start().unwrap();
        task.record_char_count(42).unwrap();
        task.complete(artifact("01-a_PROOFREAD.docx")).unwrap();

        assert_eq!(task.status(), TaskStatus::Complete);
        assert_eq!(task.char_count(), Some(42));
        assert!(task.artifact().is_some());
        assert!(task.error().is_none());
    }

    #[test]
    fn test_task_failure_has_no_artifact() {
        let mut task = TaskState::new(1, "a.docx");
        task.start().unwrap();
        task.fail("boom").unwrap();

        assert_eq!(task.status(), TaskStatus::Error);
        assert_eq!(task.error(), Some("boom"));
        assert!(task.artifact().is_none());
    }

    #[test]
    fn test_task_cannot_skip_processing() {
        let mut task = TaskState::new(1, "a.docx");
        assert!(task.complete(artifact("x")).is_err());
        assert!(task.fail("x").is_err());
        assert_eq!(task.status(), TaskStatus::Queued);
    }

    #[test]
    fn test_terminal_task_never_transitions() {
        let mut task = TaskState::new(1, "a.docx");
        task.start().unwrap();
        task.complete(artifact("x")).unwrap();

        assert!(task.start().is_err());
        assert!(task.fail("late").is_err());
        assert!(task.complete(artifact("y")).is_err());
        assert_eq!(task.status(), TaskStatus::Complete);
        assert_eq!(task.artifact().unwrap().file_name, "x");
    }

    #[test]
    fn test_job_finish_complete_when_all_tasks_complete() {
        let mut job = JobRecord::new("j", vec!["a.docx".into()], "legal");
        job.start().unwrap();
        let task = job.task_mut(1).unwrap();
        task.start().unwrap();
        task.complete(artifact("a")).unwrap();

        let status = job.finish(artifact("proofread_results.zip")).unwrap();
        assert_eq!(status, JobStatus::Complete);
        assert!(job.archive().is_some());
    }

    #[test]
    fn test_job_finish_failed_when_any_task_errors() {
        let mut job = JobRecord::new("j", vec!["a.docx".into(), "b.docx".into()], "legal");
        job.start().unwrap();
        for id in [1, 2] {
            job.task_mut(id).unwrap().start().unwrap();
        }
        job.task_mut(1).unwrap().complete(artifact("a")).unwrap();
        job.task_mut(2).unwrap().fail("bad").unwrap();

        let status = job.finish(artifact("proofread_results.zip")).unwrap();
        assert_eq!(status, JobStatus::Failed);
        assert!(job.archive().is_some());
    }

    #[test]
    fn test_job_finish_requires_terminal_tasks() {
        let mut job = JobRecord::new("j", vec!["a.docx".into()], "legal");
        job.start().unwrap();
        assert!(job.finish(artifact("zip")).is_err());
        assert_eq!(job.status(), JobStatus::Processing);
    }

    #[test]
    fn test_job_fail_from_queued() {
        let mut job = JobRecord::new("j", vec!["a.docx".into()], "legal");
        job.fail("Scheduling failed: no runtime").unwrap();
        assert_eq!(job.status(), JobStatus::Failed);
        assert_eq!(job.last_error(), Some("Scheduling failed: no runtime"));
        assert!(job.archive().is_none());
        assert!(job.start().is_err());
        assert!(job.fail("again").is_err());
    }

    #[test]
    fn test_status_serialization() {
        assert_eq!(
            serde_json::to_string(&TaskStatus::Processing).unwrap(),
            "\"processing\""
        );
        assert_eq!(serde_json::to_string(&JobStatus::Failed).unwrap(), "\"failed\"");
        assert_eq!(JobStatus::Complete.to_string(), "complete");
    }
}
