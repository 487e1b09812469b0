//! Job removal.

use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::job::JobRegistry;
use crate::metrics;

use super::error::CleanupError;
use super::layout::JobWorkspace;

const REMOVE_ATTEMPTS: u32 = 3;
const REMOVE_RETRY_DELAY: Duration = Duration::from_millis(50);

/// Removes a job from the registry and deletes its files.
///
/// The registry entry goes first. A pipeline still running for the job sees
/// it as missing from then on and stops before writing anything else.
pub struct JobCleaner {
    registry: Arc<dyn JobRegistry>,
    work_dir: PathBuf,
}

impl JobCleaner {
    pub fn new(registry: Arc<dyn JobRegistry>, work_dir: impl Into<PathBuf>) -> Self {
        Self {
            registry,
            work_dir: work_dir.into(),
        }
    }

    /// Returns whether the job existed. Calling it again is harmless.
    ///
    /// Files are only touched for a job the registry knew about, so an
    /// arbitrary id never deletes a directory under `work_dir`.
    pub async fn cleanup(&self, job_id: &str) -> Result<bool, CleanupError> {
        if !self.registry.remove(job_id) {
            debug!(job_id = %job_id, "No such job, nothing to remove");
            return Ok(false);
        }

        metrics::JOBS_CLEANED_UP.inc();
        info!(job_id = %job_id, "Job removed");

        self.remove_files(job_id).await?;
        Ok(true)
    }

    /// Deletes the job's directory without consulting the registry.
    ///
    /// Only for callers that created the job themselves and know the
    /// directory is theirs, e.g. a submission rolled back after the job was
    /// removed concurrently.
    pub async fn remove_files(&self, job_id: &str) -> Result<(), CleanupError> {
        let Some(workspace) = JobWorkspace::new(&self.work_dir, job_id) else {
            debug!(job_id = %job_id, "Not a valid job directory name, skipping file removal");
            return Ok(());
        };

        remove_dir(workspace).await
    }
}

/// Deletes the workspace directory. A missing directory counts as removed.
///
/// A file written concurrently by a pipeline that has not yet noticed the
/// removal can make a single attempt fail, so removal is retried.
async fn remove_dir(workspace: JobWorkspace) -> Result<(), CleanupError> {
    let dir = workspace.dir().to_path_buf();
    let mut attempt = 1;

    loop {
        match tokio::fs::remove_dir_all(&dir).await {
            Ok(()) => {
                debug!(dir = %dir.display(), "Removed job directory");
                return Ok(());
            }
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
            Err(e) if attempt < REMOVE_ATTEMPTS => {
                warn!(
                    dir = %dir.display(),
                    attempt,
                    error = %e,
                    "Failed to remove job directory, retrying"
                );
                attempt += 1;
                tokio::time::sleep(REMOVE_RETRY_DELAY).await;
            }
            Err(source) => return Err(CleanupError::Io { path: dir, source }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::InMemoryJobRegistry;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_cleanup_removes_entry_and_files() {
        let dir = TempDir::new().unwrap();
        let registry = Arc::new(InMemoryJobRegistry::new());
        let job = registry
            .create(vec!["a.docx".into()], "academic".into())
            .unwrap();
        let ws = JobWorkspace::new(dir.path(), job.id()).unwrap();
        ws.create().await.unwrap();
        std::fs::write(ws.output_path("x.docx"), b"x").unwrap();

        let cleaner = JobCleaner::new(registry.clone(), dir.path());
        assert!(cleaner.cleanup(job.id()).await.unwrap());
        assert!(registry.get(job.id()).is_none());
        assert!(!ws.dir().exists());

        assert!(!cleaner.cleanup(job.id()).await.unwrap());
    }

    #[tokio::test]
    async fn test_cleanup_without_directory() {
        let dir = TempDir::new().unwrap();
        let registry = Arc::new(InMemoryJobRegistry::new());
        let job = registry
            .create(vec!["a.docx".into()], "academic".into())
            .unwrap();

        let cleaner = JobCleaner::new(registry, dir.path());
        assert!(cleaner.cleanup(job.id()).await.unwrap());
    }

    #[tokio::test]
    async fn test_cleanup_unknown_id() {
        let dir = TempDir::new().unwrap();
        let cleaner = JobCleaner::new(Arc::new(InMemoryJobRegistry::new()), dir.path());
        assert!(!cleaner.cleanup("no-such-job").await.unwrap());
    }

    #[tokio::test]
    async fn test_cleanup_never_leaves_work_dir() {
        let dir = TempDir::new().unwrap();
        let work_dir = dir.path().join("work");
        std::fs::create_dir_all(&work_dir).unwrap();
        let sibling = dir.path().join("keep.txt");
        std::fs::write(&sibling, b"keep").unwrap();

        let cleaner = JobCleaner::new(Arc::new(InMemoryJobRegistry::new()), &work_dir);
        assert!(!cleaner.cleanup("..").await.unwrap());
        assert!(!cleaner.cleanup("../keep.txt").await.unwrap());
        assert!(sibling.exists());
        assert!(work_dir.exists());
    }

    #[tokio::test]
    async fn test_cleanup_unknown_id_keeps_foreign_directory() {
        let dir = TempDir::new().unwrap();
        let foreign = dir.path().join("not-a-job");
        std::fs::create_dir_all(&foreign).unwrap();
        std::fs::write(foreign.join("precious.txt"), b"keep").unwrap();

        let cleaner = JobCleaner::new(Arc::new(InMemoryJobRegistry::new()), dir.path());
        assert!(!cleaner.cleanup("not-a-job").await.unwrap());

        assert!(foreign.join("precious.txt").exists());
    }

    #[tokio::test]
    async fn test_remove_files_without_registry_entry() {
        let dir = TempDir::new().unwrap();
        let ws = JobWorkspace::new(dir.path(), "job-1").unwrap();
        ws.create().await.unwrap();

        let cleaner = JobCleaner::new(Arc::new(InMemoryJobRegistry::new()), dir.path());
        cleaner.remove_files("job-1").await.unwrap();
        assert!(!ws.dir().exists());

        cleaner.remove_files("job-1").await.unwrap();
        cleaner.remove_files("..").await.unwrap();
        assert!(dir.path().exists());
    }
}
