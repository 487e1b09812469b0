//! Testing utilities and mock implementations.
//!
//! This module provides mock implementations of the collaborator traits, so
//! jobs can be driven end to end without a model backend.
//!
//! # Example
//!
//! ```rust,ignore
//! use redline_core::testing::{MockExtractor, MockTransformer};
//!
//! let extractor = MockExtractor::new();
//! let transformer = MockTransformer::new();
//!
//! // Make one file fail
//! transformer
//!     .fail_for_text_containing("draft.docx", TransformError::malformed("not JSON"))
//!     .await;
//!
//! // Use in JobService::new(...)
//! ```

mod mock_extractor;
mod mock_llm_client;
mod mock_transformer;

pub use mock_extractor::MockExtractor;
pub use mock_llm_client::MockLlmClient;
pub use mock_transformer::{MockTransformer, RecordedTransform};

/// Test fixtures and helper functions.
pub mod fixtures {
    use docx_rs::{Docx, Paragraph, Run};
    use std::fs::File;
    use std::io::Cursor;
    use std::path::Path;
    use std::time::Duration;

    use crate::job::{JobRecord, JobRegistry};
    use crate::processor::{JobWorkspace, TaskInput};

    /// How long [`wait_for_terminal`] waits before giving up.
    pub const WAIT_TIMEOUT: Duration = Duration::from_secs(10);

    fn build_docx(paragraphs: &[&str]) -> Docx {
        paragraphs.iter().fold(Docx::new(), |docx, text| {
            docx.add_paragraph(Paragraph::new().add_run(Run::new().add_text(*text)))
        })
    }

    /// Write a `.docx` document with one paragraph per entry.
    pub fn write_docx(path: &Path, paragraphs: &[&str]) -> std::io::Result<()> {
        let file = File::create(path)?;
        build_docx(paragraphs)
            .build()
            .pack(file)
            .map_err(|e| std::io::Error::other(e.to_string()))
    }

    /// Build a `.docx` document in memory.
    pub fn docx_bytes(paragraphs: &[&str]) -> Vec<u8> {
        let mut buf = Cursor::new(Vec::new());
        build_docx(paragraphs)
            .build()
            .pack(&mut buf)
            .expect("pack fixture docx");
        buf.into_inner()
    }

    /// Store one upload per task of `job`, each a docx naming its file.
    pub async fn store_inputs(workspace: &JobWorkspace, job: &JobRecord) -> Vec<TaskInput> {
        let mut inputs = Vec::with_capacity(job.tasks().len());
        for task in job.tasks() {
            let path = workspace.upload_path(task.id(), task.name());
            if let Some(parent) = path.parent() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .expect("create upload dir");
            }
            let body = format!("Contents of {}.", task.name());
            write_docx(&path, &[&body]).expect("write upload");
            inputs.push(TaskInput {
                task_id: task.id(),
                name: task.name().to_string(),
                path,
            });
        }
        inputs
    }

    /// Poll until the job reaches a terminal status.
    ///
    /// Panics if the job disappears or does not finish within [`WAIT_TIMEOUT`].
    pub async fn wait_for_terminal(registry: &dyn JobRegistry, job_id: &str) -> JobRecord {
        let deadline = tokio::time::Instant::now() + WAIT_TIMEOUT;
        loop {
            let job = registry
                .get(job_id)
                .unwrap_or_else(|| panic!("job {} disappeared", job_id));
            if job.status().is_terminal() {
                return job;
            }
            if tokio::time::Instant::now() >= deadline {
                panic!("job {} still {} after {:?}", job_id, job.status(), WAIT_TIMEOUT);
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    /// Sorted entry names of a zip archive.
    pub fn archive_entries(path: &Path) -> Vec<String> {
        let file = File::open(path).expect("open archive");
        let archive = zip::ZipArchive::new(file).expect("read archive");
        let mut names: Vec<String> = archive.file_names().map(String::from).collect();
        names.sort();
        names
    }
}
