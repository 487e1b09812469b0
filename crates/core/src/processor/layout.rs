//! On-disk layout of a job's files.
//!
//! ```text
//! <work_dir>/<job_id>/
//!     uploads/<task_id>/<name>
//!     outputs/NN-<stem>_PROOFREAD.docx
//!     outputs/PROOFREADING_REPORT.docx
//!     outputs/results.json
//!     outputs/summary.csv
//!     proofread_results.zip
//! ```

use std::path::{Path, PathBuf};

use crate::job::TaskId;

/// File name of the packaged archive.
pub const ARCHIVE_FILE_NAME: &str = "proofread_results.zip";

/// Paths owned by one job. Nothing outside [`JobWorkspace::dir`] is touched.
#[derive(Debug, Clone)]
pub struct JobWorkspace {
    dir: PathBuf,
}

impl JobWorkspace {
    /// Workspace of `job_id` under `work_dir`.
    ///
    /// Returns `None` if the id is not a plain path component, so an id
    /// taken from a request can never address anything outside `work_dir`.
    pub fn new(work_dir: &Path, job_id: &str) -> Option<Self> {
        if !is_plain_component(job_id) {
            return None;
        }
        Some(Self {
            dir: work_dir.join(job_id),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn uploads_dir(&self) -> PathBuf {
        self.dir.join("uploads")
    }

    pub fn upload_path(&self, task_id: TaskId, name: &str) -> PathBuf {
        self.uploads_dir()
            .join(task_id.to_string())
            .join(sanitize_file_name(name))
    }

    pub fn outputs_dir(&self) -> PathBuf {
        self.dir.join("outputs")
    }

    pub fn output_path(&self, file_name: &str) -> PathBuf {
        self.outputs_dir().join(sanitize_file_name(file_name))
    }

    pub fn archive_path(&self) -> PathBuf {
        self.dir.join(ARCHIVE_FILE_NAME)
    }

    /// Temporary path the archive is written to before being renamed in place.
    pub fn archive_temp_path(&self) -> PathBuf {
        self.dir.join(format!(".{}.tmp", ARCHIVE_FILE_NAME))
    }

    /// Creates the job directory with its uploads and outputs directories.
    pub async fn create(&self) -> std::io::Result<()> {
        tokio::fs::create_dir_all(self.uploads_dir()).await?;
        tokio::fs::create_dir_all(self.outputs_dir()).await
    }
}

/// Reduces an uploaded file name to its final path component.
///
/// Both `/` and `\` count as separators. Names that reduce to nothing, `.`
/// or `..` become `document`.
pub fn sanitize_file_name(name: &str) -> String {
    let last = name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim()
        .replace('\0', "");

    if is_plain_component(&last) {
        last
    } else {
        "document".to_string()
    }
}

fn is_plain_component(s: &str) -> bool {
    !s.is_empty() && s != "." && s != ".." && !s.contains(['/', '\\', '\0'])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_paths() {
        let ws = JobWorkspace::new(Path::new("/work"), "job-1").unwrap();
        assert_eq!(ws.dir(), Path::new("/work/job-1"));
        assert_eq!(
            ws.upload_path(2, "essay.docx"),
            PathBuf::from("/work/job-1/uploads/2/essay.docx")
        );
        assert_eq!(
            ws.output_path("PROOFREADING_REPORT.docx"),
            PathBuf::from("/work/job-1/outputs/PROOFREADING_REPORT.docx")
        );
        assert_eq!(
            ws.archive_path(),
            PathBuf::from("/work/job-1/proofread_results.zip")
        );
    }

    #[test]
    fn test_rejects_unsafe_job_ids() {
        let work = Path::new("/work");
        assert!(JobWorkspace::new(work, "..").is_none());
        assert!(JobWorkspace::new(work, "a/b").is_none());
        assert!(JobWorkspace::new(work, "..\\x").is_none());
        assert!(JobWorkspace::new(work, "").is_none());
    }

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("essay.docx"), "essay.docx");
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name("C:\\Users\\me\\draft.docx"), "draft.docx");
        assert_eq!(sanitize_file_name("dir/.."), "document");
        assert_eq!(sanitize_file_name(""), "document");
        assert_eq!(sanitize_file_name("  spaced name.docx "), "spaced name.docx");
    }

    #[tokio::test]
    async fn test_create_directories() {
        let dir = tempfile::TempDir::new().unwrap();
        let ws = JobWorkspace::new(dir.path(), "job-1").unwrap();
        ws.create().await.unwrap();
        assert!(ws.uploads_dir().is_dir());
        assert!(ws.outputs_dir().is_dir());
    }
}
