//! Trait definitions for the report module.

use std::path::Path;

use super::error::ReportError;
use super::types::FileReport;

/// Writes per-file and aggregate report documents.
///
/// Implementations do blocking I/O; async callers should run them on the
/// blocking thread pool.
pub trait ArtifactWriter: Send + Sync {
    /// Returns the name of this writer implementation.
    fn name(&self) -> &str;

    /// File extension of produced documents, without the dot.
    fn extension(&self) -> &str;

    /// Writes the report for one file. Returns the number of bytes written.
    fn write_file_report(&self, path: &Path, report: &FileReport) -> Result<u64, ReportError>;

    /// Writes the combined report covering every file of a job, in order.
    /// Returns the number of bytes written.
    fn write_aggregate_report(
        &self,
        path: &Path,
        reports: &[FileReport],
    ) -> Result<u64, ReportError>;

    /// Name of the per-file artifact: `NN-<stem>_PROOFREAD.<ext>`.
    ///
    /// The task id prefix keeps names unique when uploads share a name.
    fn file_report_name(&self, task_id: u32, source_name: &str) -> String {
        let stem = Path::new(source_name)
            .file_stem()
            .and_then(|s| s.to_str())
            .filter(|s| !s.is_empty())
            .unwrap_or("document");
        format!("{:02}-{}_PROOFREAD.{}", task_id, stem, self.extension())
    }

    /// Name of the aggregate artifact.
    fn aggregate_report_name(&self) -> String {
        format!("PROOFREADING_REPORT.{}", self.extension())
    }
}
