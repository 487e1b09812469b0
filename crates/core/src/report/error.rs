//! Error types for the report module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while writing a report artifact.
#[derive(Debug, Error)]
pub enum ReportError {
    /// The document could not be serialized to disk.
    #[error("Failed to write report {path}: {reason}")]
    WriteFailed { path: PathBuf, reason: String },

    /// I/O error while writing the report.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Blocking write task did not finish.
    #[error("Report task failed: {0}")]
    TaskFailed(String),
}

impl ReportError {
    pub fn write_failed(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::WriteFailed {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}
