//! Error types for the extractor module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while extracting text from a document.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// Input file not found.
    #[error("Input file not found: {path}")]
    InputNotFound { path: PathBuf },

    /// No extractor handles this file type.
    #[error("Unsupported document format: {extension}")]
    UnsupportedFormat { extension: String },

    /// The document could not be parsed.
    #[error("Malformed document {path}: {reason}")]
    Malformed { path: PathBuf, reason: String },

    /// I/O error while reading the document.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Blocking extraction task did not finish.
    #[error("Extraction task failed: {0}")]
    TaskFailed(String),
}

impl ExtractionError {
    /// Creates a malformed document error.
    pub fn malformed(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::Malformed {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}
