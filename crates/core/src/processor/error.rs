//! Error types for the processor module.

use std::path::PathBuf;
use thiserror::Error;

use crate::extractor::ExtractionError;
use crate::job::JobError;
use crate::report::ReportError;
use crate::transformer::TransformError;

/// Failure of one file. Recovered locally: the file ends in `error` and the
/// job moves on to the next file.
#[derive(Debug, Error)]
pub enum FileError {
    #[error("Extraction failed: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("Proofreading failed: {0}")]
    Transform(#[from] TransformError),

    #[error("Report failed: {0}")]
    Report(#[from] ReportError),
}

/// Failure to build the job archive. Fatal for the job.
#[derive(Debug, Error)]
pub enum PackagingError {
    /// The aggregate report or a summary could not be written.
    #[error("Report failed: {0}")]
    Report(#[from] ReportError),

    /// A file has no artifact to package, not even a fallback.
    #[error("No report for {file_name}: {reason}")]
    MissingArtifact { file_name: String, reason: String },

    /// An artifact or the archive could not be read or written.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The zip writer failed.
    #[error("Archive error: {0}")]
    Zip(String),

    /// Blocking packaging task did not finish.
    #[error("Packaging task failed: {0}")]
    TaskFailed(String),
}

impl PackagingError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Failure to hand a job to the background worker.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The job already has (or had) a pipeline run.
    #[error("Job already scheduled: {job_id}")]
    AlreadyScheduled { job_id: String },

    /// The job does not exist.
    #[error("Job not found: {job_id}")]
    JobNotFound { job_id: String },

    /// No async runtime is available to run the job.
    #[error("No async runtime available")]
    NoRuntime,

    /// The dispatcher no longer accepts work.
    #[error("Dispatcher is shut down")]
    ShutDown,
}

/// Unexpected registry failure while running a pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Registry error: {0}")]
    Job(#[from] JobError),
}

/// Failure to remove a job's files.
#[derive(Debug, Error)]
pub enum CleanupError {
    #[error("Failed to remove {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_error_messages() {
        let err: FileError = TransformError::Api {
            status: 500,
            message: "down".to_string(),
        }
        .into();
        assert_eq!(err.to_string(), "Proofreading failed: API error: 500 - down");

        let err: FileError = ExtractionError::UnsupportedFormat {
            extension: "pdf".to_string(),
        }
        .into();
        assert_eq!(
            err.to_string(),
            "Extraction failed: Unsupported document format: pdf"
        );
    }
}
