//! Background processing of proofreading jobs.
//!
//! - [`Dispatcher`] hands a submitted job to its own tokio task, bounded by a
//!   semaphore.
//! - [`ProcessingPipeline`] runs every file through extraction, proofreading
//!   and report writing, isolating per-file failures.
//! - [`ArtifactPackager`] bundles the reports into one zip archive.
//! - [`JobCleaner`] removes a job and its files, even while it runs.
//!
//! # Example
//!
//! ```ignore
//! use redline_core::processor::{Dispatcher, ProcessingPipeline};
//!
//! let pipeline = Arc::new(ProcessingPipeline::new(
//!     registry.clone(), extractor, transformer, writer, roles, work_dir,
//! ));
//! let dispatcher = Dispatcher::new(pipeline, 4);
//!
//! // Returns immediately; poll the registry for progress.
//! dispatcher.schedule(job.id(), inputs)?;
//! ```

mod cleaner;
mod config;
mod dispatcher;
mod error;
mod layout;
mod packager;
mod pipeline;
mod types;

pub use cleaner::JobCleaner;
pub use config::ProcessorConfig;
pub use dispatcher::Dispatcher;
pub use error::{CleanupError, DispatchError, FileError, PackagingError, PipelineError};
pub use layout::{sanitize_file_name, JobWorkspace, ARCHIVE_FILE_NAME};
pub use packager::ArtifactPackager;
pub use pipeline::ProcessingPipeline;
pub use types::{DispatcherStatus, PipelineOutcome, TaskInput};
