//! Job service: the operations callers use.
//!
//! [`JobService`] validates submissions, stores uploads, hands jobs to the
//! dispatcher and answers polls and downloads from the registry. The HTTP
//! layer is a thin mapping over it.

mod error;
mod job_service;
mod types;

pub use error::ServiceError;
pub use job_service::JobService;
pub use types::{RolesInfo, ServiceStatus, UploadedFile};
