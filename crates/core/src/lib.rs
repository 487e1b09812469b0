pub mod config;
pub mod extractor;
pub mod job;
pub mod metrics;
pub mod processor;
pub mod report;
pub mod service;
pub mod testing;
pub mod transformer;

pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, SanitizedConfig,
};
pub use job::{ArtifactRef, JobError, JobRecord, JobRegistry, JobStatus, TaskState, TaskStatus};
pub use service::{JobService, RolesInfo, ServiceError, ServiceStatus, UploadedFile};
