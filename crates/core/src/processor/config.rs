//! Configuration for the processor module.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for job processing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessorConfig {
    /// Root directory for per-job uploads, outputs and archives.
    #[serde(default = "default_work_dir")]
    pub work_dir: PathBuf,

    /// Maximum jobs processed at the same time. Further jobs wait queued.
    #[serde(default = "default_max_concurrent_jobs")]
    pub max_concurrent_jobs: usize,
}

fn default_work_dir() -> PathBuf {
    std::env::temp_dir().join("redline")
}

fn default_max_concurrent_jobs() -> usize {
    4
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            work_dir: default_work_dir(),
            max_concurrent_jobs: default_max_concurrent_jobs(),
        }
    }
}

impl ProcessorConfig {
    /// Sets the work directory.
    pub fn with_work_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.work_dir = dir.into();
        self
    }

    /// Sets the maximum number of concurrently processed jobs.
    pub fn with_max_concurrent_jobs(mut self, max: usize) -> Self {
        self.max_concurrent_jobs = max;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ProcessorConfig::default();
        assert_eq!(config.max_concurrent_jobs, 4);
        assert!(config.work_dir.ends_with("redline"));
    }

    #[test]
    fn test_config_builder() {
        let config = ProcessorConfig::default()
            .with_work_dir("/srv/redline")
            .with_max_concurrent_jobs(1);

        assert_eq!(config.work_dir, PathBuf::from("/srv/redline"));
        assert_eq!(config.max_concurrent_jobs, 1);
    }
}
