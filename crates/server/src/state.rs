use redline_core::{Config, JobService, SanitizedConfig};

/// Shared application state
pub struct AppState {
    service: JobService,
}

impl AppState {
    pub fn new(service: JobService) -> Self {
        Self { service }
    }

    pub fn service(&self) -> &JobService {
        &self.service
    }

    pub fn config(&self) -> &Config {
        self.service.config()
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(self.config())
    }
}
