use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - At least one concurrent job slot
/// - At least one accepted upload extension
/// - The default role exists among the role profiles
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    if config.processor.max_concurrent_jobs == 0 {
        return Err(ConfigError::ValidationError(
            "processor.max_concurrent_jobs must be at least 1".to_string(),
        ));
    }

    if config.uploads.allowed_extensions.is_empty() {
        return Err(ConfigError::ValidationError(
            "uploads.allowed_extensions cannot be empty".to_string(),
        ));
    }

    if !config.roles.profiles.contains_key(&config.roles.default) {
        return Err(ConfigError::ValidationError(format!(
            "roles.default '{}' is not defined in roles.profiles",
            config.roles.default
        )));
    }

    if config.llm.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "llm.timeout_secs cannot be 0".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_default_config() {
        assert!(validate_config(&Config::default()).is_ok());
    }

    #[test]
    fn test_validate_port_zero_fails() {
        let mut config = Config::default();
        config.server.port = 0;
        let result = validate_config(&config);
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_validate_zero_job_slots_fails() {
        let mut config = Config::default();
        config.processor.max_concurrent_jobs = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_unknown_default_role_fails() {
        let mut config = Config::default();
        config.roles.default = "pirate".to_string();
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("pirate"));
    }

    #[test]
    fn test_validate_empty_extensions_fails() {
        let mut config = Config::default();
        config.uploads.allowed_extensions.clear();
        assert!(validate_config(&config).is_err());
    }
}
