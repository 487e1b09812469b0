use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr};

use crate::processor::ProcessorConfig;
use crate::transformer::{LlmConfig, LlmProvider, RolesConfig};

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub processor: ProcessorConfig,
    #[serde(default)]
    pub uploads: UploadConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub roles: RolesConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}

fn default_port() -> u16 {
    8000
}

/// Upload acceptance policy
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UploadConfig {
    /// File extensions (lowercase, without dot) accepted for processing.
    /// Files with other extensions are skipped at submission.
    #[serde(default = "default_allowed_extensions")]
    pub allowed_extensions: Vec<String>,
    /// Maximum size of a whole submission request in bytes.
    #[serde(default = "default_max_request_bytes")]
    pub max_request_bytes: usize,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            allowed_extensions: default_allowed_extensions(),
            max_request_bytes: default_max_request_bytes(),
        }
    }
}

impl UploadConfig {
    /// Whether a file name carries one of the accepted extensions.
    pub fn accepts(&self, file_name: &str) -> bool {
        let extension = std::path::Path::new(file_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        match extension {
            Some(ext) => self
                .allowed_extensions
                .iter()
                .any(|allowed| allowed.eq_ignore_ascii_case(&ext)),
            None => false,
        }
    }
}

fn default_allowed_extensions() -> Vec<String> {
    vec!["docx".to_string()]
}

fn default_max_request_bytes() -> usize {
    50 * 1024 * 1024 // 50 MB
}

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: ServerConfig,
    pub processor: ProcessorConfig,
    pub uploads: UploadConfig,
    pub llm: SanitizedLlmConfig,
    pub roles: SanitizedRolesConfig,
}

/// Sanitized LLM config (API key hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedLlmConfig {
    pub provider: String,
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,
    pub api_key_configured: bool,
    pub timeout_secs: u32,
}

/// Role names only; prompts stay server-side.
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedRolesConfig {
    pub default: String,
    pub available: Vec<String>,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            server: config.server.clone(),
            processor: config.processor.clone(),
            uploads: config.uploads.clone(),
            llm: SanitizedLlmConfig {
                provider: match config.llm.provider {
                    LlmProvider::Xai => "xai".to_string(),
                    LlmProvider::OpenAi => "open_ai".to_string(),
                    LlmProvider::Ollama => "ollama".to_string(),
                },
                model: config.llm.model.clone(),
                api_base: config.llm.api_base.clone(),
                api_key_configured: config.llm.resolve_api_key().is_some(),
                timeout_secs: config.llm.timeout_secs,
            },
            roles: SanitizedRolesConfig {
                default: config.roles.default.clone(),
                available: config.roles.profiles.keys().cloned().collect(),
            },
        }
    }
}
