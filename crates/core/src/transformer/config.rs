//! Configuration for the LLM backend.

use serde::{Deserialize, Serialize};

/// LLM provider type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LlmProvider {
    /// xAI Grok (OpenAI-compatible chat completions).
    #[default]
    Xai,
    /// OpenAI or any OpenAI-compatible endpoint.
    #[serde(alias = "openai")]
    OpenAi,
    /// Local Ollama instance.
    Ollama,
}

impl LlmProvider {
    /// Whether the provider needs an API key.
    pub fn requires_api_key(&self) -> bool {
        !matches!(self, LlmProvider::Ollama)
    }

    /// Default API base URL for the provider.
    pub fn default_api_base(&self) -> &'static str {
        match self {
            LlmProvider::Xai => "https://api.x.ai",
            LlmProvider::OpenAi => "https://api.openai.com",
            LlmProvider::Ollama => "http://localhost:11434",
        }
    }
}

/// LLM client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// LLM provider.
    #[serde(default)]
    pub provider: LlmProvider,
    /// Model name/identifier.
    #[serde(default = "default_model")]
    pub model: String,
    /// API key. Takes precedence over `api_key_env`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    /// Custom API base URL (for proxies or self-hosted).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
    /// Maximum tokens for completions.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Sampling temperature.
    #[serde(default)]
    pub temperature: f32,
}

fn default_model() -> String {
    "grok-3".to_string()
}

fn default_api_key_env() -> String {
    "GROK_API_KEY".to_string()
}

fn default_timeout() -> u32 {
    60
}

fn default_max_tokens() -> u32 {
    4096
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: LlmProvider::default(),
            model: default_model(),
            api_key: None,
            api_key_env: default_api_key_env(),
            api_base: None,
            timeout_secs: default_timeout(),
            max_tokens: default_max_tokens(),
            temperature: 0.0,
        }
    }
}

impl LlmConfig {
    /// The configured API key, falling back to the `api_key_env` variable.
    /// Blank values count as missing.
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .or_else(|| std::env::var(&self.api_key_env).ok())
            .filter(|key| !key.trim().is_empty())
    }

    /// API base URL, explicit or the provider default.
    pub fn api_base(&self) -> &str {
        self.api_base
            .as_deref()
            .unwrap_or_else(|| self.provider.default_api_base())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = LlmConfig::default();
        assert_eq!(config.provider, LlmProvider::Xai);
        assert_eq!(config.model, "grok-3");
        assert_eq!(config.timeout_secs, 60);
        assert_eq!(config.api_base(), "https://api.x.ai");
    }

    #[test]
    fn test_provider_aliases() {
        let config: LlmConfig = toml::from_str(r#"provider = "openai""#).unwrap();
        assert_eq!(config.provider, LlmProvider::OpenAi);
        let config: LlmConfig = toml::from_str(r#"provider = "open_ai""#).unwrap();
        assert_eq!(config.provider, LlmProvider::OpenAi);
    }

    #[test]
    fn test_explicit_api_key_wins() {
        let config = LlmConfig {
            api_key: Some("explicit".to_string()),
            api_key_env: "REDLINE_TEST_UNSET_VARIABLE".to_string(),
            ..LlmConfig::default()
        };
        assert_eq!(config.resolve_api_key().as_deref(), Some("explicit"));
    }

    #[test]
    fn test_blank_api_key_is_missing() {
        let config = LlmConfig {
            api_key: Some("   ".to_string()),
            api_key_env: "REDLINE_TEST_UNSET_VARIABLE".to_string(),
            ..LlmConfig::default()
        };
        assert!(config.resolve_api_key().is_none());
    }

    #[test]
    fn test_ollama_needs_no_key() {
        assert!(!LlmProvider::Ollama.requires_api_key());
        assert!(LlmProvider::Xai.requires_api_key());
    }
}
