//! Error types for the transformer module.

use thiserror::Error;

use super::llm::LlmError;

/// Errors that can occur while transforming a document.
#[derive(Debug, Clone, Error)]
pub enum TransformError {
    /// Backend credentials are missing.
    #[error("Transformer not configured: {reason}")]
    NotConfigured { reason: String },

    /// The backend did not answer in time.
    #[error("Request timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },

    /// Network or connection failure.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The backend answered with an error status.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// The backend answered, but not with a usable proofreading result.
    #[error("Malformed response: {reason}")]
    MalformedResponse { reason: String },
}

impl TransformError {
    /// Creates a malformed response error.
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedResponse {
            reason: reason.into(),
        }
    }

    /// Whether this error is retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout { .. } | Self::Transport(_) => true,
            Self::Api { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

impl From<LlmError> for TransformError {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::Http(message) => Self::Transport(message),
            LlmError::Api { status, message } => Self::Api { status, message },
            LlmError::Json(reason) => Self::MalformedResponse { reason },
            LlmError::Timeout(duration) => Self::Timeout {
                timeout_secs: duration.as_secs(),
            },
            LlmError::NotConfigured => Self::NotConfigured {
                reason: "LLM API key not configured".to_string(),
            },
        }
    }
}
