//! Mock LLM client for testing.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::transformer::{CompletionRequest, CompletionResponse, LlmClient, LlmError, LlmUsage};

/// Mock implementation of the LlmClient trait.
///
/// Answers every request with a configurable reply and records requests.
#[derive(Debug)]
pub struct MockLlmClient {
    response: Arc<RwLock<String>>,
    requests: Arc<RwLock<Vec<CompletionRequest>>>,
    next_error: Arc<RwLock<Option<LlmError>>>,
}

impl Default for MockLlmClient {
    fn default() -> Self {
        Self::new()
    }
}

impl MockLlmClient {
    /// Create a mock that reports no corrections.
    pub fn new() -> Self {
        Self {
            response: Arc::new(RwLock::new(
                r#"{"corrections": [], "summary": "No issues found."}"#.to_string(),
            )),
            requests: Arc::new(RwLock::new(Vec::new())),
            next_error: Arc::new(RwLock::new(None)),
        }
    }

    /// Set the raw reply text.
    pub async fn set_response(&self, text: &str) {
        *self.response.write().await = text.to_string();
    }

    /// Configure the next request to fail with the given error.
    pub async fn set_next_error(&self, error: LlmError) {
        *self.next_error.write().await = Some(error);
    }

    /// Get all recorded requests.
    pub async fn recorded_requests(&self) -> Vec<CompletionRequest> {
        self.requests.read().await.clone()
    }

    /// Get the number of requests made.
    pub async fn request_count(&self) -> usize {
        self.requests.read().await.len()
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    fn provider(&self) -> &str {
        "mock"
    }

    fn model(&self) -> &str {
        "mock-model"
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let input_tokens = (request.prompt.len() / 4) as u32;
        self.requests.write().await.push(request);

        if let Some(error) = self.next_error.write().await.take() {
            return Err(error);
        }

        let text = self.response.read().await.clone();
        Ok(CompletionResponse {
            usage: LlmUsage {
                input_tokens,
                output_tokens: (text.len() / 4) as u32,
            },
            text,
            model: "mock-model".to_string(),
        })
    }
}
