//! LLM-backed proofreading.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex_lite::Regex;
use std::sync::Arc;
use tracing::debug;

use super::config::LlmConfig;
use super::error::TransformError;
use super::llm::{create_llm_client, CompletionRequest, LlmClient};
use super::roles::RoleConfig;
use super::traits::Transformer;
use super::types::ProofreadResult;

/// Markdown code fence around the whole reply, with optional language tag.
static CODE_FENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)^\s*```[A-Za-z]*\s*(.*?)\s*```\s*$").expect("valid code fence regex")
});

/// Builds the user message asking for a JSON-only proofreading result.
pub fn build_user_prompt(text: &str) -> String {
    format!(
        "Proofread and return ONLY valid JSON: \
         {{\"corrections\": [{{\"original\": \"\", \"suggested\": \"\", \"reason\": \"\"}}], \
         \"summary\": \"...\"}} Text: \"\"\"{}\"\"\"",
        text
    )
}

/// Parses a model reply into a [`ProofreadResult`].
///
/// Accepts a bare JSON object, one wrapped in a markdown code fence, or one
/// surrounded by prose. Missing fields default to empty.
pub fn parse_proofread_response(raw: &str) -> Result<ProofreadResult, TransformError> {
    let unfenced = CODE_FENCE
        .captures(raw)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .unwrap_or(raw)
        .trim();

    if let Ok(result) = serde_json::from_str::<ProofreadResult>(unfenced) {
        return Ok(result);
    }

    let object = match (unfenced.find('{'), unfenced.rfind('}')) {
        (Some(start), Some(end)) if start < end => &unfenced[start..=end],
        _ => {
            return Err(TransformError::malformed(format!(
                "no JSON object in response: {}",
                truncate(raw, 200)
            )))
        }
    };

    serde_json::from_str::<ProofreadResult>(object).map_err(|e| {
        TransformError::malformed(format!("{}: {}", e, truncate(raw, 200)))
    })
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_chars).collect();
        format!("{}...", head)
    }
}

/// Proofreads text with a chat model.
pub struct LlmTransformer {
    client: Arc<dyn LlmClient>,
    max_tokens: u32,
    temperature: f32,
}

impl LlmTransformer {
    pub fn new(client: Arc<dyn LlmClient>) -> Self {
        Self {
            client,
            max_tokens: 4096,
            temperature: 0.0,
        }
    }

    /// Creates the transformer and its client from configuration.
    pub fn from_config(config: &LlmConfig) -> Result<Self, TransformError> {
        let client = create_llm_client(config)?;
        Ok(Self::new(client)
            .with_max_tokens(config.max_tokens)
            .with_temperature(config.temperature))
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }
}

#[async_trait]
impl Transformer for LlmTransformer {
    fn name(&self) -> &str {
        self.client.provider()
    }

    async fn transform(
        &self,
        text: &str,
        role: &RoleConfig,
    ) -> Result<ProofreadResult, TransformError> {
        debug!(
            provider = %self.client.provider(),
            model = %self.client.model(),
            role = %role.name,
            chars = text.chars().count(),
            "Requesting proofreading"
        );

        let request = CompletionRequest::new(build_user_prompt(text))
            .with_system(role.system_prompt.clone())
            .with_max_tokens(self.max_tokens)
            .with_temperature(self.temperature);

        let response = self.client.complete(request).await?;
        let result = parse_proofread_response(&response.text)?;

        debug!(
            role = %role.name,
            corrections = result.corrections.len(),
            output_tokens = response.usage.output_tokens,
            "Proofreading response parsed"
        );
        Ok(result)
    }
}
