//! Mock transformer for testing.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::transformer::{Correction, ProofreadResult, RoleConfig, TransformError, Transformer};

/// A recorded transform call for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedTransform {
    /// Text that was submitted.
    pub text: String,
    /// Name of the role used.
    pub role: String,
}

/// Mock implementation of the Transformer trait.
///
/// Provides controllable behavior for testing:
/// - Record every call for assertions
/// - Fail calls whose text contains a marker
/// - Fail the next call once
/// - Delay calls to keep a job in flight
#[derive(Debug)]
pub struct MockTransformer {
    calls: Arc<RwLock<Vec<RecordedTransform>>>,
    result: Arc<RwLock<ProofreadResult>>,
    failures: Arc<RwLock<Vec<(String, TransformError)>>>,
    next_error: Arc<RwLock<Option<TransformError>>>,
    delay: Arc<RwLock<Duration>>,
}

impl Default for MockTransformer {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTransformer {
    /// Create a new mock transformer returning one sample correction.
    pub fn new() -> Self {
        Self {
            calls: Arc::new(RwLock::new(Vec::new())),
            result: Arc::new(RwLock::new(ProofreadResult {
                summary: "One correction.".to_string(),
                corrections: vec![Correction {
                    original: "Their".to_string(),
                    suggested: "There".to_string(),
                    reason: "Wrong word".to_string(),
                }],
            })),
            failures: Arc::new(RwLock::new(Vec::new())),
            next_error: Arc::new(RwLock::new(None)),
            delay: Arc::new(RwLock::new(Duration::ZERO)),
        }
    }

    /// Set the result returned by successful calls.
    pub async fn set_result(&self, result: ProofreadResult) {
        *self.result.write().await = result;
    }

    /// Fail every call whose text contains `marker`.
    pub async fn fail_for_text_containing(&self, marker: &str, error: TransformError) {
        self.failures
            .write()
            .await
            .push((marker.to_string(), error));
    }

    /// Configure the next call to fail with the given error.
    pub async fn set_next_error(&self, error: TransformError) {
        *self.next_error.write().await = Some(error);
    }

    /// Set a delay applied to every call.
    pub async fn set_delay(&self, delay: Duration) {
        *self.delay.write().await = delay;
    }

    /// Get all recorded calls.
    pub async fn recorded_calls(&self) -> Vec<RecordedTransform> {
        self.calls.read().await.clone()
    }

    /// Texts submitted so far, in call order.
    pub async fn recorded_texts(&self) -> Vec<String> {
        self.calls
            .read()
            .await
            .iter()
            .map(|c| c.text.clone())
            .collect()
    }

    /// Get the number of calls made.
    pub async fn call_count(&self) -> usize {
        self.calls.read().await.len()
    }
}

#[async_trait]
impl Transformer for MockTransformer {
    fn name(&self) -> &str {
        "mock"
    }

    async fn transform(
        &self,
        text: &str,
        role: &RoleConfig,
    ) -> Result<ProofreadResult, TransformError> {
        self.calls.write().await.push(RecordedTransform {
            text: text.to_string(),
            role: role.name.clone(),
        });

        let delay = *self.delay.read().await;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        if let Some(error) = self.next_error.write().await.take() {
            return Err(error);
        }

        if let Some((_, error)) = self
            .failures
            .read()
            .await
            .iter()
            .find(|(marker, _)| text.contains(marker.as_str()))
        {
            return Err(error.clone());
        }

        Ok(self.result.read().await.clone())
    }
}
