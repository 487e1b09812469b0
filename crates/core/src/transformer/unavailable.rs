//! Placeholder used when no backend can be built.

use async_trait::async_trait;

use super::error::TransformError;
use super::roles::RoleConfig;
use super::traits::Transformer;
use super::types::ProofreadResult;

/// A transformer that refuses every request.
///
/// Lets the service start without credentials; submissions are rejected up
/// front while [`UnavailableTransformer::reason`] explains why.
#[derive(Debug, Clone)]
pub struct UnavailableTransformer {
    reason: String,
}

impl UnavailableTransformer {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }
}

#[async_trait]
impl Transformer for UnavailableTransformer {
    fn name(&self) -> &str {
        "unavailable"
    }

    fn unavailable_reason(&self) -> Option<&str> {
        Some(&self.reason)
    }

    async fn transform(
        &self,
        _text: &str,
        _role: &RoleConfig,
    ) -> Result<ProofreadResult, TransformError> {
        Err(TransformError::NotConfigured {
            reason: self.reason.clone(),
        })
    }
}
