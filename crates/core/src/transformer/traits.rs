//! Trait definitions for the transformer module.

use async_trait::async_trait;

use super::error::TransformError;
use super::roles::RoleConfig;
use super::types::ProofreadResult;

/// Produces proofreading results for document text.
#[async_trait]
pub trait Transformer: Send + Sync {
    /// Returns the name of this transformer implementation.
    fn name(&self) -> &str;

    /// Why this transformer cannot serve requests, if it cannot.
    fn unavailable_reason(&self) -> Option<&str> {
        None
    }

    /// Proofreads `text` under the given role.
    ///
    /// Empty text is still submitted; whatever the backend makes of it is
    /// the result.
    async fn transform(
        &self,
        text: &str,
        role: &RoleConfig,
    ) -> Result<ProofreadResult, TransformError>;
}
