//! Trait definitions for the extractor module.

use async_trait::async_trait;
use std::path::Path;

use super::error::ExtractionError;

/// Pulls plain text out of a stored document.
#[async_trait]
pub trait Extractor: Send + Sync {
    /// Returns the name of this extractor implementation.
    fn name(&self) -> &str;

    /// Extensions (lowercase, no dot) this extractor understands.
    fn supported_extensions(&self) -> &[&str];

    /// Extracts the document text. An empty document yields an empty string.
    async fn extract(&self, path: &Path) -> Result<String, ExtractionError>;

    /// Whether this extractor handles the file at `path`.
    fn supports(&self, path: &Path) -> bool {
        super::extension_of(path)
            .map(|ext| self.supported_extensions().contains(&ext.as_str()))
            .unwrap_or(false)
    }
}
