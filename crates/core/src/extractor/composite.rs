//! Extension-based dispatch over several extractors.

use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;

use super::docx::DocxExtractor;
use super::error::ExtractionError;
use super::plain::PlainTextExtractor;
use super::traits::Extractor;

/// Delegates to the first registered extractor that supports the file.
pub struct CompositeExtractor {
    extractors: Vec<Arc<dyn Extractor>>,
    extensions: Vec<&'static str>,
}

impl Default for CompositeExtractor {
    fn default() -> Self {
        Self::new()
            .with_extractor(Arc::new(DocxExtractor::new()), &["docx"])
            .with_extractor(Arc::new(PlainTextExtractor::new()), &["txt", "md"])
    }
}

impl CompositeExtractor {
    /// Creates a composite with no extractors registered.
    pub fn new() -> Self {
        Self {
            extractors: Vec::new(),
            extensions: Vec::new(),
        }
    }

    /// Registers an extractor; `extensions` are advertised by the composite.
    pub fn with_extractor(
        mut self,
        extractor: Arc<dyn Extractor>,
        extensions: &[&'static str],
    ) -> Self {
        self.extractors.push(extractor);
        for ext in extensions {
            if !self.extensions.contains(ext) {
                self.extensions.push(ext);
            }
        }
        self
    }
}

#[async_trait]
impl Extractor for CompositeExtractor {
    fn name(&self) -> &str {
        "composite"
    }

    fn supported_extensions(&self) -> &[&str] {
        &self.extensions
    }

    async fn extract(&self, path: &Path) -> Result<String, ExtractionError> {
        match self.extractors.iter().find(|e| e.supports(path)) {
            Some(extractor) => extractor.extract(path).await,
            None => Err(ExtractionError::UnsupportedFormat {
                extension: super::extension_of(path).unwrap_or_default(),
            }),
        }
    }
}
