//! Mock extractor for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::extractor::{ExtractionError, Extractor};

/// Mock implementation of the Extractor trait.
///
/// Files are matched by file name. Unless configured otherwise a file
/// extracts to `"Contents of <name>."`, so tests can tell files apart
/// downstream.
///
/// # Example
///
/// ```rust,ignore
/// use redline_core::testing::MockExtractor;
///
/// let extractor = MockExtractor::new();
/// extractor.set_text("essay.docx", "Their going home.").await;
/// extractor.fail_for("broken.docx", "not a zip archive").await;
/// ```
#[derive(Debug, Default)]
pub struct MockExtractor {
    texts: Arc<RwLock<HashMap<String, String>>>,
    failures: Arc<RwLock<HashMap<String, String>>>,
    calls: Arc<RwLock<Vec<PathBuf>>>,
    delay: Arc<RwLock<Duration>>,
}

impl MockExtractor {
    /// Create a new mock extractor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the text returned for a file name.
    pub async fn set_text(&self, file_name: &str, text: &str) {
        self.texts
            .write()
            .await
            .insert(file_name.to_string(), text.to_string());
    }

    /// Make extraction of a file name fail as a malformed document.
    pub async fn fail_for(&self, file_name: &str, reason: &str) {
        self.failures
            .write()
            .await
            .insert(file_name.to_string(), reason.to_string());
    }

    /// Set a delay applied to every extraction.
    pub async fn set_delay(&self, delay: Duration) {
        *self.delay.write().await = delay;
    }

    /// Paths extracted so far, in call order.
    pub async fn recorded_paths(&self) -> Vec<PathBuf> {
        self.calls.read().await.clone()
    }

    /// Get the number of extractions performed.
    pub async fn call_count(&self) -> usize {
        self.calls.read().await.len()
    }
}

#[async_trait]
impl Extractor for MockExtractor {
    fn name(&self) -> &str {
        "mock"
    }

    fn supported_extensions(&self) -> &[&str] {
        &["docx", "txt", "md"]
    }

    async fn extract(&self, path: &Path) -> Result<String, ExtractionError> {
        self.calls.write().await.push(path.to_path_buf());

        let delay = *self.delay.read().await;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        if let Some(reason) = self.failures.read().await.get(&file_name) {
            return Err(ExtractionError::malformed(path, reason));
        }

        Ok(self
            .texts
            .read()
            .await
            .get(&file_name)
            .cloned()
            .unwrap_or_else(|| format!("Contents of {}.", file_name)))
    }
}
