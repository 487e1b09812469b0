//! Plain text and markdown extraction.

use async_trait::async_trait;
use std::path::Path;

use super::error::ExtractionError;
use super::traits::Extractor;

/// Reads `.txt` and `.md` files as UTF-8, replacing invalid sequences.
#[derive(Debug, Clone, Default)]
pub struct PlainTextExtractor;

impl PlainTextExtractor {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Extractor for PlainTextExtractor {
    fn name(&self) -> &str {
        "plain-text"
    }

    fn supported_extensions(&self) -> &[&str] {
        &["txt", "md"]
    }

    async fn extract(&self, path: &Path) -> Result<String, ExtractionError> {
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ExtractionError::InputNotFound {
                    path: path.to_path_buf(),
                })
            }
            Err(e) => return Err(e.into()),
        };

        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_extract_text_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("notes.md");
        std::fs::write(&path, "# Title\n\nSome text.").unwrap();

        let text = PlainTextExtractor::new().extract(&path).await.unwrap();
        assert_eq!(text, "# Title\n\nSome text.");
    }

    #[tokio::test]
    async fn test_extract_missing_file() {
        let err = PlainTextExtractor::new()
            .extract(Path::new("/nonexistent/notes.txt"))
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractionError::InputNotFound { .. }));
    }
}
