//! Word (.docx) text extraction.

use async_trait::async_trait;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::error::ExtractionError;
use super::traits::Extractor;

const DOCUMENT_PART: &str = "word/document.xml";

/// Extracts paragraph text from `.docx` files.
///
/// Paragraphs whose text is blank are skipped; the rest are joined with a
/// newline. Tabs and explicit line breaks inside a paragraph are kept.
#[derive(Debug, Clone, Default)]
pub struct DocxExtractor;

impl DocxExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Reads the main document part out of the package and extracts its text.
    pub fn extract_sync(path: &Path) -> Result<String, ExtractionError> {
        if !path.exists() {
            return Err(ExtractionError::InputNotFound {
                path: path.to_path_buf(),
            });
        }

        let file = std::fs::File::open(path)?;
        let mut archive =
            zip::ZipArchive::new(file).map_err(|e| ExtractionError::malformed(path, e))?;

        let mut xml = String::new();
        archive
            .by_name(DOCUMENT_PART)
            .map_err(|e| ExtractionError::malformed(path, format!("{}: {}", DOCUMENT_PART, e)))?
            .read_to_string(&mut xml)?;

        paragraphs_from_xml(&xml)
            .map(|paragraphs| paragraphs.join("\n"))
            .map_err(|reason| ExtractionError::malformed(path, reason))
    }
}

/// Collects the text of every non-blank `w:p` element, in document order.
fn paragraphs_from_xml(xml: &str) -> Result<Vec<String>, String> {
    let mut reader = Reader::from_str(xml);

    let mut paragraphs = Vec::new();
    let mut current = String::new();
    let mut in_run = false;
    let mut in_text = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"p" => current.clear(),
                b"r" => in_run = true,
                b"t" => in_text = true,
                _ => {}
            },
            // Tab stops in paragraph properties are also `w:tab`, only runs count.
            Ok(Event::Empty(e)) if in_run => match e.local_name().as_ref() {
                b"tab" => current.push('\t'),
                b"br" | b"cr" => current.push('\n'),
                _ => {}
            },
            Ok(Event::Text(e)) if in_text => {
                let text = e.unescape().map_err(|e| e.to_string())?;
                current.push_str(&text);
            }
            Ok(Event::CData(e)) if in_text => {
                current.push_str(&String::from_utf8_lossy(&e));
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"r" => in_run = false,
                b"p" => {
                    if !current.trim().is_empty() {
                        paragraphs.push(std::mem::take(&mut current));
                    }
                    current.clear();
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(format!(
                    "XML error at position {}: {}",
                    reader.buffer_position(),
                    e
                ))
            }
            _ => {}
        }
    }

    Ok(paragraphs)
}

#[async_trait]
impl Extractor for DocxExtractor {
    fn name(&self) -> &str {
        "docx"
    }

    fn supported_extensions(&self) -> &[&str] {
        &["docx"]
    }

    async fn extract(&self, path: &Path) -> Result<String, ExtractionError> {
        let owned: PathBuf = path.to_path_buf();
        let text = tokio::task::spawn_blocking(move || Self::extract_sync(&owned))
            .await
            .map_err(|e| ExtractionError::TaskFailed(e.to_string()))??;

        debug!(path = %path.display(), chars = text.chars().count(), "Extracted docx text");
        Ok(text)
    }
}
