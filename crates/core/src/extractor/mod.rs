//! Text extraction from uploaded documents.
//!
//! Extractors turn an uploaded file into plain text for the transformer.
//! The [`CompositeExtractor`] picks an implementation by file extension.

mod composite;
mod docx;
mod error;
mod plain;
mod traits;

pub use composite::CompositeExtractor;
pub use docx::DocxExtractor;
pub use error::ExtractionError;
pub use plain::PlainTextExtractor;
pub use traits::Extractor;

use std::path::Path;

/// Lowercased extension of a path, without the dot.
pub(crate) fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}
