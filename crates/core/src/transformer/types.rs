//! Types produced by transformation.

use serde::{Deserialize, Serialize};

/// One suggested edit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Correction {
    #[serde(default)]
    pub original: String,
    #[serde(default)]
    pub suggested: String,
    #[serde(default)]
    pub reason: String,
}

/// Structured proofreading output for one document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofreadResult {
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub corrections: Vec<Correction>,
}

impl ProofreadResult {
    /// Placeholder result written in place of a real report when a file fails.
    pub fn failed(error: &str) -> Self {
        Self {
            summary: format!("Processing failed: {}", error),
            corrections: Vec::new(),
        }
    }
}
