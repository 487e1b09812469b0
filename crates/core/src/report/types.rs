//! Report input types.

use serde::{Deserialize, Serialize};

use crate::transformer::ProofreadResult;

/// Everything a report needs to know about one processed file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileReport {
    /// Original upload name.
    pub file_name: String,
    /// Characters extracted, if extraction succeeded.
    pub char_count: Option<usize>,
    /// Proofreading output, or the placeholder written for a failed file.
    pub result: ProofreadResult,
    /// Failure diagnostic for a failed file.
    pub error: Option<String>,
}

impl FileReport {
    pub fn success(file_name: impl Into<String>, char_count: usize, result: ProofreadResult) -> Self {
        Self {
            file_name: file_name.into(),
            char_count: Some(char_count),
            result,
            error: None,
        }
    }

    /// Report for a failed file, carrying `"Processing failed: <error>"` as its summary.
    pub fn failure(
        file_name: impl Into<String>,
        char_count: Option<usize>,
        error: impl Into<String>,
    ) -> Self {
        let error = error.into();
        Self {
            file_name: file_name.into(),
            char_count,
            result: ProofreadResult::failed(&error),
            error: Some(error),
        }
    }

    pub fn is_failure(&self) -> bool {
        self.error.is_some()
    }
}
