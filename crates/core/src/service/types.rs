//! Types for the service module.

use serde::{Deserialize, Serialize};

use crate::processor::DispatcherStatus;

/// One file of a submission.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// File name as sent by the client.
    pub name: String,
    /// File contents.
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }
}

/// Roles clients may choose from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RolesInfo {
    pub default: String,
    pub available: Vec<String>,
}

/// Overall service state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceStatus {
    /// Jobs currently held in the registry.
    pub jobs: usize,
    /// Name of the proofreading backend.
    pub transformer: String,
    /// Why proofreading is unavailable, if it is.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unavailable_reason: Option<String>,
    pub dispatcher: DispatcherStatus,
}
