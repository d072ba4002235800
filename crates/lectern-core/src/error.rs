//! Lectern error types.

use thiserror::Error;

use crate::types::DocumentStatus;

/// Errors shared by every Lectern crate.
#[derive(Debug, Error)]
pub enum LecternError {
    /// Malformed configuration or call arguments (e.g. `overlap >= chunk_size`, `k == 0`).
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Document not found: {0}")]
    DocumentNotFound(String),

    /// The document exists but has not finished processing (or failed).
    #[error("Document {id} is not ready (status: {status})")]
    DocumentNotReady { id: String, status: DocumentStatus },

    #[error("Text extraction failed: {0}")]
    Extraction(String),

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Store(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl LecternError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, LecternError>;
