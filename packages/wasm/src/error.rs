//! Crate error type.
//!
//! Most failures in the visualizer degrade to a smaller-but-valid graph and
//! never reach the host. The variants here cover the few places that do
//! report failure: storage backends, payload decoding and the JS boundary.

use thiserror::Error;

/// Errors raised by the mind map core.
#[derive(Debug, Error)]
pub enum MindMapError {
    #[error("node not found: {0}")]
    UnknownNode(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid payload: {0}")]
    Payload(String),

    #[error("graph fetch failed for {document_id}: {message}")]
    Fetch {
        document_id: String,
        message: String,
    },
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, MindMapError>;

impl From<serde_wasm_bindgen::Error> for MindMapError {
    fn from(err: serde_wasm_bindgen::Error) -> Self {
        MindMapError::Payload(err.to_string())
    }
}
