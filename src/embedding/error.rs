use std::path::PathBuf;
use thiserror::Error;

/// Lowercased substrings candle/CUDA/Metal use when an allocation fails.
const EXHAUSTION_MARKERS: &[&str] = &["out of memory", "out_of_memory", "failed to allocate"];

/// Returns `true` when a backend error message reports memory exhaustion.
pub(crate) fn is_resource_exhaustion(message: &str) -> bool {
    let message = message.to_ascii_lowercase();
    EXHAUSTION_MARKERS
        .iter()
        .any(|marker| message.contains(marker))
}

/// Errors raised while loading the Instructor model or embedding texts.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("instructor model files not found at {path}")]
    ModelNotFound { path: PathBuf },

    #[error("failed to load instructor model: {reason}")]
    ModelLoadFailed { reason: String },

    #[error("{device} device unavailable: {reason}")]
    DeviceUnavailable { device: String, reason: String },

    /// The device ran out of memory mid-batch; the whole request fails.
    #[error("embedding resources exhausted: {reason}")]
    ResourceExhausted { reason: String },

    #[error("embedding forward pass failed: {reason}")]
    InferenceFailed { reason: String },

    #[error("failed to tokenize instruction/text: {reason}")]
    TokenizationFailed { reason: String },

    #[error("invalid instructor configuration: {reason}")]
    InvalidConfig { reason: String },
}

impl EmbeddingError {
    /// Classifies a failed forward pass as exhaustion or a plain inference error.
    pub fn inference(reason: impl Into<String>) -> Self {
        let reason = reason.into();
        if is_resource_exhaustion(&reason) {
            EmbeddingError::ResourceExhausted { reason }
        } else {
            EmbeddingError::InferenceFailed { reason }
        }
    }

    pub fn is_resource_exhausted(&self) -> bool {
        matches!(self, EmbeddingError::ResourceExhausted { .. })
    }
}

impl From<candle_core::Error> for EmbeddingError {
    fn from(err: candle_core::Error) -> Self {
        EmbeddingError::inference(err.to_string())
    }
}

impl From<std::io::Error> for EmbeddingError {
    fn from(err: std::io::Error) -> Self {
        EmbeddingError::ModelLoadFailed {
            reason: err.to_string(),
        }
    }
}
