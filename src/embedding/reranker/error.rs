use std::path::PathBuf;
use thiserror::Error;

use crate::embedding::error::{EmbeddingError, is_resource_exhaustion};

/// Errors raised while loading the cross-encoder or scoring pairs.
#[derive(Debug, Error)]
pub enum RerankerError {
    #[error("reranker model directory not found at {path}")]
    ModelNotFound { path: PathBuf },

    #[error("failed to load cross-encoder: {reason}")]
    ModelLoadFailed { reason: String },

    #[error("{device} device unavailable: {reason}")]
    DeviceUnavailable { device: String, reason: String },

    /// The device ran out of memory mid-batch; the whole request fails.
    #[error("reranking resources exhausted: {reason}")]
    ResourceExhausted { reason: String },

    #[error("cross-encoder forward pass failed: {reason}")]
    InferenceFailed { reason: String },

    #[error("failed to tokenize query/candidate pair: {reason}")]
    TokenizationFailed { reason: String },

    #[error("invalid reranker configuration: {reason}")]
    InvalidConfig { reason: String },
}

impl RerankerError {
    /// Classifies a failed forward pass as exhaustion or a plain inference error.
    pub fn inference(reason: impl Into<String>) -> Self {
        let reason = reason.into();
        if is_resource_exhaustion(&reason) {
            RerankerError::ResourceExhausted { reason }
        } else {
            RerankerError::InferenceFailed { reason }
        }
    }

    pub fn is_resource_exhausted(&self) -> bool {
        matches!(self, RerankerError::ResourceExhausted { .. })
    }
}

impl From<candle_core::Error> for RerankerError {
    fn from(err: candle_core::Error) -> Self {
        RerankerError::inference(err.to_string())
    }
}

impl From<std::io::Error> for RerankerError {
    fn from(err: std::io::Error) -> Self {
        RerankerError::ModelLoadFailed {
            reason: err.to_string(),
        }
    }
}

impl From<EmbeddingError> for RerankerError {
    fn from(err: EmbeddingError) -> Self {
        match err {
            EmbeddingError::DeviceUnavailable { device, reason } => {
                RerankerError::DeviceUnavailable { device, reason }
            }
            EmbeddingError::InvalidConfig { reason } => RerankerError::InvalidConfig { reason },
            EmbeddingError::ResourceExhausted { reason } => {
                RerankerError::ResourceExhausted { reason }
            }
            _ => RerankerError::InferenceFailed {
                reason: err.to_string(),
            },
        }
    }
}
