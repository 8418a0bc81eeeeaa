//! Models that always fail inference, for exercising server-error paths.

use candle_core::Device;

use super::error::EmbeddingError;
use super::reranker::RerankerError;
use super::traits::{PairScorer, ServedModel, TextEmbedder};

/// Loads fine, then reports a resource-exhaustion style failure on every call.
#[derive(Debug, Clone)]
pub struct FailingModel {
    device: Device,
    reason: String,
}

impl FailingModel {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            device: Device::Cpu,
            reason: reason.into(),
        }
    }

    /// Failure matching a CUDA allocator error.
    pub fn out_of_memory() -> Self {
        Self::new("CUDA_ERROR_OUT_OF_MEMORY: out of memory")
    }
}

impl ServedModel for FailingModel {
    fn model_name(&self) -> &str {
        "failing"
    }

    fn device(&self) -> &Device {
        &self.device
    }

    fn is_stub(&self) -> bool {
        true
    }

    fn dimension(&self) -> Option<usize> {
        Some(4)
    }
}

impl TextEmbedder for FailingModel {
    fn embed_batch(
        &self,
        _instruction: &str,
        _texts: &[String],
        _normalize: bool,
        _batch_size: usize,
    ) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        Err(EmbeddingError::inference(self.reason.clone()))
    }
}

impl PairScorer for FailingModel {
    fn score_batch(
        &self,
        _query: &str,
        _candidates: &[String],
        _batch_size: usize,
    ) -> Result<Vec<f32>, RerankerError> {
        Err(RerankerError::inference(self.reason.clone()))
    }
}
