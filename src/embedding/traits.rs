//! Seams between the HTTP gateway and the models it serves.

use candle_core::Device;

use super::error::EmbeddingError;
use super::reranker::RerankerError;

/// A loaded model that can describe itself to `/healthz`.
pub trait ServedModel: Send + Sync + 'static {
    /// Model identifier (usually the model directory name, or `"stub"`).
    fn model_name(&self) -> &str;

    fn device(&self) -> &Device;

    /// `true` when running the deterministic stand-in instead of real weights.
    fn is_stub(&self) -> bool;

    /// Output vector length, for models that produce vectors.
    fn dimension(&self) -> Option<usize> {
        None
    }
}

/// Instruction-conditioned text embedding.
pub trait TextEmbedder: ServedModel {
    /// Returns one vector per text, in input order, processing `batch_size` texts at a time.
    fn embed_batch(
        &self,
        instruction: &str,
        texts: &[String],
        normalize: bool,
        batch_size: usize,
    ) -> Result<Vec<Vec<f32>>, EmbeddingError>;
}

/// Pairwise query/candidate relevance scoring.
pub trait PairScorer: ServedModel {
    /// Returns one score per candidate, in input order, scoring `batch_size` pairs at a time.
    fn score_batch(
        &self,
        query: &str,
        candidates: &[String],
        batch_size: usize,
    ) -> Result<Vec<f32>, RerankerError>;
}
