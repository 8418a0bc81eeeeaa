//! Model wrappers served over HTTP.
//!
//! - [`instructor`] produces instruction-conditioned text embeddings.
//! - [`reranker`] scores `(query, candidate)` pairs with a cross-encoder.
//!
//! Both implement [`ServedModel`]; the gateway is generic over [`TextEmbedder`]
//! and [`PairScorer`].

/// Device selection (CPU / Metal / CUDA).
pub mod device;
mod error;
/// Instructor embedder.
pub mod instructor;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
/// Cross-encoder reranker.
pub mod reranker;
#[cfg(test)]
pub(crate) mod test_fixtures;
mod traits;
/// Tokenizer/weight loading and vector helpers.
pub mod utils;

pub use error::EmbeddingError;
pub use instructor::{INSTRUCTOR_DEFAULT_DIM, InstructorConfig, InstructorEmbedder};
#[cfg(any(test, feature = "mock"))]
pub use mock::FailingModel;
pub use reranker::{Reranker, RerankerConfig, RerankerError, ScoreActivation};
pub use traits::{PairScorer, ServedModel, TextEmbedder};
