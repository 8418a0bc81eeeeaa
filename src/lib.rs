//! Duet library crate (used by the two service binaries and integration tests).
//!
//! # Public API Surface
//!
//! ## Services
//! - [`gateway::create_embed_router`] serves `POST /embed` over a [`TextEmbedder`].
//! - [`gateway::create_rerank_router`] serves `POST /rerank` over a [`PairScorer`].
//! - [`server::serve`] wires a router to a background model load and graceful shutdown.
//!
//! ## Models
//! - [`InstructorEmbedder`], [`InstructorConfig`] - Instruction-conditioned embeddings
//! - [`Reranker`], [`RerankerConfig`] - Cross-encoder relevance scores
//!
//! ## Lifecycle
//! - [`ModelCell`] - Loading → ready/failed state read by `/healthz`
//!
//! ## Test/Mock Support
//! Failing models are available behind `#[cfg(any(test, feature = "mock"))]`.

pub mod config;
pub mod constants;
pub mod embedding;
pub mod gateway;
pub mod lifecycle;
pub mod server;

pub use config::{Config, ConfigError};
#[cfg(any(test, feature = "mock"))]
pub use embedding::FailingModel;
pub use embedding::{
    EmbeddingError, INSTRUCTOR_DEFAULT_DIM, InstructorConfig, InstructorEmbedder, PairScorer,
    Reranker, RerankerConfig, RerankerError, ScoreActivation, ServedModel, TextEmbedder,
};
pub use gateway::{GatewayError, HandlerState, RequestLimits};
pub use lifecycle::{ModelCell, ModelStatus};
