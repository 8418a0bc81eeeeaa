//! HTTP gateway (Axum) for the embedding and reranking services.
//!
//! Both routers share `/healthz` (readiness) and `/livez` (liveness); each adds
//! its one inference route.

pub mod error;
pub mod handler;
pub mod middleware;
pub mod payload;
pub mod state;


use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

pub use error::GatewayError;
pub use handler::{embed_handler, health_handler, livez_handler, rerank_handler};
pub use payload::{
    EmbedRequest, EmbedResponse, HealthResponse, RequestLimits, RerankRequest, RerankResponse,
};
pub use state::HandlerState;

use crate::embedding::{PairScorer, TextEmbedder};

/// Routes for the Instructor embedding service.
pub fn create_embed_router<E>(state: HandlerState<E>, max_body_bytes: usize) -> Router
where
    E: TextEmbedder,
{
    Router::new()
        .route("/healthz", get(health_handler::<E>))
        .route("/livez", get(livez_handler))
        .route("/embed", post(embed_handler::<E>))
        .fallback(middleware::route_not_found)
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(axum::middleware::map_response(middleware::ensure_duet_status))
        .layer(axum::middleware::from_fn(middleware::request_id))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Routes for the cross-encoder reranking service.
pub fn create_rerank_router<R>(state: HandlerState<R>, max_body_bytes: usize) -> Router
where
    R: PairScorer,
{
    Router::new()
        .route("/healthz", get(health_handler::<R>))
        .route("/livez", get(livez_handler))
        .route("/rerank", post(rerank_handler::<R>))
        .fallback(middleware::route_not_found)
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(axum::middleware::map_response(middleware::ensure_duet_status))
        .layer(axum::middleware::from_fn(middleware::request_id))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
