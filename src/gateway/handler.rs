use std::sync::Arc;

use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde::{Serialize, de::DeserializeOwned};
use tracing::{debug, instrument};

use crate::constants::{DUET_STATUS_HEADER, STATUS_OK};
use crate::embedding::device::device_label;
use crate::embedding::{PairScorer, ServedModel, TextEmbedder};
use crate::gateway::error::GatewayError;
use crate::gateway::payload::{
    EmbedRequest, EmbedResponse, HealthResponse, RerankRequest, RerankResponse,
};
use crate::gateway::state::HandlerState;
use crate::lifecycle::ModelStatus;

#[instrument(
    skip(state, body),
    fields(texts = tracing::field::Empty, batch_size = tracing::field::Empty)
)]
pub async fn embed_handler<E>(
    State(state): State<HandlerState<E>>,
    body: Bytes,
) -> Result<Response, GatewayError>
where
    E: TextEmbedder,
{
    let request: EmbedRequest = parse_body(&body)?;
    state.limits.check_inputs("texts", request.texts.len())?;
    let batch_size = state.limits.batch_size(request.batch_size)?;
    let model = ready_model(&state)?;

    let expected = request.texts.len();
    let span = tracing::Span::current();
    span.record("texts", expected);
    span.record("batch_size", batch_size);

    let EmbedRequest {
        instruction,
        texts,
        normalize,
        ..
    } = request;

    let embeddings = tokio::task::spawn_blocking(move || {
        model.embed_batch(&instruction, &texts, normalize, batch_size)
    })
    .await
    .map_err(|e| GatewayError::InternalError(format!("embedding task failed: {}", e)))??;

    if embeddings.len() != expected {
        return Err(GatewayError::InternalError(format!(
            "model returned {} embeddings for {} texts",
            embeddings.len(),
            expected
        )));
    }

    debug!(count = embeddings.len(), "Embedded texts");
    Ok(ok_response(EmbedResponse { embeddings }))
}

#[instrument(
    skip(state, body),
    fields(candidates = tracing::field::Empty, batch_size = tracing::field::Empty)
)]
pub async fn rerank_handler<R>(
    State(state): State<HandlerState<R>>,
    body: Bytes,
) -> Result<Response, GatewayError>
where
    R: PairScorer,
{
    let request: RerankRequest = parse_body(&body)?;
    state
        .limits
        .check_inputs("candidates", request.candidates.len())?;
    let batch_size = state.limits.batch_size(request.batch_size)?;
    let model = ready_model(&state)?;

    let expected = request.candidates.len();
    let span = tracing::Span::current();
    span.record("candidates", expected);
    span.record("batch_size", batch_size);

    let RerankRequest {
        query, candidates, ..
    } = request;

    let scores =
        tokio::task::spawn_blocking(move || model.score_batch(&query, &candidates, batch_size))
            .await
            .map_err(|e| GatewayError::InternalError(format!("reranking task failed: {}", e)))??;

    if scores.len() != expected {
        return Err(GatewayError::InternalError(format!(
            "model returned {} scores for {} candidates",
            scores.len(),
            expected
        )));
    }

    debug!(count = scores.len(), "Scored candidates");
    Ok(ok_response(RerankResponse { scores }))
}

/// Readiness: `200` once the model is loaded, `503` otherwise.
#[instrument(skip(state))]
pub async fn health_handler<M>(State(state): State<HandlerState<M>>) -> Response
where
    M: ServedModel,
{
    let status = state.model.status();

    let (since, model) = match (&status, state.model.get()) {
        (ModelStatus::Ready { since }, Some(model)) => (*since, model),
        _ => {
            let label = status.as_str();
            return (
                StatusCode::SERVICE_UNAVAILABLE,
                status_headers(label),
                Json(HealthResponse::bare(label)),
            )
                .into_response();
        }
    };

    let body = HealthResponse {
        status: STATUS_OK,
        device: Some(device_label(model.device())),
        model: Some(model.model_name().to_string()),
        mode: Some(if model.is_stub() { "stub" } else { "model" }),
        dimension: model.dimension(),
        ready_since: Some(since.to_rfc3339()),
    };

    ok_response(body)
}

/// Liveness: `200` whenever the process is serving HTTP, loaded or not.
pub async fn livez_handler() -> Response {
    ok_response(HealthResponse::bare(STATUS_OK))
}

fn parse_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, GatewayError> {
    serde_json::from_slice(body)
        .map_err(|e| GatewayError::InvalidRequest(format!("Invalid request body: {}", e)))
}

fn ready_model<M>(state: &HandlerState<M>) -> Result<Arc<M>, GatewayError> {
    state.model.get().ok_or_else(|| {
        GatewayError::ModelNotReady(format!("model is {}", state.model.status().as_str()))
    })
}

fn status_headers(status: &'static str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(DUET_STATUS_HEADER, HeaderValue::from_static(status));
    headers
}

fn ok_response<T: Serialize>(body: T) -> Response {
    (StatusCode::OK, status_headers(STATUS_OK), Json(body)).into_response()
}
