use axum::{
    Json,
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::constants::{
    DUET_STATUS_HEADER, STATUS_INFERENCE_ERROR, STATUS_INTERNAL_ERROR, STATUS_INVALID_REQUEST,
    STATUS_NOT_READY,
};
use crate::embedding::{EmbeddingError, RerankerError};

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("model not ready: {0}")]
    ModelNotReady(String),

    #[error("embedding failed: {0}")]
    EmbeddingFailed(#[from] EmbeddingError),

    #[error("reranking failed: {0}")]
    RerankingFailed(#[from] RerankerError),

    #[error("internal error: {0}")]
    InternalError(String),

    #[error("no route for {0}")]
    RouteNotFound(String),

    /// A response produced by axum itself (body limit, method mismatch) rather than a handler.
    #[error("request rejected: {message}")]
    Rejected { status: StatusCode, message: String },
}

#[derive(serde::Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
}

impl GatewayError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            GatewayError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            GatewayError::ModelNotReady(_) => StatusCode::SERVICE_UNAVAILABLE,
            GatewayError::EmbeddingFailed(_)
            | GatewayError::RerankingFailed(_)
            | GatewayError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            GatewayError::RouteNotFound(_) => StatusCode::NOT_FOUND,
            GatewayError::Rejected { status, .. } => *status,
        }
    }

    /// Value of the `x-duet-status` header for this error.
    pub fn duet_status(&self) -> &'static str {
        match self {
            GatewayError::InvalidRequest(_) => STATUS_INVALID_REQUEST,
            GatewayError::ModelNotReady(_) => STATUS_NOT_READY,
            GatewayError::EmbeddingFailed(_) | GatewayError::RerankingFailed(_) => {
                STATUS_INFERENCE_ERROR
            }
            GatewayError::InternalError(_) => STATUS_INTERNAL_ERROR,
            GatewayError::RouteNotFound(_) => STATUS_INVALID_REQUEST,
            GatewayError::Rejected { status, .. } if status.is_server_error() => {
                STATUS_INTERNAL_ERROR
            }
            GatewayError::Rejected { .. } => STATUS_INVALID_REQUEST,
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        } else {
            tracing::debug!(error = %self, "Request rejected");
        }

        let mut headers = HeaderMap::new();
        headers.insert(
            DUET_STATUS_HEADER,
            HeaderValue::from_static(self.duet_status()),
        );

        let body = Json(ErrorResponse {
            error: self.to_string(),
            code: status.as_u16(),
        });

        (status, headers, body).into_response()
    }
}
