use axum::{
    body::to_bytes,
    extract::Request,
    http::{HeaderValue, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::Instrument;
use uuid::Uuid;

use super::error::GatewayError;
use crate::constants::{DUET_STATUS_HEADER, REQUEST_ID_HEADER};

/// Rejection bodies from axum are short plain-text messages.
const REJECTION_BODY_LIMIT: usize = 4 * 1024;

/// Tags every response with an `x-request-id`, reusing the caller's value when it sent one.
pub async fn request_id(request: Request, next: Next) -> Response {
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .filter(|value| !value.is_empty())
        .cloned()
        .unwrap_or_else(|| {
            HeaderValue::from_str(&Uuid::new_v4().to_string())
                .unwrap_or(HeaderValue::from_static("invalid"))
        });

    let span = tracing::info_span!(
        "request",
        request_id = %request_id.to_str().unwrap_or("invalid")
    );

    let mut response = next.run(request).instrument(span).await;
    response.headers_mut().insert(REQUEST_ID_HEADER, request_id);
    response
}

/// Rewrites error responses that bypassed [`GatewayError`] (413, 405, extractor
/// rejections) into the JSON `{"error", "code"}` shape with an `x-duet-status`.
pub async fn ensure_duet_status(response: Response) -> Response {
    let status = response.status();
    if !(status.is_client_error() || status.is_server_error())
        || response.headers().contains_key(DUET_STATUS_HEADER)
    {
        return response;
    }

    let (parts, body) = response.into_parts();
    let message = to_bytes(body, REJECTION_BODY_LIMIT)
        .await
        .ok()
        .map(|bytes| String::from_utf8_lossy(&bytes).trim().to_string())
        .filter(|text| !text.is_empty())
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("request rejected")
                .to_string()
        });

    let mut rewritten = GatewayError::Rejected { status, message }.into_response();
    if let Some(allow) = parts.headers.get(header::ALLOW) {
        rewritten.headers_mut().insert(header::ALLOW, allow.clone());
    }
    rewritten
}

/// Fallback for paths neither router serves.
pub async fn route_not_found(request: Request) -> GatewayError {
    GatewayError::RouteNotFound(format!("{} {}", request.method(), request.uri().path()))
}
