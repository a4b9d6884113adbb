//! Request logging.
//!
//! Socket upgrades and health probes are frequent and uninteresting, so
//! they log at debug; server errors log at warn.

use std::time::Instant;

use axum::extract::Request;
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::Response;

/// Logs method, path, status, and latency of every request.
pub async fn request_logging(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_owned();
    let started = Instant::now();

    let response = next.run(request).await;

    let status = response.status();
    let latency_ms = started.elapsed().as_millis() as u64;

    if status.is_server_error() {
        tracing::warn!(%method, %path, status = status.as_u16(), latency_ms, "Request failed");
    } else if status == StatusCode::SWITCHING_PROTOCOLS || path.ends_with("/health") {
        tracing::debug!(%method, %path, status = status.as_u16(), latency_ms, "Request");
    } else {
        tracing::info!(%method, %path, status = status.as_u16(), latency_ms, "Request");
    }

    response
}
