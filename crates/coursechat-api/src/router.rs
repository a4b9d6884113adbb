//! Route definitions for the CourseChat HTTP API.

use axum::{Router, middleware as axum_middleware, routing::get};

use crate::handlers;
use crate::middleware;
use crate::state::AppState;

/// Build the router with all routes and the request logging middleware.
///
/// The WebSocket endpoint is mounted at `server.socket_path`.
pub fn build_router(state: AppState) -> Router {
    let socket_path = state.config.server.socket_path.clone();

    Router::new()
        .route("/health", get(handlers::health::health))
        .route("/api/health", get(handlers::health::health_detailed))
        .route("/api/realtime/stats", get(handlers::health::realtime_stats))
        .route(&socket_path, get(handlers::ws::ws_upgrade))
        .layer(axum_middleware::from_fn(middleware::logging::request_logging))
        .with_state(state)
}
