//! Health and statistics handlers.

use axum::Json;
use axum::extract::State;

use crate::dto::response::{
    ApiResponse, DetailedHealthResponse, HealthResponse, RealtimeStatsResponse,
};
use crate::state::AppState;

/// GET /health
pub async fn health(State(state): State<AppState>) -> Json<ApiResponse<HealthResponse>> {
    Json(ApiResponse::ok(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.uptime_seconds(),
    }))
}

/// GET /api/health
pub async fn health_detailed(
    State(state): State<AppState>,
) -> Json<ApiResponse<DetailedHealthResponse>> {
    let sessions = &state.realtime.sessions;

    Json(ApiResponse::ok(DetailedHealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.uptime_seconds(),
        ws_connections: sessions.connection_count(),
        pending_auth: sessions.pending_auth_count(),
        online_users: sessions.user_count().await,
        active_rooms: sessions.room_count().await,
    }))
}

/// GET /api/realtime/stats
pub async fn realtime_stats(
    State(state): State<AppState>,
) -> Json<ApiResponse<RealtimeStatsResponse>> {
    Json(ApiResponse::ok(RealtimeStatsResponse {
        metrics: state.realtime.metrics.snapshot(),
        rooms: state.realtime.sessions.online_counts().await,
    }))
}
