//! Response DTOs.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use coursechat_core::types::RoomId;
use coursechat_realtime::metrics::MetricsSnapshot;

/// Standard success response wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T: Serialize> {
    /// Whether the request was successful.
    pub success: bool,
    /// Response data.
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Creates a successful response.
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Liveness response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service status.
    pub status: String,
    /// Service version.
    pub version: String,
    /// Uptime in seconds.
    pub uptime_seconds: u64,
}

/// Health response with coordinator counts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetailedHealthResponse {
    /// Service status.
    pub status: String,
    /// Service version.
    pub version: String,
    /// Uptime in seconds.
    pub uptime_seconds: u64,
    /// Open WebSocket connections.
    pub ws_connections: usize,
    /// Connections still waiting for `authenticate`.
    pub pending_auth: usize,
    /// Authenticated users.
    pub online_users: usize,
    /// Rooms with at least one member.
    pub active_rooms: usize,
}

/// Coordinator statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealtimeStatsResponse {
    /// Metric counters.
    pub metrics: MetricsSnapshot,
    /// Online count per active room.
    pub rooms: BTreeMap<RoomId, usize>,
}
