//! Application state shared across all handlers and middleware.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use coursechat_core::config::AppConfig;
use coursechat_realtime::server::RealtimeEngine;

/// Application state passed to every Axum handler via `State<AppState>`.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<AppConfig>,
    /// Realtime coordinator
    pub realtime: Arc<RealtimeEngine>,
    /// Process start time
    pub started_at: DateTime<Utc>,
}

impl AppState {
    /// Creates the state for a freshly started server.
    pub fn new(config: AppConfig, realtime: RealtimeEngine) -> Self {
        Self {
            config: Arc::new(config),
            realtime: Arc::new(realtime),
            started_at: Utc::now(),
        }
    }

    /// Seconds since the server started.
    pub fn uptime_seconds(&self) -> u64 {
        (Utc::now() - self.started_at).num_seconds().max(0) as u64
    }
}
