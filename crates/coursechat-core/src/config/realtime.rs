//! Real-time coordinator configuration.

use serde::{Deserialize, Serialize};

/// Real-time (WebSocket) coordinator configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealtimeConfig {
    /// Per-connection outbound queue capacity.
    #[serde(default = "default_outbound_buffer")]
    pub outbound_buffer_size: usize,
    /// Largest inbound frame accepted, in bytes.
    #[serde(default = "default_max_frame_bytes")]
    pub max_frame_bytes: usize,
    /// Longest chat message text accepted, in characters.
    #[serde(default = "default_max_text_length")]
    pub max_text_length: usize,
    /// Maximum number of rooms a single user may be joined to.
    #[serde(default = "default_max_rooms_per_user")]
    pub max_rooms_per_user: usize,
    /// Close a connection once another connection authenticates as the same user.
    #[serde(default = "default_true")]
    pub close_superseded: bool,
    /// Interval between server pings, in seconds.
    #[serde(default = "default_ping_interval")]
    pub ping_interval_seconds: u64,
    /// Connections that have not authenticated after this many seconds are dropped.
    #[serde(default = "default_auth_timeout")]
    pub auth_timeout_seconds: u64,
    /// Connections with no inbound traffic for this many seconds are dropped.
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_seconds: u64,
    /// Notification fan-out settings.
    #[serde(default)]
    pub notifications: NotificationRealtimeConfig,
    /// In-memory chat history settings.
    #[serde(default)]
    pub history: HistoryConfig,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            outbound_buffer_size: default_outbound_buffer(),
            max_frame_bytes: default_max_frame_bytes(),
            max_text_length: default_max_text_length(),
            max_rooms_per_user: default_max_rooms_per_user(),
            close_superseded: true,
            ping_interval_seconds: default_ping_interval(),
            auth_timeout_seconds: default_auth_timeout(),
            idle_timeout_seconds: default_idle_timeout(),
            notifications: NotificationRealtimeConfig::default(),
            history: HistoryConfig::default(),
        }
    }
}

/// Notification delivery settings for the coordinator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationRealtimeConfig {
    /// Whether chat messages fan out a notification to every other room member.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Whether notifications for offline users are handed to the notification store.
    #[serde(default = "default_true")]
    pub hand_off_offline: bool,
    /// Maximum queued notifications per user in the in-memory store.
    #[serde(default = "default_max_stored")]
    pub max_stored_per_user: usize,
}

impl Default for NotificationRealtimeConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            hand_off_offline: true,
            max_stored_per_user: default_max_stored(),
        }
    }
}

/// In-memory chat history settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Messages retained per room by the in-memory message store.
    #[serde(default = "default_max_messages_per_room")]
    pub max_messages_per_room: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_messages_per_room: default_max_messages_per_room(),
        }
    }
}

fn default_outbound_buffer() -> usize {
    256
}

fn default_max_frame_bytes() -> usize {
    65_536
}

fn default_max_text_length() -> usize {
    4000
}

fn default_max_rooms_per_user() -> usize {
    100
}

fn default_ping_interval() -> u64 {
    25
}

fn default_auth_timeout() -> u64 {
    30
}

fn default_idle_timeout() -> u64 {
    120
}

fn default_true() -> bool {
    true
}

fn default_max_stored() -> usize {
    500
}

fn default_max_messages_per_room() -> usize {
    200
}
