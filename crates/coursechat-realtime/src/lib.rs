//! # coursechat-realtime
//!
//! Real-time presence and room-broadcast coordinator for per-course chat.
//! Provides:
//!
//! - Connection registry with reconnect-wins identity binding
//! - Bidirectional room membership index
//! - Per-room online counts published in mutation order
//! - Room fan-out for chat messages and typing indicators
//! - Per-user notifications with hand-off for offline users
//! - Session lifecycle management and keepalive

pub mod broadcast;
pub mod connection;
pub mod message;
pub mod metrics;
pub mod notification;
pub mod presence;
pub mod room;
pub mod server;
pub mod session;
pub mod store;

pub use broadcast::BroadcastRouter;
pub use connection::ConnectionHandle;
pub use notification::NotificationDispatcher;
pub use presence::PresenceAggregator;
pub use room::RoomIndex;
pub use server::RealtimeEngine;
pub use session::{SessionError, SessionManager};
