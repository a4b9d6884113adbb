//! Individual WebSocket connection handle.

use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::{RwLock, mpsc};
use tokio::time::Instant;
use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};

use coursechat_core::types::ConnectionId;

use crate::message::types::ServerEvent;

/// A handle to a single transport connection.
///
/// Holds the sender half of the connection's outbound queue plus liveness
/// and activity metadata. The identity bound to the connection lives in the
/// [`ConnectionRegistry`](super::registry::ConnectionRegistry), not here.
#[derive(Debug)]
pub struct ConnectionHandle {
    /// Unique connection ID
    pub id: ConnectionId,
    /// Sender for outbound events
    sender: mpsc::Sender<ServerEvent>,
    /// Monotonic open time, used for timeouts
    opened: Instant,
    /// Last inbound activity
    last_activity: RwLock<Instant>,
    /// Set once an identity has been bound
    authenticated: AtomicBool,
    /// Cancelled when the connection is closed
    cancel: CancellationToken,
}

impl ConnectionHandle {
    /// Create a new connection handle
    pub fn new(sender: mpsc::Sender<ServerEvent>) -> Self {
        let now = Instant::now();
        Self {
            id: ConnectionId::new(),
            sender,
            opened: now,
            last_activity: RwLock::new(now),
            authenticated: AtomicBool::new(false),
            cancel: CancellationToken::new(),
        }
    }

    /// Queue an outbound event without waiting.
    ///
    /// Returns `false` when the connection is closed or its queue is full.
    pub fn send(&self, event: ServerEvent) -> bool {
        if !self.is_alive() {
            return false;
        }
        match self.sender.try_send(event) {
            Ok(_) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!(conn_id = %self.id, "Send buffer full, dropping event");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                self.close();
                false
            }
        }
    }

    /// Check if the connection is still open
    pub fn is_alive(&self) -> bool {
        !self.cancel.is_cancelled()
    }

    /// Close the connection and cancel its pending work. Idempotent.
    pub fn close(&self) {
        self.cancel.cancel();
    }

    /// Resolves once the connection has been closed.
    pub fn closed(&self) -> WaitForCancellationFuture<'_> {
        self.cancel.cancelled()
    }

    /// Whether an identity is currently bound to this connection
    pub fn is_authenticated(&self) -> bool {
        self.authenticated.load(Ordering::SeqCst)
    }

    pub(crate) fn set_authenticated(&self, value: bool) {
        self.authenticated.store(value, Ordering::SeqCst);
    }

    /// Update last activity timestamp
    pub async fn touch(&self) {
        let mut la = self.last_activity.write().await;
        *la = Instant::now();
    }

    /// Time since the connection opened
    pub fn age(&self) -> std::time::Duration {
        self.opened.elapsed()
    }

    /// Time since the last inbound activity
    pub async fn idle_for(&self) -> std::time::Duration {
        self.last_activity.read().await.elapsed()
    }
}
