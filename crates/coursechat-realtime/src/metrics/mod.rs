//! Coordinator metrics.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Coordinator-level counters.
#[derive(Debug, Default)]
pub struct RealtimeMetrics {
    /// Total connections opened
    pub connections_total: AtomicU64,
    /// Connections currently open
    pub connections_active: AtomicU64,
    /// Successful authentications
    pub authentications: AtomicU64,
    /// Connections replaced by a newer one for the same user
    pub sessions_superseded: AtomicU64,
    /// Inbound events received
    pub events_received: AtomicU64,
    /// Inbound events rejected
    pub events_rejected: AtomicU64,
    /// Chat messages accepted
    pub messages_broadcast: AtomicU64,
    /// Events queued on a recipient connection by fan-out
    pub deliveries: AtomicU64,
    /// Fan-out recipients skipped (no live connection or queue unavailable)
    pub deliveries_skipped: AtomicU64,
    /// Notifications delivered live
    pub notifications_live: AtomicU64,
    /// Notifications handed to the notification store
    pub notifications_handed_off: AtomicU64,
    /// Collaborator calls that failed
    pub store_failures: AtomicU64,
}

impl RealtimeMetrics {
    /// Create new zeroed metrics
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new connection
    pub fn record_connect(&self) {
        self.connections_total.fetch_add(1, Ordering::Relaxed);
        self.connections_active.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a disconnection
    pub fn record_disconnect(&self) {
        self.connections_active.fetch_sub(1, Ordering::Relaxed);
    }

    /// Record a fan-out result
    pub fn record_fan_out(&self, delivered: usize, skipped: usize) {
        self.deliveries.fetch_add(delivered as u64, Ordering::Relaxed);
        self.deliveries_skipped
            .fetch_add(skipped as u64, Ordering::Relaxed);
    }

    /// Increment a counter
    pub fn inc(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Get a snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            connections_total: self.connections_total.load(Ordering::Relaxed),
            connections_active: self.connections_active.load(Ordering::Relaxed),
            authentications: self.authentications.load(Ordering::Relaxed),
            sessions_superseded: self.sessions_superseded.load(Ordering::Relaxed),
            events_received: self.events_received.load(Ordering::Relaxed),
            events_rejected: self.events_rejected.load(Ordering::Relaxed),
            messages_broadcast: self.messages_broadcast.load(Ordering::Relaxed),
            deliveries: self.deliveries.load(Ordering::Relaxed),
            deliveries_skipped: self.deliveries_skipped.load(Ordering::Relaxed),
            notifications_live: self.notifications_live.load(Ordering::Relaxed),
            notifications_handed_off: self.notifications_handed_off.load(Ordering::Relaxed),
            store_failures: self.store_failures.load(Ordering::Relaxed),
        }
    }
}

/// Serializable metrics snapshot
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    /// Total connections ever opened
    pub connections_total: u64,
    /// Currently open connections
    pub connections_active: u64,
    /// Successful authentications
    pub authentications: u64,
    /// Superseded connections
    pub sessions_superseded: u64,
    /// Inbound events received
    pub events_received: u64,
    /// Inbound events rejected
    pub events_rejected: u64,
    /// Chat messages accepted
    pub messages_broadcast: u64,
    /// Fan-out deliveries
    pub deliveries: u64,
    /// Fan-out recipients skipped
    pub deliveries_skipped: u64,
    /// Notifications delivered live
    pub notifications_live: u64,
    /// Notifications handed off for offline users
    pub notifications_handed_off: u64,
    /// Failed collaborator calls
    pub store_failures: u64,
}
