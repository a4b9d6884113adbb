//! Every open transport connection, authenticated or not.
//!
//! The pool is what `disconnect` and shutdown act on. Which user a
//! connection speaks for is tracked separately by the registry inside the
//! locked presence state.

use std::sync::Arc;

use dashmap::DashMap;

use coursechat_core::types::ConnectionId;

use super::handle::ConnectionHandle;

/// Open connections keyed by id.
#[derive(Debug, Default)]
pub struct ConnectionPool {
    open: DashMap<ConnectionId, Arc<ConnectionHandle>>,
}

impl ConnectionPool {
    /// Creates an empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Tracks a newly opened connection.
    pub fn insert(&self, handle: Arc<ConnectionHandle>) {
        self.open.insert(handle.id, handle);
    }

    /// Stops tracking a connection. Only the first call for an id returns
    /// the handle.
    pub fn take(&self, conn_id: &ConnectionId) -> Option<Arc<ConnectionHandle>> {
        self.open.remove(conn_id).map(|(_, handle)| handle)
    }

    /// Handle of an open connection.
    pub fn lookup(&self, conn_id: &ConnectionId) -> Option<Arc<ConnectionHandle>> {
        self.open.get(conn_id).map(|entry| Arc::clone(entry.value()))
    }

    /// Number of open connections.
    pub fn len(&self) -> usize {
        self.open.len()
    }

    /// Whether no connection is open.
    pub fn is_empty(&self) -> bool {
        self.open.is_empty()
    }

    /// Open connections that have not bound an identity.
    pub fn unauthenticated(&self) -> usize {
        self.open
            .iter()
            .filter(|entry| !entry.value().is_authenticated())
            .count()
    }

    /// Ids of every open connection.
    pub fn ids(&self) -> Vec<ConnectionId> {
        self.open.iter().map(|entry| *entry.key()).collect()
    }
}
