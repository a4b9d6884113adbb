//! Connection registry: binds identities to live connections.
//!
//! Exactly one identity per connection and exactly one live connection per
//! user. Every binding carries a generation number; a later binding for the
//! same user supersedes the earlier one, and cleanup of the earlier
//! connection never touches the newer binding.
//!
//! The registry is a plain data structure. Synchronization is provided by
//! the [`PresenceState`](crate::session::state::PresenceState) lock that owns
//! it.

use std::collections::HashMap;
use std::sync::Arc;

use coursechat_core::types::{ConnectionId, Identity, UserId};

use super::handle::ConnectionHandle;

/// A live identity binding.
#[derive(Debug, Clone)]
struct Binding {
    identity: Identity,
    handle: Arc<ConnectionHandle>,
    generation: u64,
}

/// Current binding of a user.
#[derive(Debug, Clone, Copy)]
struct Current {
    conn_id: ConnectionId,
    generation: u64,
}

/// Result of [`ConnectionRegistry::bind`].
#[derive(Debug)]
pub struct BindOutcome {
    /// Generation assigned to the new binding.
    pub generation: u64,
    /// The user's previous connection, now orphaned.
    pub superseded: Option<Arc<ConnectionHandle>>,
    /// Identity previously bound to this connection under a different user.
    pub displaced: Option<Identity>,
}

/// Connection ↔ identity registry.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    by_connection: HashMap<ConnectionId, Binding>,
    by_user: HashMap<UserId, Current>,
    next_generation: u64,
}

impl ConnectionRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `identity` to `handle`.
    ///
    /// A previous connection of the same user is orphaned and returned in
    /// [`BindOutcome::superseded`]. If this connection was bound to another
    /// user, that identity is unbound and returned in
    /// [`BindOutcome::displaced`].
    pub fn bind(&mut self, handle: Arc<ConnectionHandle>, identity: Identity) -> BindOutcome {
        self.next_generation += 1;
        let generation = self.next_generation;
        let conn_id = handle.id;
        let user_id = identity.user_id.clone();

        let displaced = match self.by_connection.remove(&conn_id) {
            Some(previous) if previous.identity.user_id != user_id => {
                self.by_user.remove(&previous.identity.user_id);
                Some(previous.identity)
            }
            _ => None,
        };

        let superseded = match self.by_user.get(&user_id) {
            Some(current) if current.conn_id != conn_id => self
                .by_connection
                .remove(&current.conn_id)
                .map(|binding| binding.handle),
            _ => None,
        };

        self.by_user.insert(
            user_id,
            Current {
                conn_id,
                generation,
            },
        );
        self.by_connection.insert(
            conn_id,
            Binding {
                identity,
                handle,
                generation,
            },
        );

        BindOutcome {
            generation,
            superseded,
            displaced,
        }
    }

    /// Identity bound to a connection.
    pub fn identity_of(&self, conn_id: &ConnectionId) -> Option<&Identity> {
        self.by_connection.get(conn_id).map(|b| &b.identity)
    }

    /// Live connection of a user.
    pub fn connection_of(&self, user_id: &UserId) -> Option<&Arc<ConnectionHandle>> {
        let current = self.by_user.get(user_id)?;
        self.by_connection
            .get(&current.conn_id)
            .filter(|b| b.generation == current.generation)
            .map(|b| &b.handle)
    }

    /// Generation of a user's current binding.
    pub fn generation_of(&self, user_id: &UserId) -> Option<u64> {
        self.by_user.get(user_id).map(|c| c.generation)
    }

    /// Whether `conn_id` holds the current binding of its user.
    pub fn is_current(&self, conn_id: &ConnectionId) -> bool {
        self.by_connection.get(conn_id).is_some_and(|b| {
            self.by_user
                .get(&b.identity.user_id)
                .is_some_and(|c| c.conn_id == *conn_id && c.generation == b.generation)
        })
    }

    /// Removes the binding of `conn_id`.
    ///
    /// Returns the identity only when this connection held the user's
    /// current binding; orphaned or unknown connections yield `None`.
    /// Idempotent.
    pub fn unbind(&mut self, conn_id: &ConnectionId) -> Option<Identity> {
        let binding = self.by_connection.remove(conn_id)?;
        let user_id = &binding.identity.user_id;

        match self.by_user.get(user_id) {
            Some(current) if current.conn_id == *conn_id && current.generation == binding.generation => {
                self.by_user.remove(user_id);
                Some(binding.identity)
            }
            _ => None,
        }
    }

    /// Number of bound connections.
    pub fn len(&self) -> usize {
        self.by_connection.len()
    }

    /// Whether no connection is bound.
    pub fn is_empty(&self) -> bool {
        self.by_connection.is_empty()
    }
}
