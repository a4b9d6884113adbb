//! The locked presence state shared by every session.

use std::sync::Arc;

use tokio::sync::RwLock;

use crate::connection::registry::ConnectionRegistry;
use crate::room::index::RoomIndex;

/// Identity bindings and room memberships.
///
/// Both live behind one lock so that a binding change and the membership
/// changes it implies are observed together.
#[derive(Debug, Default)]
pub struct PresenceState {
    /// Connection ↔ identity bindings.
    pub registry: ConnectionRegistry,
    /// User ↔ room memberships.
    pub rooms: RoomIndex,
}

impl PresenceState {
    /// Creates an empty state.
    pub fn new() -> Self {
        Self::default()
    }
}

/// Presence state shared across tasks.
pub type SharedPresence = Arc<RwLock<PresenceState>>;
