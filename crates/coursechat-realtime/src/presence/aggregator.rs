//! Presence aggregator: per-room online counts.
//!
//! A room's count is the size of its member set. Counts are published while
//! the mutation that changed them still holds the presence lock, so for any
//! room the emitted counts follow mutation order and the last one matches
//! the settled index.

use std::collections::BTreeMap;

use coursechat_core::types::RoomId;

use crate::broadcast::router::{BroadcastRouter, FanOut};
use crate::message::types::ServerEvent;
use crate::session::state::PresenceState;

/// Computes and publishes `online_users_update` events.
#[derive(Debug, Clone)]
pub struct PresenceAggregator {
    router: BroadcastRouter,
}

impl PresenceAggregator {
    /// Creates an aggregator publishing through `router`.
    pub fn new(router: BroadcastRouter) -> Self {
        Self { router }
    }

    /// Online count of a room.
    pub fn count_of(&self, state: &PresenceState, room: &RoomId) -> usize {
        state.rooms.count_of(room)
    }

    /// Publishes the current count of `room` to every member.
    ///
    /// A room that just emptied has nobody to tell.
    pub fn publish(&self, state: &PresenceState, room: &RoomId) -> FanOut {
        let count = state.rooms.count_of(room);
        tracing::trace!(room_id = %room, count, "Publishing presence");
        self.router
            .broadcast(state, room, &ServerEvent::room_count(room.clone(), count), None)
    }

    /// Publishes counts for several rooms.
    pub fn publish_all<'a>(
        &self,
        state: &PresenceState,
        rooms: impl IntoIterator<Item = &'a RoomId>,
    ) {
        for room in rooms {
            self.publish(state, room);
        }
    }

    /// Counts of every active room.
    pub fn snapshot(&self, state: &PresenceState) -> BTreeMap<RoomId, usize> {
        state.rooms.counts()
    }
}
