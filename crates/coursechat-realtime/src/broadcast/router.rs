//! Room fan-out.

use std::sync::Arc;

use coursechat_core::types::{RoomId, UserId};

use crate::message::types::ServerEvent;
use crate::metrics::RealtimeMetrics;
use crate::session::state::PresenceState;

/// Result of a fan-out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FanOut {
    /// Recipients whose queue accepted the event.
    pub delivered: usize,
    /// Recipients without a live connection or with an unavailable queue.
    pub skipped: usize,
}

/// Sends events to the current connections of room members.
///
/// Callers hold the presence lock (read or downgraded write guard) and pass
/// the state in. Sends never wait, so fan-out time is bounded by the member
/// count.
#[derive(Debug, Clone)]
pub struct BroadcastRouter {
    metrics: Arc<RealtimeMetrics>,
}

impl BroadcastRouter {
    /// Creates a router that records into `metrics`.
    pub fn new(metrics: Arc<RealtimeMetrics>) -> Self {
        Self { metrics }
    }

    /// Sends `event` to every member of `room` except `exclude`.
    ///
    /// A recipient that cannot take the event is skipped; the remaining
    /// recipients are still served.
    pub fn broadcast(
        &self,
        state: &PresenceState,
        room: &RoomId,
        event: &ServerEvent,
        exclude: Option<&UserId>,
    ) -> FanOut {
        let mut result = FanOut::default();

        for member in state.rooms.iter_members(room) {
            if exclude == Some(member) {
                continue;
            }
            if self.deliver(state, member, event.clone()) {
                result.delivered += 1;
            } else {
                tracing::debug!(user_id = %member, room_id = %room, "Skipped stale recipient");
                result.skipped += 1;
            }
        }

        self.metrics.record_fan_out(result.delivered, result.skipped);
        result
    }

    /// Sends `event` to the current connection of `user`.
    pub fn send_to_user(&self, state: &PresenceState, user: &UserId, event: ServerEvent) -> bool {
        self.deliver(state, user, event)
    }

    fn deliver(&self, state: &PresenceState, user: &UserId, event: ServerEvent) -> bool {
        state
            .registry
            .connection_of(user)
            .is_some_and(|handle| handle.send(event))
    }
}
