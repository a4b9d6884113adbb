//! Session lifecycle manager: drives every connection from open to close.
//!
//! Per connection: `Unauthenticated → Authenticated (0..N rooms) →
//! Disconnected`. All registry and index mutations go through the write
//! guard of the shared presence state; the guard is then downgraded so that
//! presence publication and fan-out observe exactly the state the mutation
//! produced. Collaborator calls run after the guard is released.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use tokio::sync::{RwLock, mpsc};
use tracing::{debug, error, info, warn};

use coursechat_core::config::RealtimeConfig;
use coursechat_core::traits::{MessageStore, NotificationStore};
use coursechat_core::types::{
    ChatMessage, ConnectionId, Identity, NotificationEvent, RoomId, UserId, UserRole,
};

use crate::broadcast::router::BroadcastRouter;
use crate::connection::handle::ConnectionHandle;
use crate::connection::pool::ConnectionPool;
use crate::message::serializer::deserialize_inbound;
use crate::message::types::{
    AuthenticatePayload, ClientEvent, RoomPayload, SendMessagePayload, ServerEvent, TypingPayload,
    TypingState,
};
use crate::message::validator::{
    validate_frame, validate_message_body, validate_room_id, validate_user_id,
};
use crate::metrics::RealtimeMetrics;
use crate::notification::dispatcher::{NotificationDispatcher, Routed};
use crate::notification::formatter::chat_message_notification;
use crate::presence::aggregator::PresenceAggregator;

use super::error::{SESSION_SUPERSEDED, SessionError};
use super::state::{PresenceState, SharedPresence};

/// Owns the presence state and applies client events to it.
#[derive(Debug)]
pub struct SessionManager {
    /// Configuration.
    config: RealtimeConfig,
    /// Every open connection, authenticated or not.
    pool: ConnectionPool,
    /// Identity bindings and room memberships.
    state: SharedPresence,
    /// Room fan-out.
    router: BroadcastRouter,
    /// Presence counts.
    presence: PresenceAggregator,
    /// Notification delivery.
    notifications: NotificationDispatcher,
    /// Chat history collaborator.
    messages: Arc<dyn MessageStore>,
    /// Metrics.
    metrics: Arc<RealtimeMetrics>,
}

impl SessionManager {
    /// Creates a session manager with empty state.
    pub fn new(
        config: RealtimeConfig,
        messages: Arc<dyn MessageStore>,
        notification_store: Arc<dyn NotificationStore>,
        metrics: Arc<RealtimeMetrics>,
    ) -> Self {
        let router = BroadcastRouter::new(metrics.clone());
        let presence = PresenceAggregator::new(router.clone());
        let notifications = NotificationDispatcher::new(
            router.clone(),
            notification_store,
            config.notifications.clone(),
            metrics.clone(),
        );

        Self {
            config,
            pool: ConnectionPool::new(),
            state: Arc::new(RwLock::new(PresenceState::new())),
            router,
            presence,
            notifications,
            messages,
            metrics,
        }
    }

    /// Registers a new connection and asks it to authenticate.
    ///
    /// Returns the handle and the receiver the transport drains.
    pub fn connect(&self) -> (Arc<ConnectionHandle>, mpsc::Receiver<ServerEvent>) {
        let (tx, rx) = mpsc::channel(self.config.outbound_buffer_size.max(1));
        let handle = Arc::new(ConnectionHandle::new(tx));

        self.pool.insert(handle.clone());
        self.metrics.record_connect();
        handle.send(ServerEvent::RequestAuth {});

        info!(conn_id = %handle.id, "Connection opened");
        (handle, rx)
    }

    /// Processes one raw inbound frame.
    ///
    /// Any rejection is reported to this connection only.
    pub async fn handle_inbound(&self, conn_id: ConnectionId, raw: &str) {
        let Some(handle) = self.pool.lookup(&conn_id) else {
            warn!(conn_id = %conn_id, "Frame from unknown connection");
            return;
        };

        handle.touch().await;
        RealtimeMetrics::inc(&self.metrics.events_received);

        if let Err(e) = validate_frame(raw, self.config.max_frame_bytes) {
            self.reject(&handle, SessionError::InvalidMessage(e.message));
            return;
        }

        let event = match deserialize_inbound(raw) {
            Ok(event) => event,
            Err(e) => {
                self.reject(
                    &handle,
                    SessionError::InvalidMessage(format!("Failed to parse message: {e}")),
                );
                return;
            }
        };

        let name = event.name();
        if let Err(e) = self.handle_event(conn_id, event).await {
            debug!(conn_id = %conn_id, event = name, code = e.code(), "Event rejected");
            self.reject(&handle, e);
        }
    }

    /// Dispatches a decoded client event.
    pub async fn handle_event(
        &self,
        conn_id: ConnectionId,
        event: ClientEvent,
    ) -> Result<(), SessionError> {
        match event {
            ClientEvent::Authenticate(payload) => self.authenticate(conn_id, payload).await.map(drop),
            ClientEvent::JoinRoom(payload) => self.join(conn_id, payload).await,
            ClientEvent::LeaveRoom(payload) => self.leave(conn_id, payload).await,
            ClientEvent::SendMessage(payload) => self.send_message(conn_id, payload).await.map(drop),
            ClientEvent::TypingStart(payload) => self.typing(conn_id, payload, true).await,
            ClientEvent::TypingStop(payload) => self.typing(conn_id, payload, false).await,
            ClientEvent::Pong { .. } => Ok(()),
        }
    }

    /// Binds an identity to the connection.
    ///
    /// A previous connection of the same user is superseded. If this
    /// connection was bound to another user, that user's memberships are
    /// removed as on disconnect.
    pub async fn authenticate(
        &self,
        conn_id: ConnectionId,
        payload: AuthenticatePayload,
    ) -> Result<Identity, SessionError> {
        let user_id = validate_user_id(payload.user_id.as_deref())?;
        let role = match non_blank(payload.user_role.as_deref()) {
            Some(raw) => raw.parse::<UserRole>().unwrap_or_else(|_| {
                warn!(conn_id = %conn_id, role = raw, "Unknown user role, using default");
                UserRole::default()
            }),
            None => UserRole::default(),
        };
        let display_name = non_blank(payload.user_name.as_deref())
            .map(str::to_string)
            .unwrap_or_else(|| user_id.to_string());
        let identity = Identity::new(user_id, display_name, role);

        let handle = self.live_handle(&conn_id)?;
        let mut state = self.state.write().await;
        if !handle.is_alive() {
            return Err(SessionError::ConnectionClosed);
        }

        let outcome = state.registry.bind(handle.clone(), identity.clone());
        handle.set_authenticated(true);

        let displaced_rooms = match &outcome.displaced {
            Some(previous) => {
                info!(conn_id = %conn_id, user_id = %previous.user_id, "Identity displaced");
                state.rooms.remove_identity(&previous.user_id)
            }
            None => Vec::new(),
        };

        if let Some(old) = &outcome.superseded {
            old.set_authenticated(false);
            old.send(ServerEvent::error(
                SESSION_SUPERSEDED,
                "Another connection authenticated as this user",
            ));
            if self.config.close_superseded {
                old.close();
            }
            RealtimeMetrics::inc(&self.metrics.sessions_superseded);
            info!(
                conn_id = %old.id,
                user_id = %identity.user_id,
                new_conn_id = %conn_id,
                "Connection superseded"
            );
        }

        let state = state.downgrade();
        self.presence.publish_all(&state, &displaced_rooms);
        handle.send(ServerEvent::Authenticated {
            user_id: identity.user_id.clone(),
            user_name: identity.display_name.clone(),
            role: identity.role,
        });
        handle.send(ServerEvent::OnlineUsersUpdate {
            counts: self.presence.snapshot(&state),
        });
        drop(state);

        RealtimeMetrics::inc(&self.metrics.authentications);
        info!(
            conn_id = %conn_id,
            user_id = %identity.user_id,
            role = %identity.role,
            generation = outcome.generation,
            "Connection authenticated"
        );
        Ok(identity)
    }

    /// Adds the connection's user to a room and publishes the new count.
    pub async fn join(&self, conn_id: ConnectionId, payload: RoomPayload) -> Result<(), SessionError> {
        let room = validate_room_id(payload.room_id.as_deref())?;
        let handle = self.live_handle(&conn_id)?;

        let mut state = self.state.write().await;
        let identity = bound_identity(&state, &conn_id)?;
        check_user(payload.user_id.as_deref(), &identity)?;

        let user = &identity.user_id;
        let max_rooms = self.config.max_rooms_per_user;
        if !state.rooms.is_member(user, &room) && state.rooms.room_count_of(user) >= max_rooms {
            return Err(SessionError::RoomLimit(max_rooms));
        }

        let added = state.rooms.join(user, &room);
        let state = state.downgrade();

        handle.send(ServerEvent::RoomJoined {
            room_id: room.clone(),
        });
        if added {
            self.presence.publish(&state, &room);
        } else {
            handle.send(ServerEvent::room_count(
                room.clone(),
                self.presence.count_of(&state, &room),
            ));
        }

        debug!(conn_id = %conn_id, user_id = %user, room_id = %room, added, "Joined room");
        Ok(())
    }

    /// Removes the connection's user from a room and publishes the new count.
    pub async fn leave(&self, conn_id: ConnectionId, payload: RoomPayload) -> Result<(), SessionError> {
        let room = validate_room_id(payload.room_id.as_deref())?;
        let handle = self.live_handle(&conn_id)?;

        let mut state = self.state.write().await;
        let identity = bound_identity(&state, &conn_id)?;
        check_user(payload.user_id.as_deref(), &identity)?;

        let removed = state.rooms.leave(&identity.user_id, &room);
        let state = state.downgrade();

        if removed {
            self.presence.publish(&state, &room);
        }
        handle.send(ServerEvent::RoomLeft {
            room_id: room.clone(),
        });

        debug!(
            conn_id = %conn_id,
            user_id = %identity.user_id,
            room_id = %room,
            removed,
            "Left room"
        );
        Ok(())
    }

    /// Posts a chat message to a room.
    ///
    /// Every other member receives `new_message` and one notification. The
    /// message is persisted after fan-out; a persistence failure is logged
    /// and does not reject the message.
    pub async fn send_message(
        &self,
        conn_id: ConnectionId,
        payload: SendMessagePayload,
    ) -> Result<ChatMessage, SessionError> {
        let room = validate_room_id(payload.room_id.as_deref())?;
        let (text, image_url) = validate_message_body(
            payload.body(),
            payload.image_url.as_deref(),
            self.config.max_text_length,
        )?;
        let handle = self.live_handle(&conn_id)?;

        let (message, offline) = {
            let state = self.state.read().await;
            let identity = bound_identity(&state, &conn_id)?;
            check_user(payload.sender_id.as_deref(), &identity)?;
            if !state.rooms.is_member(&identity.user_id, &room) {
                return Err(SessionError::NotMember(room.to_string()));
            }

            let message = ChatMessage::new(room.clone(), &identity, text, image_url);
            let fan_out = self.router.broadcast(
                &state,
                &room,
                &ServerEvent::NewMessage(message.clone()),
                Some(&identity.user_id),
            );

            let mut offline = Vec::new();
            if self.notifications.enabled() {
                for member in state.rooms.iter_members(&room) {
                    if *member == identity.user_id {
                        continue;
                    }
                    let event = chat_message_notification(member.clone(), &message);
                    if let Routed::Offline(event) = self.notifications.route(&state, event) {
                        offline.push(event);
                    }
                }
            }

            debug!(
                conn_id = %conn_id,
                room_id = %room,
                message_id = %message.id,
                delivered = fan_out.delivered,
                skipped = fan_out.skipped,
                "Message fanned out"
            );
            (message, offline)
        };

        self.notifications.hand_off(offline).await;

        if let Err(e) = self.messages.persist(&message).await {
            RealtimeMetrics::inc(&self.metrics.store_failures);
            error!(
                message_id = %message.id,
                room_id = %message.room_id,
                store = self.messages.store_type(),
                error = %e,
                "Failed to persist message"
            );
        }

        handle.send(ServerEvent::MessageAccepted {
            message_id: message.id,
            room_id: message.room_id.clone(),
            timestamp: message.timestamp,
        });
        RealtimeMetrics::inc(&self.metrics.messages_broadcast);
        Ok(message)
    }

    /// Relays a typing indicator to the other members of a room.
    ///
    /// The sender need not be a member of the room.
    pub async fn typing(
        &self,
        conn_id: ConnectionId,
        payload: TypingPayload,
        is_typing: bool,
    ) -> Result<(), SessionError> {
        let room = validate_room_id(payload.room_id.as_deref())?;
        self.live_handle(&conn_id)?;

        let state = self.state.read().await;
        let identity = bound_identity(&state, &conn_id)?;
        check_user(payload.user_id.as_deref(), &identity)?;

        let event = ServerEvent::UserTyping(TypingState {
            room_id: room.clone(),
            user_id: identity.user_id.clone(),
            user_name: identity.display_name.clone(),
            is_typing,
        });
        self.router
            .broadcast(&state, &room, &event, Some(&identity.user_id));
        Ok(())
    }

    /// Closes a connection and removes its identity from every room.
    ///
    /// Returns `false` when the connection was already gone. A superseded
    /// connection leaves the newer binding and its memberships untouched.
    pub async fn disconnect(&self, conn_id: ConnectionId) -> bool {
        let mut state = self.state.write().await;

        let handle = self.pool.take(&conn_id);
        if let Some(handle) = &handle {
            handle.close();
            handle.set_authenticated(false);
        }

        let identity = state.registry.unbind(&conn_id);
        let rooms = match &identity {
            Some(identity) => state.rooms.remove_identity(&identity.user_id),
            None => Vec::new(),
        };

        let state = state.downgrade();
        self.presence.publish_all(&state, &rooms);
        drop(state);

        if handle.is_some() {
            self.metrics.record_disconnect();
            info!(
                conn_id = %conn_id,
                user_id = identity.as_ref().map(|i| i.user_id.as_str()).unwrap_or("-"),
                rooms_left = rooms.len(),
                "Connection closed"
            );
        }
        handle.is_some()
    }

    /// Disconnects every open connection.
    pub async fn close_all(&self) {
        let ids = self.pool.ids();
        for conn_id in &ids {
            self.disconnect(*conn_id).await;
        }
        info!(count = ids.len(), "All connections closed");
    }

    /// Delivers a notification to a user, or hands it to the store when the
    /// user is offline. Returns `true` when delivered live.
    pub async fn notify(&self, event: NotificationEvent) -> bool {
        self.notifications.notify(&self.state, event).await
    }

    /// Identity bound to a connection.
    pub async fn identity_of(&self, conn_id: ConnectionId) -> Option<Identity> {
        self.state.read().await.registry.identity_of(&conn_id).cloned()
    }

    /// Current connection of a user.
    pub async fn connection_of(&self, user_id: &UserId) -> Option<ConnectionId> {
        self.state
            .read()
            .await
            .registry
            .connection_of(user_id)
            .map(|handle| handle.id)
    }

    /// Members of a room.
    pub async fn members_of(&self, room: &RoomId) -> HashSet<UserId> {
        self.state.read().await.rooms.members_of(room)
    }

    /// Rooms of a user.
    pub async fn rooms_of(&self, user_id: &UserId) -> HashSet<RoomId> {
        self.state.read().await.rooms.rooms_of(user_id)
    }

    /// Online count of a room.
    pub async fn count_of(&self, room: &RoomId) -> usize {
        self.state.read().await.rooms.count_of(room)
    }

    /// Online count of every active room.
    pub async fn online_counts(&self) -> BTreeMap<RoomId, usize> {
        let state = self.state.read().await;
        self.presence.snapshot(&state)
    }

    /// Number of authenticated users.
    pub async fn user_count(&self) -> usize {
        self.state.read().await.registry.len()
    }

    /// Number of active rooms.
    pub async fn room_count(&self) -> usize {
        self.state.read().await.rooms.room_count()
    }

    /// Whether the membership index is internally consistent.
    pub async fn is_consistent(&self) -> bool {
        self.state.read().await.rooms.is_consistent()
    }

    /// Number of open connections.
    pub fn connection_count(&self) -> usize {
        self.pool.len()
    }

    /// Open connections that have not authenticated yet.
    pub fn pending_auth_count(&self) -> usize {
        self.pool.unauthenticated()
    }

    fn live_handle(&self, conn_id: &ConnectionId) -> Result<Arc<ConnectionHandle>, SessionError> {
        self.pool
            .lookup(conn_id)
            .filter(|handle| handle.is_alive())
            .ok_or(SessionError::ConnectionClosed)
    }

    fn reject(&self, handle: &ConnectionHandle, err: SessionError) {
        RealtimeMetrics::inc(&self.metrics.events_rejected);
        handle.send(ServerEvent::error(err.code(), err.to_string()));
    }
}

fn bound_identity(state: &PresenceState, conn_id: &ConnectionId) -> Result<Identity, SessionError> {
    state
        .registry
        .identity_of(conn_id)
        .cloned()
        .ok_or(SessionError::Unauthenticated)
}

/// Payload user fields are only checked against the bound identity.
fn check_user(claimed: Option<&str>, identity: &Identity) -> Result<(), SessionError> {
    match non_blank(claimed) {
        Some(user) if user != identity.user_id.as_str() => Err(SessionError::IdentityMismatch),
        _ => Ok(()),
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
