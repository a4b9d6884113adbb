//! Inbound and outbound WebSocket event definitions.
//!
//! Every frame is a JSON object tagged with `type`; payload field names are
//! camelCase. Inbound payload fields are optional at the serde level so that
//! a missing field surfaces as a typed rejection instead of a decode error.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use coursechat_core::types::{
    ChatMessage, MessageId, NotificationEvent, RoomId, UserId, UserRole,
};

/// Events sent by the client to the server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientEvent {
    /// Bind an identity to this connection.
    Authenticate(AuthenticatePayload),
    /// Join a course room.
    #[serde(alias = "join_course")]
    JoinRoom(RoomPayload),
    /// Leave a course room.
    #[serde(alias = "leave_course")]
    LeaveRoom(RoomPayload),
    /// Post a chat message to a room.
    SendMessage(SendMessagePayload),
    /// The user started typing in a room.
    TypingStart(TypingPayload),
    /// The user stopped typing in a room.
    TypingStop(TypingPayload),
    /// Keepalive response to a server ping.
    Pong {
        /// Echoed server timestamp.
        #[serde(default)]
        timestamp: Option<i64>,
    },
}

impl ClientEvent {
    /// Event name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Authenticate(_) => "authenticate",
            Self::JoinRoom(_) => "join_room",
            Self::LeaveRoom(_) => "leave_room",
            Self::SendMessage(_) => "send_message",
            Self::TypingStart(_) => "typing_start",
            Self::TypingStop(_) => "typing_stop",
            Self::Pong { .. } => "pong",
        }
    }
}

/// `authenticate` payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticatePayload {
    /// User id issued by the identity provider.
    #[serde(default)]
    pub user_id: Option<String>,
    /// `student`, `coach`, or `admin`.
    #[serde(default)]
    pub user_role: Option<String>,
    /// Display name.
    #[serde(default)]
    pub user_name: Option<String>,
}

/// `join_room` / `leave_room` payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomPayload {
    /// Room to join or leave.
    #[serde(default, alias = "courseId")]
    pub room_id: Option<String>,
    /// Must match the authenticated user when present.
    #[serde(default)]
    pub user_id: Option<String>,
}

/// `send_message` payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessagePayload {
    /// Target room.
    #[serde(default, alias = "courseId")]
    pub room_id: Option<String>,
    /// Must match the authenticated user when present.
    #[serde(default)]
    pub sender_id: Option<String>,
    /// Ignored; the bound identity's name is used.
    #[serde(default)]
    pub sender_name: Option<String>,
    /// Ignored; the bound identity's role is used.
    #[serde(default)]
    pub sender_role: Option<String>,
    /// Message text.
    #[serde(default)]
    pub text: Option<String>,
    /// Legacy name of `text`, used when `text` is blank or absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Attached image URL.
    #[serde(default)]
    pub image_url: Option<String>,
}

impl SendMessagePayload {
    /// Message text, falling back to the legacy `message` field.
    pub fn body(&self) -> Option<&str> {
        self.text
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .or(self.message.as_deref())
    }
}

/// `typing_start` / `typing_stop` payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypingPayload {
    /// Room the user is typing in.
    #[serde(default, alias = "courseId")]
    pub room_id: Option<String>,
    /// Must match the authenticated user when present.
    #[serde(default)]
    pub user_id: Option<String>,
    /// Ignored; the bound identity's name is used.
    #[serde(default)]
    pub user_name: Option<String>,
}

/// Transient typing indicator relayed to the other members of a room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypingState {
    /// Room.
    pub room_id: RoomId,
    /// Typing user.
    pub user_id: UserId,
    /// Typing user's display name.
    pub user_name: String,
    /// Whether the user is currently typing.
    pub is_typing: bool,
}

/// Events sent by the server to the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ServerEvent {
    /// Sent once, right after the connection opens.
    RequestAuth {},
    /// Identity bound to this connection.
    Authenticated {
        /// Bound user.
        user_id: UserId,
        /// Bound display name.
        user_name: String,
        /// Bound role.
        role: UserRole,
    },
    /// Room join acknowledged.
    RoomJoined {
        /// Joined room.
        room_id: RoomId,
    },
    /// Room leave acknowledged.
    RoomLeft {
        /// Left room.
        room_id: RoomId,
    },
    /// Chat message accepted and fanned out.
    MessageAccepted {
        /// Assigned message id.
        message_id: MessageId,
        /// Room it was posted to.
        room_id: RoomId,
        /// Server timestamp.
        timestamp: DateTime<Utc>,
    },
    /// Chat message from another room member.
    NewMessage(ChatMessage),
    /// Notification addressed to this user.
    NewNotification(NotificationEvent),
    /// Typing indicator from another room member.
    UserTyping(TypingState),
    /// Online member count per room.
    OnlineUsersUpdate {
        /// Room → member count.
        counts: BTreeMap<RoomId, usize>,
    },
    /// Server keepalive.
    Ping {
        /// Server timestamp in milliseconds.
        timestamp: i64,
    },
    /// A client event was rejected.
    Error {
        /// Machine-readable code.
        code: String,
        /// Human-readable description.
        message: String,
    },
}

impl ServerEvent {
    /// Builds an `error` event.
    pub fn error(code: &str, message: impl Into<String>) -> Self {
        Self::Error {
            code: code.to_string(),
            message: message.into(),
        }
    }

    /// Builds a single-room `online_users_update`.
    pub fn room_count(room_id: RoomId, count: usize) -> Self {
        let mut counts = BTreeMap::new();
        counts.insert(room_id, count);
        Self::OnlineUsersUpdate { counts }
    }

    /// Event name used in logs and tests.
    pub fn name(&self) -> &'static str {
        match self {
            Self::RequestAuth {} => "request_auth",
            Self::Authenticated { .. } => "authenticated",
            Self::RoomJoined { .. } => "room_joined",
            Self::RoomLeft { .. } => "room_left",
            Self::MessageAccepted { .. } => "message_accepted",
            Self::NewMessage(_) => "new_message",
            Self::NewNotification(_) => "new_notification",
            Self::UserTyping(_) => "user_typing",
            Self::OnlineUsersUpdate { .. } => "online_users_update",
            Self::Ping { .. } => "ping",
            Self::Error { .. } => "error",
        }
    }
}
