//! Records exchanged between the coordinator, its clients, and its
//! persistence collaborators.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::{MessageId, NotificationId, RoomId, UserId};
use super::role::UserRole;

/// The authenticated user context bound to a connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    /// User identifier.
    pub user_id: UserId,
    /// Name shown next to messages and typing indicators.
    pub display_name: String,
    /// Role of the user on the platform.
    pub role: UserRole,
}

impl Identity {
    /// Creates a new identity.
    pub fn new(user_id: UserId, display_name: impl Into<String>, role: UserRole) -> Self {
        Self {
            user_id,
            display_name: display_name.into(),
            role,
        }
    }
}

/// A chat message posted to a course room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    /// Message identifier.
    pub id: MessageId,
    /// Room the message was posted to.
    pub room_id: RoomId,
    /// Author's user id.
    pub sender_id: UserId,
    /// Author's display name at send time.
    pub sender_name: String,
    /// Author's role at send time.
    pub sender_role: UserRole,
    /// Message text (may be empty for image-only messages).
    pub text: String,
    /// Attached image URL.
    #[serde(default)]
    pub image_url: Option<String>,
    /// Server timestamp.
    pub timestamp: DateTime<Utc>,
    /// Number of likes.
    #[serde(default)]
    pub like_count: u32,
    /// Users who liked the message.
    #[serde(default)]
    pub liked_by: Vec<UserId>,
}

impl ChatMessage {
    /// Builds a fresh message authored by `sender` in `room_id`.
    pub fn new(
        room_id: RoomId,
        sender: &Identity,
        text: impl Into<String>,
        image_url: Option<String>,
    ) -> Self {
        Self {
            id: MessageId::new(),
            room_id,
            sender_id: sender.user_id.clone(),
            sender_name: sender.display_name.clone(),
            sender_role: sender.role,
            text: text.into(),
            image_url,
            timestamp: Utc::now(),
            like_count: 0,
            liked_by: Vec::new(),
        }
    }

    /// Whether the message only carries an image.
    pub fn is_image_only(&self) -> bool {
        self.text.trim().is_empty() && self.image_url.is_some()
    }
}

/// Category of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    /// New chat message in a room the user belongs to.
    Message,
    /// Booking created or changed.
    Booking,
    /// Payment captured or refunded.
    Payment,
    /// Course update.
    Course,
    /// Referral reward.
    Referral,
    /// Platform announcement.
    System,
    /// New review.
    Review,
    /// Coaching session reminder.
    Session,
}

/// A notification addressed to a single user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationEvent {
    /// Notification identifier.
    pub id: NotificationId,
    /// Recipient.
    pub user_id: UserId,
    /// Category.
    pub kind: NotificationKind,
    /// Short title.
    pub title: String,
    /// Body text.
    pub body: String,
    /// Structured payload for the client.
    #[serde(default)]
    pub data: serde_json::Value,
    /// Read flag; always `false` when emitted by the coordinator.
    #[serde(default)]
    pub read: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl NotificationEvent {
    /// Builds an unread notification for `user_id`.
    pub fn new(
        user_id: UserId,
        kind: NotificationKind,
        title: impl Into<String>,
        body: impl Into<String>,
        data: serde_json::Value,
    ) -> Self {
        Self {
            id: NotificationId::new(),
            user_id,
            kind,
            title: title.into(),
            body: body.into(),
            data,
            read: false,
            created_at: Utc::now(),
        }
    }
}
