//! Notification content for coordinator events.

use coursechat_core::types::{ChatMessage, NotificationEvent, NotificationKind, UserId};

/// Title of chat message notifications.
pub const CHAT_MESSAGE_TITLE: &str = "New message in course";

/// Builds the notification a room member receives for a chat message.
pub fn chat_message_notification(recipient: UserId, message: &ChatMessage) -> NotificationEvent {
    let preview = if message.text.trim().is_empty() {
        "Sent an image"
    } else {
        message.text.as_str()
    };

    NotificationEvent::new(
        recipient,
        NotificationKind::Message,
        CHAT_MESSAGE_TITLE,
        format!("{}: {preview}", message.sender_name),
        serde_json::json!({
            "roomId": message.room_id,
            "messageId": message.id,
        }),
    )
}
