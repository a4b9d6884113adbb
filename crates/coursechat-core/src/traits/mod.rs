//! Collaborator traits defined in `coursechat-core` and implemented outside
//! the coordinator.

pub mod message_store;
pub mod notification_store;

pub use message_store::MessageStore;
pub use notification_store::NotificationStore;
