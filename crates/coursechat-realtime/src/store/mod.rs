//! In-memory collaborator implementations used by the default server.

pub mod messages;
pub mod notifications;

pub use messages::InMemoryMessageStore;
pub use notifications::InMemoryNotificationStore;
