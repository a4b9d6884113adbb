//! Durable notification collaborator.

use async_trait::async_trait;

use crate::result::AppResult;
use crate::types::NotificationEvent;

/// Durable notification inbox for users who are not connected.
///
/// Notifications that cannot be delivered live are handed to
/// [`NotificationStore::enqueue`] instead of being dropped. Read state and
/// later delivery are the implementation's responsibility.
#[async_trait]
pub trait NotificationStore: Send + Sync + std::fmt::Debug + 'static {
    /// Return the store name.
    fn store_type(&self) -> &str;

    /// Queue a notification for later delivery.
    async fn enqueue(&self, notification: NotificationEvent) -> AppResult<()>;
}
