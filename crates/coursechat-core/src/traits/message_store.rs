//! Chat history persistence collaborator.

use async_trait::async_trait;

use crate::result::AppResult;
use crate::types::ChatMessage;

/// Durable chat history.
///
/// The coordinator calls [`MessageStore::persist`] once per accepted message,
/// after live fan-out has completed. Failures are logged by the caller and
/// never retried; retry policy belongs to the implementation.
#[async_trait]
pub trait MessageStore: Send + Sync + std::fmt::Debug + 'static {
    /// Return the store name (e.g., "memory", "firestore").
    fn store_type(&self) -> &str;

    /// Persist a chat message.
    async fn persist(&self, message: &ChatMessage) -> AppResult<()>;
}
