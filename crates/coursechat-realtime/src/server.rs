//! Top-level coordinator that ties together all subsystems.

use std::sync::Arc;

use tracing::info;

use coursechat_core::config::RealtimeConfig;
use coursechat_core::error::AppError;
use coursechat_core::traits::{MessageStore, NotificationStore};

use crate::metrics::RealtimeMetrics;
use crate::session::manager::SessionManager;
use crate::store::{InMemoryMessageStore, InMemoryNotificationStore};

/// Central real-time coordinator.
#[derive(Clone)]
pub struct RealtimeEngine {
    /// Session lifecycle manager.
    pub sessions: Arc<SessionManager>,
    /// Metrics collector.
    pub metrics: Arc<RealtimeMetrics>,
}

impl std::fmt::Debug for RealtimeEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RealtimeEngine").finish()
    }
}

impl RealtimeEngine {
    /// Creates a coordinator backed by the given collaborators.
    pub fn new(
        config: RealtimeConfig,
        messages: Arc<dyn MessageStore>,
        notifications: Arc<dyn NotificationStore>,
    ) -> Self {
        let metrics = Arc::new(RealtimeMetrics::new());
        info!(
            message_store = messages.store_type(),
            notification_store = notifications.store_type(),
            "Real-time engine initialized"
        );
        let sessions = Arc::new(SessionManager::new(
            config,
            messages,
            notifications,
            metrics.clone(),
        ));

        Self { sessions, metrics }
    }

    /// Creates a coordinator backed by the in-memory stores.
    pub fn in_memory(config: RealtimeConfig) -> Self {
        let messages = Arc::new(InMemoryMessageStore::new(
            config.history.max_messages_per_room,
        ));
        let notifications = Arc::new(InMemoryNotificationStore::new(
            config.notifications.max_stored_per_user,
        ));
        Self::new(config, messages, notifications)
    }

    /// Disconnects every open connection.
    pub async fn shutdown(&self) -> Result<(), AppError> {
        info!("Shutting down real-time engine");
        self.sessions.close_all().await;
        info!("Real-time engine shut down");
        Ok(())
    }
}
