//! Notification dispatcher: live delivery or hand-off to the store.

use std::sync::Arc;

use coursechat_core::config::NotificationRealtimeConfig;
use coursechat_core::traits::NotificationStore;
use coursechat_core::types::NotificationEvent;

use crate::broadcast::router::BroadcastRouter;
use crate::message::types::ServerEvent;
use crate::metrics::RealtimeMetrics;
use crate::session::state::{PresenceState, SharedPresence};

/// Outcome of routing one notification.
#[derive(Debug, Clone, PartialEq)]
pub enum Routed {
    /// Queued on the recipient's live connection.
    Live,
    /// The recipient is not reachable; hand the event to the store.
    Offline(NotificationEvent),
}

/// Delivers notifications to online users and hands the rest to the
/// [`NotificationStore`].
#[derive(Debug, Clone)]
pub struct NotificationDispatcher {
    router: BroadcastRouter,
    store: Arc<dyn NotificationStore>,
    config: NotificationRealtimeConfig,
    metrics: Arc<RealtimeMetrics>,
}

impl NotificationDispatcher {
    /// Create a new dispatcher
    pub fn new(
        router: BroadcastRouter,
        store: Arc<dyn NotificationStore>,
        config: NotificationRealtimeConfig,
        metrics: Arc<RealtimeMetrics>,
    ) -> Self {
        Self {
            router,
            store,
            config,
            metrics,
        }
    }

    /// Whether chat messages generate notifications.
    pub fn enabled(&self) -> bool {
        self.config.enabled
    }

    /// Tries live delivery under the caller's lock.
    pub fn route(&self, state: &PresenceState, event: NotificationEvent) -> Routed {
        let user_id = event.user_id.clone();
        if self
            .router
            .send_to_user(state, &user_id, ServerEvent::NewNotification(event.clone()))
        {
            RealtimeMetrics::inc(&self.metrics.notifications_live);
            Routed::Live
        } else {
            Routed::Offline(event)
        }
    }

    /// Passes undelivered notifications to the store.
    ///
    /// Must be called without the presence lock held. Failures are logged
    /// and not retried.
    pub async fn hand_off(&self, events: Vec<NotificationEvent>) {
        if events.is_empty() {
            return;
        }
        if !self.config.hand_off_offline {
            tracing::debug!(count = events.len(), "Dropping offline notifications");
            return;
        }

        for event in events {
            let user_id = event.user_id.clone();
            match self.store.enqueue(event).await {
                Ok(()) => RealtimeMetrics::inc(&self.metrics.notifications_handed_off),
                Err(e) => {
                    RealtimeMetrics::inc(&self.metrics.store_failures);
                    tracing::error!(
                        user_id = %user_id,
                        store = self.store.store_type(),
                        error = %e,
                        "Failed to hand off notification"
                    );
                }
            }
        }
    }

    /// Routes a single notification, handing it off if the user is offline.
    ///
    /// Returns `true` when it was delivered live.
    pub async fn notify(&self, shared: &SharedPresence, event: NotificationEvent) -> bool {
        let routed = {
            let state = shared.read().await;
            self.route(&state, event)
        };

        match routed {
            Routed::Live => true,
            Routed::Offline(event) => {
                self.hand_off(vec![event]).await;
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::handle::ConnectionHandle;
    use crate::store::notifications::InMemoryNotificationStore;
    use coursechat_core::types::{Identity, NotificationKind, UserId, UserRole};
    use tokio::sync::{RwLock, mpsc};

    fn dispatcher(store: Arc<InMemoryNotificationStore>) -> NotificationDispatcher {
        let metrics = Arc::new(RealtimeMetrics::new());
        NotificationDispatcher::new(
            BroadcastRouter::new(metrics.clone()),
            store,
            NotificationRealtimeConfig::default(),
            metrics,
        )
    }

    fn event(user: &str) -> NotificationEvent {
        NotificationEvent::new(
            UserId::from(user),
            NotificationKind::Booking,
            "Booking confirmed",
            "Your session is booked",
            serde_json::json!({}),
        )
    }

    #[tokio::test]
    async fn test_online_user_receives_live() {
        let store = Arc::new(InMemoryNotificationStore::new(10));
        let dispatcher = dispatcher(store.clone());
        let shared: SharedPresence = Arc::new(RwLock::new(PresenceState::new()));

        let (tx, mut rx) = mpsc::channel(8);
        shared.write().await.registry.bind(
            Arc::new(ConnectionHandle::new(tx)),
            Identity::new(UserId::from("u1"), "A", UserRole::Student),
        );

        assert!(dispatcher.notify(&shared, event("u1")).await);
        assert_eq!(rx.try_recv().map(|e| e.name()).ok(), Some("new_notification"));
        assert!(store.pending_for(&UserId::from("u1")).is_empty());
    }

    #[tokio::test]
    async fn test_offline_user_is_handed_off() {
        let store = Arc::new(InMemoryNotificationStore::new(10));
        let dispatcher = dispatcher(store.clone());
        let shared: SharedPresence = Arc::new(RwLock::new(PresenceState::new()));

        assert!(!dispatcher.notify(&shared, event("u9")).await);
        let pending = store.pending_for(&UserId::from("u9"));
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].title, "Booking confirmed");
    }
}
