//! In-memory notification inbox for offline users.

use std::collections::VecDeque;

use async_trait::async_trait;
use dashmap::DashMap;

use coursechat_core::result::AppResult;
use coursechat_core::traits::NotificationStore;
use coursechat_core::types::{NotificationEvent, UserId};

/// Bounded per-user queue of undelivered notifications.
#[derive(Debug)]
pub struct InMemoryNotificationStore {
    /// User → pending notifications, oldest first.
    inbox: DashMap<UserId, VecDeque<NotificationEvent>>,
    /// Notifications kept per user; the oldest are dropped first.
    max_per_user: usize,
}

impl InMemoryNotificationStore {
    /// Create a store keeping at most `max_per_user` notifications per user.
    pub fn new(max_per_user: usize) -> Self {
        Self {
            inbox: DashMap::new(),
            max_per_user: max_per_user.max(1),
        }
    }

    /// Pending notifications of a user, oldest first.
    pub fn pending_for(&self, user: &UserId) -> Vec<NotificationEvent> {
        self.inbox
            .get(user)
            .map(|entry| entry.value().iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Removes and returns the pending notifications of a user.
    pub fn take_pending(&self, user: &UserId) -> Vec<NotificationEvent> {
        self.inbox
            .remove(user)
            .map(|(_, queue)| queue.into_iter().collect())
            .unwrap_or_default()
    }

    /// Total pending notifications.
    pub fn len(&self) -> usize {
        self.inbox.iter().map(|entry| entry.value().len()).sum()
    }

    /// Whether no notification is pending.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl NotificationStore for InMemoryNotificationStore {
    fn store_type(&self) -> &str {
        "memory"
    }

    async fn enqueue(&self, notification: NotificationEvent) -> AppResult<()> {
        let mut queue = self.inbox.entry(notification.user_id.clone()).or_default();
        queue.push_back(notification);
        while queue.len() > self.max_per_user {
            queue.pop_front();
        }
        Ok(())
    }
}
