//! In-memory chat history.

use std::collections::VecDeque;

use async_trait::async_trait;
use dashmap::DashMap;

use coursechat_core::result::AppResult;
use coursechat_core::traits::MessageStore;
use coursechat_core::types::{ChatMessage, RoomId};

/// Keeps the most recent messages of each room in memory.
#[derive(Debug)]
pub struct InMemoryMessageStore {
    /// Room → messages, oldest first.
    rooms: DashMap<RoomId, VecDeque<ChatMessage>>,
    /// Messages kept per room.
    max_per_room: usize,
}

impl InMemoryMessageStore {
    /// Create a store keeping at most `max_per_room` messages per room.
    pub fn new(max_per_room: usize) -> Self {
        Self {
            rooms: DashMap::new(),
            max_per_room: max_per_room.max(1),
        }
    }

    /// Stored messages of a room, oldest first.
    pub fn history(&self, room: &RoomId) -> Vec<ChatMessage> {
        self.rooms
            .get(room)
            .map(|entry| entry.value().iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Total stored messages across all rooms.
    pub fn len(&self) -> usize {
        self.rooms.iter().map(|entry| entry.value().len()).sum()
    }

    /// Whether nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl MessageStore for InMemoryMessageStore {
    fn store_type(&self) -> &str {
        "memory"
    }

    async fn persist(&self, message: &ChatMessage) -> AppResult<()> {
        let mut history = self.rooms.entry(message.room_id.clone()).or_default();
        history.push_back(message.clone());
        while history.len() > self.max_per_room {
            history.pop_front();
        }
        Ok(())
    }
}
