//! Room membership index: which users are in which course rooms.
//!
//! Two maps kept in lockstep: room → members and user → rooms. After every
//! mutation `u ∈ members_of(r)` holds exactly when `r ∈ rooms_of(u)`, and
//! neither map keeps an empty set around.

use std::collections::{BTreeMap, HashMap, HashSet};

use coursechat_core::types::{RoomId, UserId};

/// Bidirectional user ↔ room membership index.
#[derive(Debug, Default, Clone)]
pub struct RoomIndex {
    /// Room → members.
    members: HashMap<RoomId, HashSet<UserId>>,
    /// User → rooms (reverse index).
    rooms: HashMap<UserId, HashSet<RoomId>>,
}

impl RoomIndex {
    /// Creates an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `user` to `room`. Returns `true` when the membership is new.
    pub fn join(&mut self, user: &UserId, room: &RoomId) -> bool {
        let added = self
            .members
            .entry(room.clone())
            .or_default()
            .insert(user.clone());
        self.rooms
            .entry(user.clone())
            .or_default()
            .insert(room.clone());
        added
    }

    /// Removes `user` from `room`. Returns `true` when a membership was
    /// removed.
    pub fn leave(&mut self, user: &UserId, room: &RoomId) -> bool {
        let removed = match self.members.get_mut(room) {
            Some(members) => {
                let removed = members.remove(user);
                if members.is_empty() {
                    self.members.remove(room);
                }
                removed
            }
            None => false,
        };

        if let Some(rooms) = self.rooms.get_mut(user) {
            rooms.remove(room);
            if rooms.is_empty() {
                self.rooms.remove(user);
            }
        }

        removed
    }

    /// Removes `user` from every room and returns the rooms left.
    pub fn remove_identity(&mut self, user: &UserId) -> Vec<RoomId> {
        let Some(rooms) = self.rooms.remove(user) else {
            return Vec::new();
        };

        let mut left: Vec<RoomId> = rooms.into_iter().collect();
        left.sort();

        for room in &left {
            if let Some(members) = self.members.get_mut(room) {
                members.remove(user);
                if members.is_empty() {
                    self.members.remove(room);
                }
            }
        }

        left
    }

    /// Current members of a room.
    pub fn members_of(&self, room: &RoomId) -> HashSet<UserId> {
        self.members.get(room).cloned().unwrap_or_default()
    }

    /// Iterates the members of a room without cloning the set.
    pub fn iter_members<'a>(&'a self, room: &RoomId) -> impl Iterator<Item = &'a UserId> + 'a {
        self.members.get(room).into_iter().flatten()
    }

    /// Rooms a user currently belongs to.
    pub fn rooms_of(&self, user: &UserId) -> HashSet<RoomId> {
        self.rooms.get(user).cloned().unwrap_or_default()
    }

    /// Number of rooms a user belongs to.
    pub fn room_count_of(&self, user: &UserId) -> usize {
        self.rooms.get(user).map_or(0, HashSet::len)
    }

    /// Whether `user` is a member of `room`.
    pub fn is_member(&self, user: &UserId, room: &RoomId) -> bool {
        self.members
            .get(room)
            .is_some_and(|members| members.contains(user))
    }

    /// Number of members in a room.
    pub fn count_of(&self, room: &RoomId) -> usize {
        self.members.get(room).map_or(0, HashSet::len)
    }

    /// Member count of every active room.
    pub fn counts(&self) -> BTreeMap<RoomId, usize> {
        self.members
            .iter()
            .map(|(room, members)| (room.clone(), members.len()))
            .collect()
    }

    /// Number of rooms with at least one member.
    pub fn room_count(&self) -> usize {
        self.members.len()
    }

    /// Number of users in at least one room.
    pub fn user_count(&self) -> usize {
        self.rooms.len()
    }

    /// Checks that both maps agree and hold no empty sets.
    pub fn is_consistent(&self) -> bool {
        let forward = self.members.iter().all(|(room, members)| {
            !members.is_empty()
                && members
                    .iter()
                    .all(|user| self.rooms.get(user).is_some_and(|r| r.contains(room)))
        });
        let backward = self.rooms.iter().all(|(user, rooms)| {
            !rooms.is_empty()
                && rooms
                    .iter()
                    .all(|room| self.members.get(room).is_some_and(|m| m.contains(user)))
        });
        forward && backward
    }
}
