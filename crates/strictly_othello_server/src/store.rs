//! Persistence seam and an in-memory implementation.

use crate::error::StoreError;
use crate::ids::{RoomId, UserId};
use crate::room::{RoomState, RoomStatus};
use chrono::{DateTime, Utc};
use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, instrument};

/// A registered user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters, derive_new::new)]
pub struct User {
    /// User identifier.
    id: UserId,
    /// Display name.
    name: String,
}

/// Result of a finished game from one user's side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchResult {
    /// The user won.
    Win,
    /// The user lost.
    Loss,
    /// Equal disc counts.
    Draw,
}

/// One row of match history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters, derive_new::new)]
#[serde(rename_all = "camelCase")]
pub struct MatchRecord {
    /// Whose history this is.
    user_id: UserId,
    /// Opponent display name.
    opponent_name: String,
    /// Result for `user_id`.
    result: MatchResult,
    /// Placements made in the game.
    moves: u32,
    /// When the game ended.
    played_at: DateTime<Utc>,
}

/// Durable state behind the session manager.
///
/// Calls are synchronous and made while the caller holds the room's lock.
pub trait PersistentStore: Send + Sync {
    /// Looks up a user.
    fn user(&self, id: UserId) -> Result<Option<User>, StoreError>;

    /// Allocates a fresh room identifier.
    fn next_room_id(&self) -> Result<RoomId, StoreError>;

    /// Loads a room.
    fn load(&self, id: RoomId) -> Result<Option<RoomState>, StoreError>;

    /// Inserts or replaces a room.
    fn save(&self, room: &RoomState) -> Result<(), StoreError>;

    /// Removes a room. Removing a missing room is not an error.
    fn delete(&self, id: RoomId) -> Result<(), StoreError>;

    /// Rooms where `user` holds a seat.
    fn rooms_for_user(&self, user: UserId) -> Result<Vec<RoomId>, StoreError>;

    /// Rooms currently in `status`.
    fn rooms_with_status(&self, status: RoomStatus) -> Result<Vec<RoomState>, StoreError>;

    /// Appends a match history row.
    fn record_match(&self, record: MatchRecord) -> Result<(), StoreError>;

    /// Match history of `user`, newest `played_at` first. Rows with equal
    /// timestamps come back most recently recorded first.
    fn match_history(&self, user: UserId) -> Result<Vec<MatchRecord>, StoreError>;
}

#[derive(Debug, Default)]
struct Tables {
    users: HashMap<UserId, User>,
    rooms: BTreeMap<RoomId, RoomState>,
    matches: Vec<MatchRecord>,
    last_user_id: u64,
    last_room_id: u64,
}

/// Store backed by process memory. Identifiers increase monotonically.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    tables: Mutex<Tables>,
}

impl InMemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> Result<MutexGuard<'_, Tables>, StoreError> {
        self.tables
            .lock()
            .map_err(|_| StoreError::new("In-memory store lock poisoned"))
    }

    /// Registers a user under a fresh identifier.
    #[instrument(skip(self))]
    pub fn add_user(&self, name: &str) -> Result<User, StoreError> {
        let mut tables = self.tables()?;
        tables.last_user_id += 1;
        let user = User::new(UserId::new(tables.last_user_id), name.to_string());
        tables.users.insert(*user.id(), user.clone());
        debug!(user_id = %user.id(), "User registered");
        Ok(user)
    }

    /// Number of stored rooms.
    pub fn room_count(&self) -> Result<usize, StoreError> {
        Ok(self.tables()?.rooms.len())
    }
}

impl PersistentStore for InMemoryStore {
    fn user(&self, id: UserId) -> Result<Option<User>, StoreError> {
        Ok(self.tables()?.users.get(&id).cloned())
    }

    fn next_room_id(&self) -> Result<RoomId, StoreError> {
        let mut tables = self.tables()?;
        tables.last_room_id += 1;
        Ok(RoomId::new(tables.last_room_id))
    }

    fn load(&self, id: RoomId) -> Result<Option<RoomState>, StoreError> {
        Ok(self.tables()?.rooms.get(&id).cloned())
    }

    fn save(&self, room: &RoomState) -> Result<(), StoreError> {
        self.tables()?.rooms.insert(room.id, room.clone());
        Ok(())
    }

    fn delete(&self, id: RoomId) -> Result<(), StoreError> {
        self.tables()?.rooms.remove(&id);
        Ok(())
    }

    fn rooms_for_user(&self, user: UserId) -> Result<Vec<RoomId>, StoreError> {
        Ok(self
            .tables()?
            .rooms
            .values()
            .filter(|room| room.seat_color(user).is_some())
            .map(|room| room.id)
            .collect())
    }

    fn rooms_with_status(&self, status: RoomStatus) -> Result<Vec<RoomState>, StoreError> {
        Ok(self
            .tables()?
            .rooms
            .values()
            .filter(|room| room.status == status)
            .cloned()
            .collect())
    }

    fn record_match(&self, record: MatchRecord) -> Result<(), StoreError> {
        self.tables()?.matches.push(record);
        Ok(())
    }

    fn match_history(&self, user: UserId) -> Result<Vec<MatchRecord>, StoreError> {
        let mut history: Vec<MatchRecord> = self
            .tables()?
            .matches
            .iter()
            .rev()
            .filter(|record| *record.user_id() == user)
            .cloned()
            .collect();
        history.sort_by(|a, b| b.played_at.cmp(&a.played_at));
        Ok(history)
    }
}
