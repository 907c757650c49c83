//! Room lifecycle orchestration.
//!
//! [`SessionManager`] serializes every operation on a room behind that
//! room's own mutex, so distinct rooms proceed in parallel while requests for
//! the same room are applied one at a time. Each operation loads the room,
//! runs a pure [`RoomState`] transition, saves the result and publishes the
//! new snapshot.

use crate::broadcast::Broadcaster;
use crate::error::{ConflictReason, SessionError, SessionErrorKind};
use crate::ids::{RoomId, UserId};
use crate::room::{DisconnectTransition, RoomState, RoomStatus, Seat};
use crate::snapshot::{GameStateSnapshot, RoomSummary};
use crate::store::{MatchRecord, MatchResult, PersistentStore};
use chrono::Utc;
use rand::seq::SliceRandom;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use strictly_othello::{Outcome, Player};
use tracing::{debug, error, info, instrument, warn};

const NUDGES: [&str; 4] = [
    "{name}, your move! Take your time... but not too much.",
    "{name}, we're waiting for you!",
    "{name}, that's a long think!",
    "{name}, hurry hurry!",
];

/// Opponent name written to history rows of games against the computer.
pub const AI_OPPONENT_NAME: &str = "AI";

/// Side effect of a disconnect on one room.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisconnectEffect {
    /// The room was removed.
    RoomDestroyed,
    /// The game in progress was forfeited to `winner`.
    Forfeited {
        /// Color of the remaining player.
        winner: Player,
    },
    /// The guest seat of a finished room was emptied.
    SeatCleared,
    /// The remaining guest was told the room is closing.
    ClosingNotice,
}

/// Lazily created mutex per room.
#[derive(Debug, Default)]
struct RoomLocks {
    inner: Mutex<HashMap<RoomId, Arc<Mutex<()>>>>,
}

impl RoomLocks {
    fn handle(&self, id: RoomId) -> Arc<Mutex<()>> {
        let mut locks = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(locks.entry(id).or_default())
    }

    fn forget(&self, id: RoomId) {
        let mut locks = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        locks.remove(&id);
    }

    /// Drops the entry for `id` when `handle` is its last user.
    ///
    /// Handles are only cloned under the table lock, so the count is stable here.
    fn release_if_idle(&self, id: RoomId, handle: Arc<Mutex<()>>) {
        let mut locks = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let idle = locks
            .get(&id)
            .is_some_and(|entry| Arc::ptr_eq(entry, &handle) && Arc::strong_count(&handle) == 2);
        if idle {
            locks.remove(&id);
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

/// Applies session operations to rooms held in a [`PersistentStore`].
pub struct SessionManager {
    store: Arc<dyn PersistentStore>,
    broadcaster: Arc<dyn Broadcaster>,
    locks: RoomLocks,
}

impl SessionManager {
    /// Creates a manager over the given collaborators.
    pub fn new(store: Arc<dyn PersistentStore>, broadcaster: Arc<dyn Broadcaster>) -> Self {
        Self {
            store,
            broadcaster,
            locks: RoomLocks::default(),
        }
    }

    /// Runs `f` while holding the lock of room `id`.
    ///
    /// The lock entry is dropped again when `f` finds no such room, so
    /// requests for unknown rooms leave the table as they found it.
    fn with_room<T>(
        &self,
        id: RoomId,
        f: impl FnOnce() -> Result<T, SessionError>,
    ) -> Result<T, SessionError> {
        let handle = self.locks.handle(id);
        let result = {
            let _guard = handle.lock().unwrap_or_else(PoisonError::into_inner);
            f()
        };
        if matches!(&result, Err(e) if e.kind == SessionErrorKind::RoomNotFound(id)) {
            self.locks.release_if_idle(id, handle);
        }
        result
    }

    #[track_caller]
    fn load(&self, id: RoomId) -> Result<RoomState, SessionError> {
        self.store
            .load(id)?
            .ok_or_else(|| SessionError::new(SessionErrorKind::RoomNotFound(id)))
    }

    #[track_caller]
    fn seat_for(&self, user: UserId) -> Result<Seat, SessionError> {
        let user = self
            .store
            .user(user)?
            .ok_or_else(|| SessionError::new(SessionErrorKind::UserNotFound(user)))?;
        Ok(Seat::new(*user.id(), user.name().clone()))
    }

    fn publish(&self, snapshot: &GameStateSnapshot) {
        self.broadcaster.publish(snapshot.room_id, snapshot);
    }

    /// Opens a waiting room hosted by `host`.
    #[instrument(skip(self))]
    pub fn create_room(&self, host: UserId) -> Result<RoomState, SessionError> {
        let seat = self.seat_for(host)?;
        let id = self.store.next_room_id()?;

        self.with_room(id, || {
            let room = RoomState::new(id, seat, Utc::now());
            self.store.save(&room)?;
            self.publish(&GameStateSnapshot::of(&room));
            info!(room_id = %id, "Room created");
            Ok(room)
        })
    }

    /// Seats `guest` in a waiting room and starts the game.
    #[instrument(skip(self))]
    pub fn join_room(&self, room_id: RoomId, guest: UserId) -> Result<GameStateSnapshot, SessionError> {
        self.with_room(room_id, || {
            let room = self.load(room_id)?;
            room.check_joinable(guest).inspect_err(|e| {
                warn!(error = %e, "Join rejected");
            })?;
            let seat = self.seat_for(guest)?;
            let name = seat.name.clone();

            let next = room.join(seat)?;
            self.store.save(&next)?;

            let snapshot = GameStateSnapshot::of(&next)
                .with_message(format!("{} joined the game. Let's begin!", name));
            self.publish(&snapshot);
            info!(room_id = %room_id, guest = %guest, "Guest joined");
            Ok(snapshot)
        })
    }

    /// Places a disc for `user` at (`row`, `col`).
    ///
    /// A rejected move leaves the stored room untouched.
    #[instrument(skip(self))]
    pub fn submit_move(
        &self,
        room_id: RoomId,
        row: i32,
        col: i32,
        user: UserId,
    ) -> Result<GameStateSnapshot, SessionError> {
        self.with_room(room_id, || {
            let room = self.load(room_id)?;
            let next = room.submit_move(row, col, user).inspect_err(|e| {
                debug!(error = %e, "Move rejected");
            })?;
            self.store.save(&next)?;

            if let Some(outcome) = next.winner {
                info!(room_id = %room_id, winner = outcome.as_wire(), "Game finished");
                self.record_matches(&next, outcome);
            }

            let snapshot = GameStateSnapshot::of(&next);
            self.publish(&snapshot);
            Ok(snapshot)
        })
    }

    /// Handles `user` dropping off. Every room the user sits in is updated.
    ///
    /// Never fails: store or lookup failures are logged and the affected room
    /// is skipped. Repeating a disconnect is harmless.
    #[instrument(skip(self))]
    pub fn disconnect(&self, user: UserId) -> Vec<(RoomId, DisconnectEffect)> {
        let rooms = match self.store.rooms_for_user(user) {
            Ok(rooms) => rooms,
            Err(e) => {
                error!(error = %e, "Could not list rooms for disconnecting user");
                return Vec::new();
            }
        };

        rooms
            .into_iter()
            .filter_map(|id| {
                let effect = self.with_room(id, || Ok(self.disconnect_from(id, user)));
                match effect {
                    Ok(Some(effect)) => Some((id, effect)),
                    Ok(None) => None,
                    Err(e) => {
                        error!(room_id = %id, error = %e, "Disconnect handling failed");
                        None
                    }
                }
            })
            .collect()
    }

    /// Applies a disconnect to one room. Caller holds the room lock.
    fn disconnect_from(&self, id: RoomId, user: UserId) -> Option<DisconnectEffect> {
        let room = match self.store.load(id) {
            Ok(Some(room)) => room,
            Ok(None) => return None,
            Err(e) => {
                error!(room_id = %id, error = %e, "Could not load room on disconnect");
                return None;
            }
        };

        match room.on_disconnect(user)? {
            DisconnectTransition::Destroy => {
                if let Err(e) = self.store.delete(id) {
                    error!(room_id = %id, error = %e, "Could not delete room");
                }
                self.locks.forget(id);
                info!(room_id = %id, "Room destroyed");
                Some(DisconnectEffect::RoomDestroyed)
            }
            DisconnectTransition::Forfeit { next, winner } => {
                if let Err(e) = self.store.save(&next) {
                    error!(room_id = %id, error = %e, "Could not save forfeited room");
                }
                self.record_matches(&room, Outcome::Winner(winner));

                let loser = room.seat(winner.opponent()).map(|s| s.name.as_str()).unwrap_or("");
                let champion = room.seat(winner).map(|s| s.name.as_str()).unwrap_or("");
                let snapshot = GameStateSnapshot::of(&next)
                    .with_message(format!("{} left the game. {} wins!", loser, champion));
                self.publish(&snapshot);
                info!(room_id = %id, winner = %winner, "Game forfeited");
                Some(DisconnectEffect::Forfeited { winner })
            }
            DisconnectTransition::SeatCleared(next) => {
                if let Err(e) = self.store.save(&next) {
                    error!(room_id = %id, error = %e, "Could not clear guest seat");
                }
                self.publish(&GameStateSnapshot::of(&next));
                info!(room_id = %id, "Guest left finished room");
                Some(DisconnectEffect::SeatCleared)
            }
            DisconnectTransition::HostLeft => {
                let snapshot = GameStateSnapshot::of(&room)
                    .with_message("The host has left. This room is closing.");
                self.publish(&snapshot);
                info!(room_id = %id, "Host left finished room");
                Some(DisconnectEffect::ClosingNotice)
            }
        }
    }

    /// Starts a new game in a finished room.
    #[instrument(skip(self))]
    pub fn reset_for_rematch(&self, room_id: RoomId) -> Result<GameStateSnapshot, SessionError> {
        self.with_room(room_id, || {
            let next = self.load(room_id)?.reset_for_rematch()?;
            self.store.save(&next)?;

            let snapshot = GameStateSnapshot::of(&next);
            self.publish(&snapshot);
            info!(room_id = %room_id, status = %next.status, "Room reset for rematch");
            Ok(snapshot)
        })
    }

    /// Removes a room. Only the host may do this.
    #[instrument(skip(self))]
    pub fn delete_room(&self, room_id: RoomId, user: UserId) -> Result<(), SessionError> {
        self.with_room(room_id, || {
            let room = self.load(room_id)?;
            if !room.is_host(user) {
                warn!(user = %user, "Non-host tried to delete room");
                return Err(SessionError::conflict(ConflictReason::NotHost));
            }
            self.store.delete(room_id)?;
            self.locks.forget(room_id);
            info!(room_id = %room_id, "Room deleted");
            Ok(())
        })
    }

    /// Current snapshot of a room.
    #[instrument(skip(self))]
    pub fn game_state(&self, room_id: RoomId) -> Result<GameStateSnapshot, SessionError> {
        self.with_room(room_id, || Ok(GameStateSnapshot::of(&self.load(room_id)?)))
    }

    /// Rooms waiting for a guest, newest first.
    #[instrument(skip(self))]
    pub fn waiting_rooms(&self) -> Result<Vec<RoomSummary>, SessionError> {
        let mut rooms = self.store.rooms_with_status(RoomStatus::Waiting)?;
        rooms.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(rooms.iter().map(RoomSummary::from).collect())
    }

    /// Builds a hurry-up notice aimed at the opponent of `from`.
    ///
    /// The room is not modified.
    #[instrument(skip(self))]
    pub fn nudge(&self, room_id: RoomId, from: UserId) -> Result<GameStateSnapshot, SessionError> {
        self.with_room(room_id, || {
            let room = self.load(room_id)?;
            let color = Self::seated_player(&room, from)?;
            let opponent = room
                .seat(color.opponent())
                .ok_or_else(|| SessionError::conflict(ConflictReason::NotSeated))?;

            let template = NUDGES
                .choose(&mut rand::thread_rng())
                .copied()
                .unwrap_or(NUDGES[0]);
            let snapshot = GameStateSnapshot::of(&room)
                .with_message(template.replace("{name}", &opponent.name));
            self.publish(&snapshot);
            debug!(room_id = %room_id, "Nudge sent");
            Ok(snapshot)
        })
    }

    /// Relays a free-text message from a seated player.
    ///
    /// The room is not modified.
    #[instrument(skip(self, text))]
    pub fn relay_message(
        &self,
        room_id: RoomId,
        from: UserId,
        text: &str,
    ) -> Result<GameStateSnapshot, SessionError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(SessionError::validation("message is empty"));
        }

        self.with_room(room_id, || {
            let room = self.load(room_id)?;
            Self::seated_player(&room, from)?;

            let snapshot = GameStateSnapshot::of(&room).with_message(text);
            self.publish(&snapshot);
            debug!(room_id = %room_id, "Message relayed");
            Ok(snapshot)
        })
    }

    /// Match history of `user`, newest first.
    #[instrument(skip(self))]
    pub fn match_history(&self, user: UserId) -> Result<Vec<MatchRecord>, SessionError> {
        self.seat_for(user)?;
        Ok(self.store.match_history(user)?)
    }

    /// Records a finished game `user` played against the computer.
    ///
    /// The row names [`AI_OPPONENT_NAME`] as the opponent and is stamped now.
    #[instrument(skip(self))]
    pub fn record_single_player_result(
        &self,
        user: UserId,
        result: MatchResult,
        moves: u32,
    ) -> Result<MatchRecord, SessionError> {
        self.seat_for(user)?;
        let record =
            MatchRecord::new(user, AI_OPPONENT_NAME.to_string(), result, moves, Utc::now());
        self.store.record_match(record.clone())?;
        info!(user = %user, result = %result, moves, "Single-player result recorded");
        Ok(record)
    }

    /// Color of `user` in a room that is being played.
    #[track_caller]
    fn seated_player(room: &RoomState, user: UserId) -> Result<Player, SessionError> {
        if room.status != RoomStatus::Playing {
            return Err(SessionError::conflict(ConflictReason::WrongStatus {
                expected: RoomStatus::Playing,
                actual: room.status,
            }));
        }
        room.seat_color(user)
            .ok_or_else(|| SessionError::conflict(ConflictReason::NotSeated))
    }

    /// Writes one history row per seated user. Failures are logged only.
    fn record_matches(&self, room: &RoomState, outcome: Outcome) {
        for color in [Player::Black, Player::White] {
            let (Some(me), Some(them)) = (room.seat(color), room.seat(color.opponent())) else {
                continue;
            };
            let result = match outcome {
                Outcome::Draw => MatchResult::Draw,
                Outcome::Winner(w) if w == color => MatchResult::Win,
                Outcome::Winner(_) => MatchResult::Loss,
            };
            let record = MatchRecord::new(
                me.user_id,
                them.name.clone(),
                result,
                room.move_count,
                Utc::now(),
            );
            if let Err(e) = self.store.record_match(record) {
                error!(room_id = %room.id, user = %me.user_id, error = %e, "Could not record match");
            }
        }
    }
}
