//! Room state and its pure transitions.
//!
//! Every transition takes `&self` and returns a new [`RoomState`], so a
//! rejected request can never leave a half-applied room behind. Locking and
//! persistence live in [`crate::SessionManager`].

use crate::error::{ConflictReason, SessionError};
use crate::ids::{RoomId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strictly_othello::{Board, Outcome, Player, Position, rules};
use tracing::{debug, instrument};

/// Lifecycle of a room.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum RoomStatus {
    /// Host seated, waiting for a guest.
    Waiting,
    /// Both seats taken, moves accepted.
    Playing,
    /// Game over; rematch or leave.
    Finished,
}

/// A seated user. The host plays Black, the guest White.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, derive_new::new)]
pub struct Seat {
    /// Seated user.
    pub user_id: UserId,
    /// Display name shown to the opponent.
    pub name: String,
}

/// Complete state of one room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomState {
    /// Room identifier.
    pub id: RoomId,
    /// Lifecycle status.
    pub status: RoomStatus,
    /// Current board.
    pub board: Board,
    /// Color to move.
    pub turn: Player,
    /// Set exactly when the room is finished.
    pub winner: Option<Outcome>,
    /// Host seat (Black).
    pub host: Seat,
    /// Guest seat (White).
    pub guest: Option<Seat>,
    /// Placements made since the game started.
    pub move_count: u32,
    /// When the room was created.
    pub created_at: DateTime<Utc>,
}

/// What a disconnect does to one room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisconnectTransition {
    /// Remove the room entirely.
    Destroy,
    /// The leaver forfeits a game in progress.
    Forfeit {
        /// Room after the forfeit.
        next: RoomState,
        /// Color of the remaining player.
        winner: Player,
    },
    /// A finished room keeps its host; the guest seat is emptied.
    SeatCleared(RoomState),
    /// The host left a finished room the guest still sits in.
    HostLeft,
}

impl RoomState {
    /// Opens a waiting room with the host seated as Black.
    pub fn new(id: RoomId, host: Seat, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            status: RoomStatus::Waiting,
            board: Board::initial(),
            turn: Player::Black,
            winner: None,
            host,
            guest: None,
            move_count: 0,
            created_at,
        }
    }

    /// The color `user` plays, if seated.
    pub fn seat_color(&self, user: UserId) -> Option<Player> {
        if self.host.user_id == user {
            Some(Player::Black)
        } else if self.guest.as_ref().is_some_and(|g| g.user_id == user) {
            Some(Player::White)
        } else {
            None
        }
    }

    /// The seat playing `color`.
    pub fn seat(&self, color: Player) -> Option<&Seat> {
        match color {
            Player::Black => Some(&self.host),
            Player::White => self.guest.as_ref(),
        }
    }

    /// Whether `user` is the host.
    pub fn is_host(&self, user: UserId) -> bool {
        self.host.user_id == user
    }

    #[track_caller]
    fn require_status(&self, expected: RoomStatus) -> Result<(), SessionError> {
        if self.status == expected {
            Ok(())
        } else {
            Err(SessionError::conflict(ConflictReason::WrongStatus {
                expected,
                actual: self.status,
            }))
        }
    }

    /// Checks that `guest` may take the empty seat, without touching the room.
    ///
    /// Only waiting rooms accept a guest and a waiting room never has one, so
    /// there is no separate occupancy check.
    ///
    /// # Errors
    ///
    /// `WrongStatus` unless waiting, then `SelfJoin` for the host.
    #[track_caller]
    pub fn check_joinable(&self, guest: UserId) -> Result<(), SessionError> {
        self.require_status(RoomStatus::Waiting)?;
        if self.is_host(guest) {
            return Err(SessionError::conflict(ConflictReason::SelfJoin));
        }
        Ok(())
    }

    /// Seats `guest` as White and starts the game.
    ///
    /// # Errors
    ///
    /// As [`RoomState::check_joinable`].
    #[instrument(skip(self, guest), fields(room_id = %self.id, guest = %guest.user_id))]
    pub fn join(&self, guest: Seat) -> Result<Self, SessionError> {
        self.check_joinable(guest.user_id)?;

        let mut next = self.clone();
        next.guest = Some(guest);
        next.status = RoomStatus::Playing;
        Ok(next)
    }

    /// Applies a placement by `user` at (`row`, `col`).
    ///
    /// After the placement the turn passes to the opponent when they can
    /// move, and stays with the mover otherwise. A board where neither side
    /// can move finishes the room with the majority winner.
    ///
    /// # Errors
    ///
    /// `Validation` for coordinates outside `0..8`, `WrongStatus` unless
    /// playing, `NotYourTurn` when `user` does not hold the color to move,
    /// `IllegalMove` when the rule engine rejects the placement.
    #[instrument(skip(self), fields(room_id = %self.id))]
    pub fn submit_move(&self, row: i32, col: i32, user: UserId) -> Result<Self, SessionError> {
        let pos = usize::try_from(row)
            .ok()
            .zip(usize::try_from(col).ok())
            .and_then(|(r, c)| Position::new(r, c))
            .ok_or_else(|| {
                SessionError::validation(format!("coordinates ({}, {}) out of range", row, col))
            })?;

        self.require_status(RoomStatus::Playing)?;
        if self.seat_color(user) != Some(self.turn) {
            debug!(user = %user, turn = %self.turn, "Move out of turn");
            return Err(SessionError::conflict(ConflictReason::NotYourTurn));
        }

        let board = rules::apply_at(&self.board, pos, self.turn)?;
        let opponent = self.turn.opponent();

        let mut next = self.clone();
        next.board = board;
        next.move_count += 1;
        next.turn = if rules::has_legal_move(&board, opponent) {
            opponent
        } else {
            self.turn
        };

        if rules::is_terminal(&board) {
            next.status = RoomStatus::Finished;
            next.winner = Some(rules::winner(&board));
        }

        Ok(next)
    }

    /// Decides what happens when `user` disconnects. `None` when the user
    /// holds no seat or the room is unaffected.
    pub fn on_disconnect(&self, user: UserId) -> Option<DisconnectTransition> {
        let color = self.seat_color(user)?;
        let is_host = color == Player::Black;

        match self.status {
            RoomStatus::Waiting if is_host => Some(DisconnectTransition::Destroy),
            RoomStatus::Waiting => None,
            RoomStatus::Playing => {
                let winner = color.opponent();
                let mut next = self.clone();
                next.status = RoomStatus::Finished;
                next.winner = Some(Outcome::Winner(winner));
                if !is_host {
                    next.guest = None;
                }
                Some(DisconnectTransition::Forfeit { next, winner })
            }
            RoomStatus::Finished if !is_host => {
                let mut next = self.clone();
                next.guest = None;
                Some(DisconnectTransition::SeatCleared(next))
            }
            RoomStatus::Finished if self.guest.is_none() => Some(DisconnectTransition::Destroy),
            RoomStatus::Finished => Some(DisconnectTransition::HostLeft),
        }
    }

    /// Resets a finished room to a fresh board.
    ///
    /// The room goes back to playing when the guest is still seated and to
    /// waiting otherwise.
    ///
    /// # Errors
    ///
    /// `WrongStatus` unless finished.
    #[instrument(skip(self), fields(room_id = %self.id))]
    pub fn reset_for_rematch(&self) -> Result<Self, SessionError> {
        self.require_status(RoomStatus::Finished)?;

        let mut next = self.clone();
        next.board = Board::initial();
        next.turn = Player::Black;
        next.winner = None;
        next.move_count = 0;
        next.status = if self.guest.is_some() {
            RoomStatus::Playing
        } else {
            RoomStatus::Waiting
        };
        Ok(next)
    }
}
