//! Session error types.

use crate::ids::{RoomId, UserId};
use crate::room::RoomStatus;
use derive_more::{Display, Error};
use strictly_othello::MoveError;
use tracing::instrument;

/// Why a request conflicts with the room's current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum ConflictReason {
    /// The acting user's color is not the color to move.
    #[display("Not your turn")]
    NotYourTurn,

    /// The room is not in the status the operation requires.
    #[display("Room is {}, expected {}", actual, expected)]
    WrongStatus {
        /// Status the operation requires.
        expected: RoomStatus,
        /// Status the room is in.
        actual: RoomStatus,
    },

    /// The host tried to join their own room.
    #[display("Cannot join your own room")]
    SelfJoin,

    /// Only the host may perform this operation.
    #[display("Only the host can do that")]
    NotHost,

    /// The acting user holds no seat in the room.
    #[display("User is not seated in this room")]
    NotSeated,
}

/// Category of a session failure.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum SessionErrorKind {
    /// Malformed identifier, coordinate or payload.
    #[display("Validation failed: {}", _0)]
    Validation(String),

    /// The rule engine rejected the placement.
    #[display("Illegal move: {}", _0)]
    IllegalMove(MoveError),

    /// The request conflicts with the room's state.
    #[display("State conflict: {}", _0)]
    StateConflict(ConflictReason),

    /// No such room.
    #[display("Room {} not found", _0)]
    RoomNotFound(RoomId),

    /// No such user.
    #[display("User {} not found", _0)]
    UserNotFound(UserId),

    /// The persistent store failed.
    #[display("{}", _0)]
    Store(StoreError),

    /// A worker task failed.
    #[display("Internal error: {}", _0)]
    Internal(String),
}

/// Session error with location tracking.
///
/// Every variant except `Store` and `Internal` is recoverable: the room is
/// left untouched and the caller may correct its input and retry.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
#[display("Session error: {} at {}:{}", kind, file, line)]
pub struct SessionError {
    /// What went wrong.
    pub kind: SessionErrorKind,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl SessionError {
    /// Creates a new session error with caller location tracking.
    #[track_caller]
    #[instrument(skip(kind))]
    pub fn new(kind: SessionErrorKind) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            kind,
            line: loc.line(),
            file: loc.file(),
        }
    }

    /// Validation failure.
    #[track_caller]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(SessionErrorKind::Validation(message.into()))
    }

    /// State conflict with a reason code.
    #[track_caller]
    pub fn conflict(reason: ConflictReason) -> Self {
        Self::new(SessionErrorKind::StateConflict(reason))
    }

    /// The reason code, when this is a state conflict.
    pub fn conflict_reason(&self) -> Option<ConflictReason> {
        match self.kind {
            SessionErrorKind::StateConflict(reason) => Some(reason),
            _ => None,
        }
    }
}

impl From<MoveError> for SessionError {
    #[track_caller]
    fn from(err: MoveError) -> Self {
        Self::new(SessionErrorKind::IllegalMove(err))
    }
}

impl From<StoreError> for SessionError {
    #[track_caller]
    fn from(err: StoreError) -> Self {
        Self::new(SessionErrorKind::Store(err))
    }
}

/// Persistent store error with location tracking.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
#[display("Store error: {} at {}:{}", message, file, line)]
pub struct StoreError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl StoreError {
    /// Creates a new store error with caller location tracking.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(message: impl Into<String>) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message: message.into(),
            line: loc.line(),
            file: loc.file(),
        }
    }
}
