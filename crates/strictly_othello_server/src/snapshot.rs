//! Client-facing views of a room.

use crate::ids::RoomId;
use crate::room::{RoomState, RoomStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strictly_othello::{Board, Player};

/// Everything a seated client needs to render a room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameStateSnapshot {
    /// Room this snapshot describes.
    pub room_id: RoomId,
    /// 64-character board text.
    pub board_state: Board,
    /// Color to move.
    pub turn: Player,
    /// Lifecycle status.
    pub status: RoomStatus,
    /// True once the room is finished.
    pub is_game_over: bool,
    /// `"B"`, `"W"`, `"draw"`, or absent while undecided.
    pub winner: Option<String>,
    /// Host display name.
    pub host_name: String,
    /// Guest display name, if seated.
    pub guest_name: Option<String>,
    /// Black discs on the board.
    pub black_count: u32,
    /// White discs on the board.
    pub white_count: u32,
    /// Placements since the game started.
    pub move_count: u32,
    /// Optional notice for the clients.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl GameStateSnapshot {
    /// Snapshot of `room` without a message.
    pub fn of(room: &RoomState) -> Self {
        let counts = room.board.counts();
        Self {
            room_id: room.id,
            board_state: room.board,
            turn: room.turn,
            status: room.status,
            is_game_over: room.status == RoomStatus::Finished,
            winner: room.winner.map(|w| w.as_wire().to_string()),
            host_name: room.host.name.clone(),
            guest_name: room.guest.as_ref().map(|g| g.name.clone()),
            black_count: counts.black,
            white_count: counts.white,
            move_count: room.move_count,
            message: None,
        }
    }

    /// Attaches a notice.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// Lobby entry for a room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSummary {
    /// Room identifier.
    pub id: RoomId,
    /// Host display name.
    pub host_name: String,
    /// Lifecycle status.
    pub status: RoomStatus,
    /// When the room was created.
    pub created_at: DateTime<Utc>,
}

impl From<&RoomState> for RoomSummary {
    fn from(room: &RoomState) -> Self {
        Self {
            id: room.id,
            host_name: room.host.name.clone(),
            status: room.status,
            created_at: room.created_at,
        }
    }
}
