//! Move and move-error types.

use crate::position::Position;
use serde::{Deserialize, Serialize};

/// A move: place a disc on a cell, or pass when no placement is legal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Move {
    /// Place a disc at the position.
    Place(Position),
    /// No legal placement exists for the side to move.
    Pass,
}

impl Move {
    /// The placed position, if this is not a pass.
    pub fn position(&self) -> Option<Position> {
        match self {
            Move::Place(pos) => Some(*pos),
            Move::Pass => None,
        }
    }

    /// Returns true for [`Move::Pass`].
    pub fn is_pass(&self) -> bool {
        matches!(self, Move::Pass)
    }
}

impl std::fmt::Display for Move {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Move::Place(pos) => write!(f, "{}", pos),
            Move::Pass => f.write_str("pass"),
        }
    }
}

/// Why a placement was rejected by the rule engine.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum MoveError {
    /// Coordinates are outside `0..8`.
    #[display("Position ({}, {}) is off the board", row, col)]
    OutOfBounds {
        /// Requested row.
        row: usize,
        /// Requested column.
        col: usize,
    },

    /// The target cell already holds a disc.
    #[display("Cell {} is already occupied", _0)]
    Occupied(Position),

    /// No direction flanks an opponent run.
    #[display("Placing at {} flips no discs", _0)]
    NoFlips(Position),
}

impl std::error::Error for MoveError {}
