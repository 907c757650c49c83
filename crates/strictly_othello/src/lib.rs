//! Strictly Othello - pure game logic
//!
//! Deterministic Othello rules and a depth-limited alpha-beta opponent.
//! Nothing in this crate performs I/O or blocks; every operation is a pure
//! function of its inputs.
//!
//! # Architecture
//!
//! - **Types**: [`Board`] (flat 64-cell buffer), [`Player`], [`Square`], [`Position`]
//! - **Rules**: legality, flipping, move generation, termination ([`rules`])
//! - **Search**: minimax with alpha-beta pruning ([`search`])
//! - **Invariants**: checkable board properties ([`invariants`])
//!
//! # Example
//!
//! ```
//! use strictly_othello::{Board, Move, Player, rules, search};
//!
//! let board = Board::initial();
//! let board = rules::apply(&board, 2, 3, Player::Black).unwrap();
//! assert_eq!(board.counts().black, 4);
//!
//! let reply = search::choose_move(&board, Player::White, 3);
//! assert!(matches!(reply, Move::Place(_)));
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod action;
mod position;
mod types;

pub mod invariants;
pub mod rules;
pub mod search;

pub use action::{Move, MoveError};
pub use position::{Direction, Position};
pub use search::{SearchResult, choose_move};
pub use types::{
    BOARD_SIZE, Board, BoardParseError, CELL_COUNT, DiscCounts, Outcome, Player, Square,
};
