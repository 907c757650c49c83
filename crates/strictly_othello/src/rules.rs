//! Othello rules: legality, flipping, move generation and termination.
//!
//! Every function here is pure. Boards are `Copy`, so [`apply`] returns the
//! next board and leaves its input untouched.

use crate::action::MoveError;
use crate::invariants;
use crate::position::{Direction, Position};
use crate::types::{Board, Outcome, Player, Square};
use strum::IntoEnumIterator;

/// Standard starting board.
pub fn initial_board() -> Board {
    Board::initial()
}

/// Checks whether `player` may place a disc at (`row`, `col`).
///
/// Returns false for off-board coordinates and occupied cells.
pub fn is_legal(board: &Board, row: usize, col: usize, player: Player) -> bool {
    Position::new(row, col).is_some_and(|pos| is_legal_at(board, pos, player))
}

/// Position-based form of [`is_legal`].
pub fn is_legal_at(board: &Board, pos: Position, player: Player) -> bool {
    board.is_empty(pos) && Direction::iter().any(|dir| flanked_run(board, pos, player, dir) > 0)
}

/// Plays `player` at (`row`, `col`) and returns the resulting board.
///
/// # Errors
///
/// Returns [`MoveError`] if the coordinates are off the board, the cell is
/// occupied, or no direction flips a disc.
pub fn apply(board: &Board, row: usize, col: usize, player: Player) -> Result<Board, MoveError> {
    let pos = Position::new(row, col).ok_or(MoveError::OutOfBounds { row, col })?;
    apply_at(board, pos, player)
}

/// Position-based form of [`apply`].
///
/// # Errors
///
/// Returns [`MoveError::Occupied`] or [`MoveError::NoFlips`] when the move is
/// illegal.
pub fn apply_at(board: &Board, pos: Position, player: Player) -> Result<Board, MoveError> {
    if !board.is_empty(pos) {
        return Err(MoveError::Occupied(pos));
    }
    if !Direction::iter().any(|dir| flanked_run(board, pos, player, dir) > 0) {
        return Err(MoveError::NoFlips(pos));
    }
    Ok(place_unchecked(board, pos, player))
}

/// Places a disc and flips every flanked run. Caller guarantees legality.
///
/// All runs are measured against the pre-move board and flipped together.
pub(crate) fn place_unchecked(board: &Board, pos: Position, player: Player) -> Board {
    let mut runs = [(Direction::North, 0usize); 8];
    for (slot, dir) in runs.iter_mut().zip(Direction::iter()) {
        *slot = (dir, flanked_run(board, pos, player, dir));
    }

    let mut next = *board;
    next.set(pos, Square::Occupied(player));
    for (dir, run) in runs {
        let mut cursor = pos;
        for _ in 0..run {
            match cursor.step(dir) {
                Some(cell) => {
                    next.set(cell, Square::Occupied(player));
                    cursor = cell;
                }
                None => break,
            }
        }
    }

    debug_assert!(
        invariants::check_transition(board, &next).is_ok(),
        "Board invariants violated by placement at {}",
        pos
    );
    next
}

/// Length of the opponent run adjacent to `origin` in `dir` that is closed by
/// a `player` disc. Zero when the run hits an empty cell or the board edge.
fn flanked_run(board: &Board, origin: Position, player: Player, dir: Direction) -> usize {
    let opponent = player.opponent();
    let mut run = 0;
    let mut cursor = origin.step(dir);

    while let Some(pos) = cursor {
        match board.get(pos) {
            Square::Occupied(p) if p == opponent => run += 1,
            Square::Occupied(_) => return run,
            Square::Empty => return 0,
        }
        cursor = pos.step(dir);
    }

    0
}

/// All legal placements for `player`, in row-major order.
pub fn legal_moves(board: &Board, player: Player) -> Vec<Position> {
    Position::all()
        .filter(|&pos| is_legal_at(board, pos, player))
        .collect()
}

/// Whether `player` has at least one legal placement.
pub fn has_legal_move(board: &Board, player: Player) -> bool {
    Position::all().any(|pos| is_legal_at(board, pos, player))
}

/// The game is over when neither color can move.
pub fn is_terminal(board: &Board) -> bool {
    !has_legal_move(board, Player::Black) && !has_legal_move(board, Player::White)
}

/// Majority disc count wins; equal counts draw.
pub fn winner(board: &Board) -> Outcome {
    let counts = board.counts();
    match counts.black.cmp(&counts.white) {
        std::cmp::Ordering::Greater => Outcome::Winner(Player::Black),
        std::cmp::Ordering::Less => Outcome::Winner(Player::White),
        std::cmp::Ordering::Equal => Outcome::Draw,
    }
}
