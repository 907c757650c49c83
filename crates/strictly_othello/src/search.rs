//! Depth-limited minimax with alpha-beta pruning.
//!
//! The searching color maximizes at the root. Every recursive call, whether
//! it follows a placement, a retained turn or a pass, is told explicitly that
//! it plays the opposite role to its parent. Leaves are always scored from the
//! searching color's side.

use crate::action::Move;
use crate::position::Position;
use crate::rules;
use crate::types::{Board, Player, Square};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// Score for a finished game the searching side has won.
pub const WIN_SCORE: i32 = 1000;

/// Bonus (or penalty) per corner held by the searching side (or opponent).
pub const CORNER_WEIGHT: i32 = 10;

/// Bonus per non-corner border cell held by the searching side.
pub const EDGE_WEIGHT: i32 = 2;

/// The chosen move and its minimax score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Best move found; [`Move::Pass`] when the side has no placement.
    pub best_move: Move,
    /// Minimax score from the searching side's point of view.
    pub score: i32,
}

/// Chooses a move for `player` searching `depth` plies ahead.
///
/// Never returns an illegal placement: the result is a member of
/// [`rules::legal_moves`] or [`Move::Pass`] when that set is empty.
pub fn choose_move(board: &Board, player: Player, depth: u32) -> Move {
    search(board, player, depth).best_move
}

/// Runs the search and returns the move with its score.
///
/// A depth of zero is treated as one so the root always considers its moves.
#[instrument(skip(board))]
pub fn search(board: &Board, player: Player, depth: u32) -> SearchResult {
    let depth = depth.max(1);
    let result = minimax(board, player, player, depth, i32::MIN, i32::MAX, true);
    debug!(best_move = %result.best_move, score = result.score, "Search complete");
    result
}

fn minimax(
    board: &Board,
    to_move: Player,
    root: Player,
    depth: u32,
    mut alpha: i32,
    mut beta: i32,
    maximizing: bool,
) -> SearchResult {
    let terminal = rules::is_terminal(board);
    if depth == 0 || terminal {
        return SearchResult {
            best_move: Move::Pass,
            score: score_leaf(board, root, terminal),
        };
    }

    let moves = rules::legal_moves(board, to_move);
    if moves.is_empty() {
        let reply = minimax(
            board,
            to_move.opponent(),
            root,
            depth - 1,
            alpha,
            beta,
            !maximizing,
        );
        return SearchResult {
            best_move: Move::Pass,
            score: reply.score,
        };
    }

    let mut best: Option<SearchResult> = None;

    for pos in moves {
        let next = rules::place_unchecked(board, pos, to_move);
        let next_to_move = if rules::has_legal_move(&next, to_move.opponent()) {
            to_move.opponent()
        } else {
            to_move
        };

        let score =
            minimax(&next, next_to_move, root, depth - 1, alpha, beta, !maximizing).score;

        let improved = match best {
            None => true,
            Some(current) if maximizing => score > current.score,
            Some(current) => score < current.score,
        };
        if improved {
            best = Some(SearchResult {
                best_move: Move::Place(pos),
                score,
            });
        }

        if maximizing {
            alpha = alpha.max(score);
        } else {
            beta = beta.min(score);
        }
        if beta <= alpha {
            break;
        }
    }

    best.unwrap_or(SearchResult {
        best_move: Move::Pass,
        score: score_leaf(board, root, false),
    })
}

/// Static evaluation of `board` from `player`'s point of view.
pub fn evaluate(board: &Board, player: Player) -> i32 {
    score_leaf(board, player, rules::is_terminal(board))
}

fn score_leaf(board: &Board, player: Player, terminal: bool) -> i32 {
    let counts = board.counts();
    let own = counts.of(player) as i32;
    let theirs = counts.of(player.opponent()) as i32;

    if terminal {
        return match own.cmp(&theirs) {
            std::cmp::Ordering::Greater => WIN_SCORE,
            std::cmp::Ordering::Less => -WIN_SCORE,
            std::cmp::Ordering::Equal => 0,
        };
    }

    let corners: i32 = Position::CORNERS
        .iter()
        .map(|&pos| match board.get(pos) {
            Square::Occupied(p) if p == player => CORNER_WEIGHT,
            Square::Occupied(_) => -CORNER_WEIGHT,
            Square::Empty => 0,
        })
        .sum();

    let edges: i32 = Position::all()
        .filter(|pos| pos.is_edge() && board.get(*pos) == Square::Occupied(player))
        .map(|_| EDGE_WEIGHT)
        .sum();

    (own - theirs) + corners + edges
}
