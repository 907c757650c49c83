//! First-class board invariants.
//!
//! Invariants are logical properties that must hold throughout play. They
//! are checked after every rule-engine mutation in debug builds and are
//! testable on their own.

use crate::types::{Board, CELL_COUNT, Square};

/// A logical property that must hold for a given state.
pub trait Invariant<S: ?Sized> {
    /// Checks if the invariant holds for the given state.
    fn holds(state: &S) -> bool;

    /// Human-readable description of the invariant.
    fn description() -> &'static str;
}

/// Violation of an invariant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvariantViolation {
    /// Description of the violated invariant.
    pub description: String,
}

impl InvariantViolation {
    /// Creates a new invariant violation.
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
        }
    }
}

/// A board before and after one placement.
#[derive(Debug, Clone, Copy)]
pub struct Transition<'a> {
    /// Board the move was played on.
    pub before: &'a Board,
    /// Resulting board.
    pub after: &'a Board,
}

/// Every reachable board holds between 4 and 64 discs.
pub struct DiscCountInRange;

impl Invariant<Board> for DiscCountInRange {
    fn holds(board: &Board) -> bool {
        (4..=CELL_COUNT as u32).contains(&board.filled())
    }

    fn description() -> &'static str {
        "Disc count must stay within [4, 64]"
    }
}

/// Flips change color only; a placed disc is never removed.
pub struct DiscsNeverRemoved;

impl<'a> Invariant<Transition<'a>> for DiscsNeverRemoved {
    fn holds(t: &Transition<'a>) -> bool {
        t.before
            .squares()
            .iter()
            .zip(t.after.squares())
            .all(|(before, after)| *before == Square::Empty || *after != Square::Empty)
    }

    fn description() -> &'static str {
        "Occupied cells must stay occupied"
    }
}

/// A placement adds exactly one disc.
pub struct OneDiscPlaced;

impl<'a> Invariant<Transition<'a>> for OneDiscPlaced {
    fn holds(t: &Transition<'a>) -> bool {
        t.after.filled() == t.before.filled() + 1
    }

    fn description() -> &'static str {
        "A placement must add exactly one disc"
    }
}

/// Checks all transition invariants, collecting every violation.
pub fn check_transition(before: &Board, after: &Board) -> Result<(), Vec<InvariantViolation>> {
    let t = Transition { before, after };
    let mut violations = Vec::new();

    if !DiscsNeverRemoved::holds(&t) {
        violations.push(InvariantViolation::new(DiscsNeverRemoved::description()));
    }
    if !OneDiscPlaced::holds(&t) {
        violations.push(InvariantViolation::new(OneDiscPlaced::description()));
    }

    if violations.is_empty() {
        Ok(())
    } else {
        Err(violations)
    }
}
