//! Board coordinates and compass directions.

use crate::types::{BOARD_SIZE, CELL_COUNT};
use serde::{Deserialize, Serialize};

/// A cell coordinate with `row` and `col` in `0..8`.
///
/// Construction is bounds-checked, so every `Position` indexes a real cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    row: u8,
    col: u8,
}

impl Position {
    /// Creates a position, or `None` when either coordinate is off the board.
    pub fn new(row: usize, col: usize) -> Option<Self> {
        if row < BOARD_SIZE && col < BOARD_SIZE {
            Some(Self {
                row: row as u8,
                col: col as u8,
            })
        } else {
            None
        }
    }

    /// Creates a position from a row-major index (0-63).
    pub fn from_index(index: usize) -> Option<Self> {
        if index < CELL_COUNT {
            Self::new(index / BOARD_SIZE, index % BOARD_SIZE)
        } else {
            None
        }
    }

    /// Row (0-7).
    pub fn row(self) -> usize {
        self.row as usize
    }

    /// Column (0-7).
    pub fn col(self) -> usize {
        self.col as usize
    }

    /// Row-major index (0-63).
    pub fn index(self) -> usize {
        self.row() * BOARD_SIZE + self.col()
    }

    /// The neighbouring cell in `direction`, if it is on the board.
    pub fn step(self, direction: Direction) -> Option<Self> {
        let (dr, dc) = direction.delta();
        let row = self.row as i8 + dr;
        let col = self.col as i8 + dc;
        if row < 0 || col < 0 {
            return None;
        }
        Self::new(row as usize, col as usize)
    }

    /// One of the four corner cells.
    pub fn is_corner(self) -> bool {
        let last = (BOARD_SIZE - 1) as u8;
        (self.row == 0 || self.row == last) && (self.col == 0 || self.col == last)
    }

    /// A border cell that is not a corner.
    pub fn is_edge(self) -> bool {
        let last = (BOARD_SIZE - 1) as u8;
        let on_border = self.row == 0 || self.row == last || self.col == 0 || self.col == last;
        on_border && !self.is_corner()
    }

    /// All 64 positions in row-major order.
    pub fn all() -> impl Iterator<Item = Position> {
        (0..CELL_COUNT).filter_map(Self::from_index)
    }

    /// The four corner cells.
    pub const CORNERS: [Position; 4] = [
        Position { row: 0, col: 0 },
        Position { row: 0, col: 7 },
        Position { row: 7, col: 0 },
        Position { row: 7, col: 7 },
    ];
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{},{}", self.row, self.col)
    }
}

/// The eight compass directions a run of discs can be flanked along.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::EnumIter)]
pub enum Direction {
    /// Up.
    North,
    /// Down.
    South,
    /// Left.
    West,
    /// Right.
    East,
    /// Up-left.
    NorthWest,
    /// Up-right.
    NorthEast,
    /// Down-left.
    SouthWest,
    /// Down-right.
    SouthEast,
}

impl Direction {
    /// (row delta, col delta).
    pub fn delta(self) -> (i8, i8) {
        match self {
            Direction::North => (-1, 0),
            Direction::South => (1, 0),
            Direction::West => (0, -1),
            Direction::East => (0, 1),
            Direction::NorthWest => (-1, -1),
            Direction::NorthEast => (-1, 1),
            Direction::SouthWest => (1, -1),
            Direction::SouthEast => (1, 1),
        }
    }
}
