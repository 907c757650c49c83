//! Core domain types for Othello.

use crate::position::Position;
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Number of cells along one side of the board.
pub const BOARD_SIZE: usize = 8;

/// Total number of cells on the board.
pub const CELL_COUNT: usize = BOARD_SIZE * BOARD_SIZE;

/// Player in the game.
///
/// Black always moves first on a fresh board. On the wire each side is a
/// single letter: `B` or `W`.
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
    strum::EnumIter,
)]
pub enum Player {
    /// Black (moves first).
    #[serde(rename = "B")]
    #[strum(serialize = "B")]
    Black,
    /// White.
    #[serde(rename = "W")]
    #[strum(serialize = "W")]
    White,
}

impl Player {
    /// Returns the opponent player.
    pub fn opponent(self) -> Self {
        match self {
            Player::Black => Player::White,
            Player::White => Player::Black,
        }
    }

    /// Wire symbol used in the 64-character board form.
    pub fn symbol(self) -> char {
        match self {
            Player::Black => 'B',
            Player::White => 'W',
        }
    }
}

/// A single cell on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Square {
    /// Empty cell.
    Empty,
    /// Cell holding a disc of the given color.
    Occupied(Player),
}

impl Square {
    /// Wire symbol for this cell.
    pub fn symbol(self) -> char {
        match self {
            Square::Empty => ' ',
            Square::Occupied(player) => player.symbol(),
        }
    }

    fn from_symbol(symbol: char) -> Option<Self> {
        match symbol {
            ' ' => Some(Square::Empty),
            'B' => Some(Square::Occupied(Player::Black)),
            'W' => Some(Square::Occupied(Player::White)),
            _ => None,
        }
    }
}

/// Disc tally for both colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DiscCounts {
    /// Black discs on the board.
    pub black: u32,
    /// White discs on the board.
    pub white: u32,
}

impl DiscCounts {
    /// Discs belonging to `player`.
    pub fn of(&self, player: Player) -> u32 {
        match player {
            Player::Black => self.black,
            Player::White => self.white,
        }
    }

    /// Total discs placed.
    pub fn total(&self) -> u32 {
        self.black + self.white
    }
}

/// Final result of a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    /// One side holds the majority of discs (or won by forfeit).
    Winner(Player),
    /// Equal disc counts.
    Draw,
}

impl Outcome {
    /// Wire form: `B`, `W` or `draw`.
    pub fn as_wire(&self) -> &'static str {
        match self {
            Outcome::Winner(Player::Black) => "B",
            Outcome::Winner(Player::White) => "W",
            Outcome::Draw => "draw",
        }
    }
}

/// 8x8 Othello board stored as a flat row-major buffer.
///
/// Serializes to exactly 64 characters over the alphabet `' '`, `'B'`, `'W'`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Board {
    squares: [Square; CELL_COUNT],
}

impl Board {
    /// Creates a board with every cell empty.
    pub fn empty() -> Self {
        Self {
            squares: [Square::Empty; CELL_COUNT],
        }
    }

    /// Standard starting position: White on (3,3) and (4,4), Black on (3,4) and (4,3).
    pub fn initial() -> Self {
        let mut board = Self::empty();
        board.squares[3 * BOARD_SIZE + 3] = Square::Occupied(Player::White);
        board.squares[3 * BOARD_SIZE + 4] = Square::Occupied(Player::Black);
        board.squares[4 * BOARD_SIZE + 3] = Square::Occupied(Player::Black);
        board.squares[4 * BOARD_SIZE + 4] = Square::Occupied(Player::White);
        board
    }

    /// Gets the square at the given position.
    pub fn get(&self, pos: Position) -> Square {
        self.squares[pos.index()]
    }

    /// Sets the square at the given position.
    ///
    /// This is raw board editing with no rule checks; use
    /// [`crate::rules::apply`] to play a move.
    pub fn set(&mut self, pos: Position, square: Square) {
        self.squares[pos.index()] = square;
    }

    /// Checks if a square is empty.
    pub fn is_empty(&self, pos: Position) -> bool {
        self.get(pos) == Square::Empty
    }

    /// Returns all squares in row-major order.
    pub fn squares(&self) -> &[Square; CELL_COUNT] {
        &self.squares
    }

    /// Counts discs of each color.
    pub fn counts(&self) -> DiscCounts {
        self.squares
            .iter()
            .fold(DiscCounts::default(), |mut counts, square| {
                match square {
                    Square::Occupied(Player::Black) => counts.black += 1,
                    Square::Occupied(Player::White) => counts.white += 1,
                    Square::Empty => {}
                }
                counts
            })
    }

    /// Number of non-empty cells.
    pub fn filled(&self) -> u32 {
        self.counts().total()
    }

    /// Multi-line rendering with row and column labels, for terminals.
    pub fn render(&self) -> String {
        let mut result = String::from("  0 1 2 3 4 5 6 7\n");
        for row in 0..BOARD_SIZE {
            result.push_str(&row.to_string());
            for col in 0..BOARD_SIZE {
                let symbol = match self.squares[row * BOARD_SIZE + col] {
                    Square::Empty => '.',
                    Square::Occupied(Player::Black) => 'B',
                    Square::Occupied(Player::White) => 'W',
                };
                result.push(' ');
                result.push(symbol);
            }
            result.push('\n');
        }
        result
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::initial()
    }
}

impl std::fmt::Display for Board {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text: String = self.squares.iter().map(|square| square.symbol()).collect();
        f.write_str(&text)
    }
}

impl FromStr for Board {
    type Err = BoardParseError;

    #[track_caller]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let len = s.chars().count();
        if len != CELL_COUNT {
            return Err(BoardParseError::new(format!(
                "expected {} cells, found {}",
                CELL_COUNT, len
            )));
        }

        let mut board = Board::empty();
        for (index, symbol) in s.chars().enumerate() {
            board.squares[index] = Square::from_symbol(symbol).ok_or_else(|| {
                BoardParseError::new(format!("invalid cell {:?} at index {}", symbol, index))
            })?;
        }
        Ok(board)
    }
}

impl From<Board> for String {
    fn from(board: Board) -> Self {
        board.to_string()
    }
}

impl TryFrom<String> for Board {
    type Error = BoardParseError;

    #[track_caller]
    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Error parsing the 64-character board form.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
#[display("Board parse error: {} at {}:{}", message, file, line)]
pub struct BoardParseError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl BoardParseError {
    /// Creates a new parse error with caller location tracking.
    #[track_caller]
    pub fn new(message: impl Into<String>) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message: message.into(),
            line: loc.line(),
            file: loc.file(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_board_layout() {
        let board = Board::initial();
        let counts = board.counts();
        assert_eq!(counts.black, 2);
        assert_eq!(counts.white, 2);
        assert_eq!(
            board.get(Position::new(3, 3).unwrap()),
            Square::Occupied(Player::White)
        );
        assert_eq!(
            board.get(Position::new(3, 4).unwrap()),
            Square::Occupied(Player::Black)
        );
    }

    #[test]
    fn test_board_text_is_64_chars() {
        let text = Board::initial().to_string();
        assert_eq!(text.chars().count(), 64);
        assert_eq!(&text[27..29], "WB");
        assert_eq!(&text[35..37], "BW");
    }

    #[test]
    fn test_parse_rejects_wrong_length() {
        let err = "BW".parse::<Board>().unwrap_err();
        assert!(err.message.contains("expected 64"));
    }

    #[test]
    fn test_parse_rejects_unknown_symbol() {
        let text = "X".repeat(64);
        let err = text.parse::<Board>().unwrap_err();
        assert!(err.message.contains("invalid cell"));
    }

    #[test]
    fn test_serde_uses_board_text() {
        let board = Board::initial();
        let json = serde_json::to_string(&board).unwrap();
        assert_eq!(json, format!("\"{}\"", board));
        let back: Board = serde_json::from_str(&json).unwrap();
        assert_eq!(back, board);
    }

    #[test]
    fn test_player_wire_symbols() {
        assert_eq!(Player::Black.to_string(), "B");
        assert_eq!("W".parse::<Player>().unwrap(), Player::White);
        assert_eq!(Player::White.opponent(), Player::Black);
    }

    #[test]
    fn test_outcome_wire_form() {
        assert_eq!(Outcome::Winner(Player::White).as_wire(), "W");
        assert_eq!(Outcome::Draw.as_wire(), "draw");
    }
}
