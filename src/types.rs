use serde::{Deserialize, Serialize};

use crate::board::Board;

pub const BOARD_SIZE: usize = 8;
/// Turn index of the black side. Black moves first.
pub const BLACK_INDEX: usize = 0;
pub const WHITE_INDEX: usize = 1;

/// A board coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub row: u8,
    pub col: u8,
}

impl Position {
    pub const fn new(row: u8, col: u8) -> Self {
        Self { row, col }
    }

    pub fn in_bounds(self) -> bool {
        (self.row as usize) < BOARD_SIZE && (self.col as usize) < BOARD_SIZE
    }

    /// Returns the square `(dr, dc)` away, or `None` when it falls off the board.
    pub fn offset(self, dr: i8, dc: i8) -> Option<Self> {
        let row = self.row as i8 + dr;
        let col = self.col as i8 + dc;
        let pos = Self {
            row: u8::try_from(row).ok()?,
            col: u8::try_from(col).ok()?,
        };
        pos.in_bounds().then_some(pos)
    }

    /// Signed `(row, col)` delta from `self` to `to`. Defined for any pair of
    /// coordinates, on the board or not.
    pub fn delta_to(self, to: Self) -> (i16, i16) {
        (
            i16::from(to.row) - i16::from(self.row),
            i16::from(to.col) - i16::from(self.col),
        )
    }

    /// Square halfway between `self` and `to`. Only meaningful for jumps.
    pub fn midpoint(self, to: Self) -> Self {
        Self {
            row: (self.row + to.row) / 2,
            col: (self.col + to.col) / 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Color {
    Black,
    White,
}

impl Color {
    pub fn from_turn_index(turn_index: usize) -> Option<Self> {
        match turn_index {
            BLACK_INDEX => Some(Self::Black),
            WHITE_INDEX => Some(Self::White),
            _ => None,
        }
    }

    pub fn turn_index(self) -> usize {
        match self {
            Self::Black => BLACK_INDEX,
            Self::White => WHITE_INDEX,
        }
    }

    pub fn opponent(self) -> Self {
        match self {
            Self::Black => Self::White,
            Self::White => Self::Black,
        }
    }

    /// Row step a man of this colour takes when moving forward.
    pub fn forward(self) -> i8 {
        match self {
            Self::Black => 1,
            Self::White => -1,
        }
    }

    /// Row on which men of this colour are crowned.
    pub fn crowning_row(self) -> u8 {
        match self {
            Self::Black => (BOARD_SIZE - 1) as u8,
            Self::White => 0,
        }
    }

    /// End-of-match scores with this colour as the winner.
    pub fn winning_scores(self) -> [u8; 2] {
        match self {
            Self::Black => [1, 0],
            Self::White => [0, 1],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Rank {
    Man,
    King,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Piece {
    pub color: Color,
    pub rank: Rank,
}

impl Piece {
    pub const fn new(color: Color, rank: Rank) -> Self {
        Self { color, rank }
    }

    pub fn is_king(self) -> bool {
        self.rank == Rank::King
    }

    /// Row steps this piece may take: forward only for men, both ways for kings.
    pub fn row_steps(self) -> &'static [i8] {
        match (self.rank, self.color) {
            (Rank::King, _) => &[1, -1],
            (Rank::Man, Color::Black) => &[1],
            (Rank::Man, Color::White) => &[-1],
        }
    }
}

/// Public match state returned from WASM APIs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchState {
    pub board: Option<Board>,
    pub turn_index: usize,
    pub black_count: u8,
    pub white_count: u8,
    pub is_match_over: bool,
    /// `[black, white]`; present only once the match has ended.
    pub end_match_scores: Option<[u8; 2]>,
    /// Set while the side to move must continue a capture chain with this piece.
    pub chain_piece: Option<Position>,
}

/// A `(from, to)` pair as offered to the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveCandidate {
    pub from: Position,
    pub to: Position,
}
