use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::BoardError;
use crate::types::{BOARD_SIZE, Color, Piece, Position, Rank};

const HOME_ROWS: usize = 3;

/// One cell of the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Square {
    /// Unplayable light square.
    Light,
    /// Playable dark square without a piece.
    Empty,
    Occupied(Piece),
}

impl Square {
    pub fn piece(self) -> Option<Piece> {
        match self {
            Self::Occupied(piece) => Some(piece),
            _ => None,
        }
    }

    /// Colour of the piece on this square. `None` for empty and light squares.
    pub fn color(self) -> Option<Color> {
        self.piece().map(|piece| piece.color)
    }

    pub fn rank(self) -> Option<Rank> {
        self.piece().map(|piece| piece.rank)
    }

    pub fn is_empty(self) -> bool {
        self == Self::Empty
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = match self {
            Self::Light => "--",
            Self::Empty => "DS",
            Self::Occupied(Piece { color, rank }) => match (color, rank) {
                (Color::Black, Rank::Man) => "BM",
                (Color::Black, Rank::King) => "BK",
                (Color::White, Rank::Man) => "WM",
                (Color::White, Rank::King) => "WK",
            },
        };
        f.write_str(code)
    }
}

impl FromStr for Square {
    type Err = BoardError;

    fn from_str(code: &str) -> Result<Self, Self::Err> {
        let square = match code {
            "--" => Self::Light,
            "DS" => Self::Empty,
            "BM" => Self::Occupied(Piece::new(Color::Black, Rank::Man)),
            "BK" => Self::Occupied(Piece::new(Color::Black, Rank::King)),
            "WM" => Self::Occupied(Piece::new(Color::White, Rank::Man)),
            "WK" => Self::Occupied(Piece::new(Color::White, Rank::King)),
            _ => {
                return Err(BoardError::UnknownSquare {
                    code: code.to_string(),
                });
            }
        };
        Ok(square)
    }
}

impl TryFrom<String> for Square {
    type Error = BoardError;

    fn try_from(code: String) -> Result<Self, Self::Error> {
        code.parse()
    }
}

impl From<Square> for String {
    fn from(square: Square) -> Self {
        square.to_string()
    }
}

pub type Cells = [[Square; BOARD_SIZE]; BOARD_SIZE];

/// Checkers board. Always well-formed: light squares hold `Light` and nothing
/// else does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Cells", into = "Cells")]
pub struct Board {
    cells: Cells,
}

impl Board {
    /// Creates the opening board: black men on rows 0..3, white men on rows 5..8.
    pub fn new() -> Self {
        let mut board = Self::empty();
        for row in 0..BOARD_SIZE {
            let color = if row < HOME_ROWS {
                Color::Black
            } else if row >= BOARD_SIZE - HOME_ROWS {
                Color::White
            } else {
                continue;
            };
            for col in 0..BOARD_SIZE {
                if is_dark(row, col) {
                    board.cells[row][col] = Square::Occupied(Piece::new(color, Rank::Man));
                }
            }
        }
        board
    }

    /// Creates a board with every dark square empty.
    pub fn empty() -> Self {
        let mut cells = [[Square::Light; BOARD_SIZE]; BOARD_SIZE];
        for (row, cells_row) in cells.iter_mut().enumerate() {
            for (col, cell) in cells_row.iter_mut().enumerate() {
                if is_dark(row, col) {
                    *cell = Square::Empty;
                }
            }
        }
        Self { cells }
    }

    /// Builds a board from cells, rejecting anything that is not well-formed.
    pub fn from_cells(cells: Cells) -> Result<Self, BoardError> {
        for (row, cells_row) in cells.iter().enumerate() {
            for (col, cell) in cells_row.iter().enumerate() {
                match (is_dark(row, col), cell) {
                    (false, Square::Light) | (true, Square::Empty | Square::Occupied(_)) => {}
                    (false, _) => return Err(BoardError::PieceOnLightSquare { row, col }),
                    (true, Square::Light) => {
                        return Err(BoardError::LightMarkerOnDarkSquare { row, col });
                    }
                }
            }
        }
        Ok(Self { cells })
    }

    /// Builds a board from two-letter square codes (`"--"`, `"DS"`, `"BM"`, ...).
    pub fn from_codes(codes: [[&str; BOARD_SIZE]; BOARD_SIZE]) -> Result<Self, BoardError> {
        let mut cells = [[Square::Light; BOARD_SIZE]; BOARD_SIZE];
        for (row, codes_row) in codes.iter().enumerate() {
            for (col, code) in codes_row.iter().enumerate() {
                cells[row][col] = code.parse()?;
            }
        }
        Self::from_cells(cells)
    }

    /// Builds a board from eight whitespace-separated rows of square codes, the
    /// same layout `Display` prints.
    pub fn from_rows(rows: [&str; BOARD_SIZE]) -> Result<Self, BoardError> {
        let mut codes = [["--"; BOARD_SIZE]; BOARD_SIZE];
        for (row, line) in rows.iter().enumerate() {
            let row_codes: Vec<&str> = line.split_whitespace().collect();
            if row_codes.len() != BOARD_SIZE {
                return Err(BoardError::RowLength {
                    row,
                    len: row_codes.len(),
                });
            }
            codes[row].copy_from_slice(&row_codes);
        }
        Self::from_codes(codes)
    }

    pub fn cells(&self) -> &Cells {
        &self.cells
    }

    /// Square at `pos`; out-of-bounds positions read as `Light`.
    pub fn get(&self, pos: Position) -> Square {
        if pos.in_bounds() {
            self.cells[pos.row as usize][pos.col as usize]
        } else {
            Square::Light
        }
    }

    pub fn piece_at(&self, pos: Position) -> Option<Piece> {
        self.get(pos).piece()
    }

    /// Writes a playable value to a dark square. Light squares are left untouched.
    pub(crate) fn set(&mut self, pos: Position, square: Square) {
        debug_assert!(square != Square::Light, "light squares are permanent");
        if is_dark_square(pos) {
            self.cells[pos.row as usize][pos.col as usize] = square;
        }
    }

    /// Every occupied square with its piece, row-major.
    pub fn pieces(&self) -> impl Iterator<Item = (Position, Piece)> + '_ {
        self.cells.iter().enumerate().flat_map(|(row, cells_row)| {
            cells_row.iter().enumerate().filter_map(move |(col, cell)| {
                cell.piece()
                    .map(|piece| (Position::new(row as u8, col as u8), piece))
            })
        })
    }

    pub fn pieces_of(&self, color: Color) -> impl Iterator<Item = (Position, Piece)> + '_ {
        self.pieces().filter(move |(_, piece)| piece.color == color)
    }

    /// Returns `(black_count, white_count)`.
    pub fn count(&self) -> (u8, u8) {
        self.pieces()
            .fold((0, 0), |(black, white), (_, piece)| match piece.color {
                Color::Black => (black + 1, white),
                Color::White => (black, white + 1),
            })
    }

    pub fn count_of(&self, color: Color) -> u8 {
        let (black, white) = self.count();
        match color {
            Color::Black => black,
            Color::White => white,
        }
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl TryFrom<Cells> for Board {
    type Error = BoardError;

    fn try_from(cells: Cells) -> Result<Self, Self::Error> {
        Self::from_cells(cells)
    }
}

impl From<Board> for Cells {
    fn from(board: Board) -> Self {
        board.cells
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for cells_row in &self.cells {
            let line: Vec<String> = cells_row.iter().map(ToString::to_string).collect();
            writeln!(f, "{}", line.join(" "))?;
        }
        Ok(())
    }
}

/// True iff `pos` is on the board and `row + col` is odd.
pub fn is_dark_square(pos: Position) -> bool {
    pos.in_bounds() && is_dark(pos.row as usize, pos.col as usize)
}

fn is_dark(row: usize, col: usize) -> bool {
    (row % 2 == 0) != (col % 2 == 0)
}
