use crate::board::Board;
use crate::rules::winner;
use crate::types::{BOARD_SIZE, Color, Piece, Position, Rank};

const MAGIC: &[u8; 4] = b"CKPW";
const VERSION: u32 = 1;
const HEADER_SIZE: usize = 20;
const BOARD_CELLS: usize = BOARD_SIZE * BOARD_SIZE;
const PAYLOAD_SIZE: usize = BOARD_CELLS * 4;

/// Score of a position black has won.
pub const MAX_SCORE: i32 = i32::MAX;
/// Score of a position white has won.
pub const MIN_SCORE: i32 = i32::MIN;

const MAN_VALUE: i32 = 5;
/// A man one step away from its crowning row.
const ADVANCED_MAN_VALUE: i32 = 7;
const KING_VALUE: i32 = 10;
/// Largest accepted `|weight|`. A full board of kings then stays far from the
/// decided-score extremes.
pub const MAX_WEIGHT: i32 = 1_000_000;

const DEFAULT_WEIGHTS: [[i32; BOARD_SIZE]; BOARD_SIZE] = [
    [0, 4, 0, 4, 0, 4, 0, 4],
    [4, 0, 3, 0, 3, 0, 3, 0],
    [0, 3, 0, 3, 0, 3, 0, 2],
    [2, 0, 3, 0, 4, 0, 3, 0],
    [0, 3, 0, 4, 0, 3, 0, 2],
    [2, 0, 3, 0, 3, 0, 3, 0],
    [0, 3, 0, 3, 0, 3, 0, 4],
    [4, 0, 4, 0, 4, 0, 4, 0],
];

/// Per-square multipliers applied to piece values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionalWeights {
    table: [[i32; BOARD_SIZE]; BOARD_SIZE],
}

impl PositionalWeights {
    pub const DEFAULT: Self = Self {
        table: DEFAULT_WEIGHTS,
    };

    pub fn new(table: [[i32; BOARD_SIZE]; BOARD_SIZE]) -> Self {
        Self { table }
    }

    pub fn weight(&self, pos: Position) -> i32 {
        self.table[pos.row as usize][pos.col as usize]
    }

    /// Deserialize a weights blob:
    /// `CKPW`, version, cell count, CRC32 of the payload, reserved, then
    /// 64 little-endian `i32` weights in row-major order.
    pub fn from_bytes(data: &[u8]) -> Result<Self, String> {
        if data.len() < HEADER_SIZE {
            return Err(format!(
                "weights data too short: expected at least {HEADER_SIZE} bytes, got {}",
                data.len()
            ));
        }

        if &data[0..4] != MAGIC {
            return Err("invalid weights magic (expected CKPW)".to_string());
        }

        let version = read_u32_le(data, 4)?;
        if version != VERSION {
            return Err(format!(
                "unsupported weights version: expected {VERSION}, got {version}"
            ));
        }

        let cells = read_u32_le(data, 8)? as usize;
        if cells != BOARD_CELLS {
            return Err(format!(
                "weights table must cover {BOARD_CELLS} squares, got {cells}"
            ));
        }

        let expected_crc = read_u32_le(data, 12)?;
        let payload = &data[HEADER_SIZE..];
        let actual_crc = crc32fast::hash(payload);
        if actual_crc != expected_crc {
            return Err(format!(
                "CRC32 mismatch: expected {expected_crc:#010x}, got {actual_crc:#010x}"
            ));
        }

        if payload.len() != PAYLOAD_SIZE {
            return Err(format!(
                "weights payload must be {PAYLOAD_SIZE} bytes, got {}",
                payload.len()
            ));
        }

        let mut table = [[0i32; BOARD_SIZE]; BOARD_SIZE];
        for (idx, chunk) in payload.chunks_exact(4).enumerate() {
            let mut bytes = [0u8; 4];
            bytes.copy_from_slice(chunk);
            let weight = i32::from_le_bytes(bytes);
            if weight.unsigned_abs() > MAX_WEIGHT.unsigned_abs() {
                return Err(format!(
                    "weight {weight} at square {idx} exceeds the limit of {MAX_WEIGHT}"
                ));
            }
            table[idx / BOARD_SIZE][idx % BOARD_SIZE] = weight;
        }

        Ok(Self { table })
    }

    /// Serialize into the format read by [`PositionalWeights::from_bytes`].
    pub fn to_bytes(&self) -> Vec<u8> {
        let payload: Vec<u8> = self
            .table
            .iter()
            .flatten()
            .flat_map(|weight| weight.to_le_bytes())
            .collect();

        let mut out = Vec::with_capacity(HEADER_SIZE + payload.len());
        out.extend_from_slice(MAGIC);
        out.extend_from_slice(&VERSION.to_le_bytes());
        out.extend_from_slice(&(BOARD_CELLS as u32).to_le_bytes());
        out.extend_from_slice(&crc32fast::hash(&payload).to_le_bytes());
        out.extend_from_slice(&0u32.to_le_bytes());
        out.extend_from_slice(&payload);
        out
    }
}

impl Default for PositionalWeights {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Static evaluator. Scores are from black's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Evaluator {
    weights: PositionalWeights,
}

impl Evaluator {
    pub fn new(weights: PositionalWeights) -> Self {
        Self { weights }
    }

    pub fn weights(&self) -> &PositionalWeights {
        &self.weights
    }

    /// Evaluate `board` with `turn_index` to move. Decided positions score
    /// [`MAX_SCORE`] or [`MIN_SCORE`]; every other position scores strictly
    /// between them.
    pub fn evaluate(&self, board: &Board, turn_index: usize) -> i32 {
        match winner(board, turn_index) {
            Some(Color::Black) => return MAX_SCORE,
            Some(Color::White) => return MIN_SCORE,
            None => {}
        }

        let total: i64 = board
            .pieces()
            .map(|(pos, piece)| {
                let value = i64::from(piece_value(piece, pos)) * i64::from(self.weights.weight(pos));
                match piece.color {
                    Color::Black => value,
                    Color::White => -value,
                }
            })
            .sum();
        let clamped = total.clamp(i64::from(MIN_SCORE) + 1, i64::from(MAX_SCORE) - 1);
        i32::try_from(clamped).unwrap_or(0)
    }
}

pub fn is_decisive(score: i32) -> bool {
    score == MAX_SCORE || score == MIN_SCORE
}

fn piece_value(piece: Piece, pos: Position) -> i32 {
    match piece.rank {
        Rank::King => KING_VALUE,
        Rank::Man if pos.row as i8 + piece.color.forward() == piece.color.crowning_row() as i8 => {
            ADVANCED_MAN_VALUE
        }
        Rank::Man => MAN_VALUE,
    }
}

fn read_u32_le(data: &[u8], offset: usize) -> Result<u32, String> {
    if offset + 4 > data.len() {
        return Err("unexpected EOF while reading u32".to_string());
    }
    let mut bytes = [0u8; 4];
    bytes.copy_from_slice(&data[offset..offset + 4]);
    Ok(u32::from_le_bytes(bytes))
}
