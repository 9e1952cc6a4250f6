//! Error types for the rules engine, the search and the match driver.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Annotation attached to every rejected move, kept for transport compatibility.
pub const DEVELOPER_CONTACT: &str = "checkers-engine maintainers";

/// Why a move was rejected. Displays and serializes as the wire code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IllegalCode {
    /// Neither a simple move nor a jump, or a malformed transcript.
    #[error("ILLEGAL_MOVE")]
    IllegalMove,
    #[error("ILLEGAL_SIMPLE_MOVE")]
    IllegalSimpleMove,
    #[error("ILLEGAL_JUMP_MOVE")]
    IllegalJumpMove,
    /// `from` or `to` is not a playable dark square.
    #[error("ILLEGAL_DELTA")]
    IllegalDelta,
    #[error("ILLEGAL_COLOR_CHANGED")]
    IllegalColorChanged,
    #[error("ILLEGAL_CROWNED")]
    IllegalCrowned,
    #[error("ILLEGAL_UNCROWNED")]
    IllegalUncrowned,
    /// A simple move was chosen while a capture was available.
    #[error("ILLEGAL_IGNORE_MANDATORY_JUMP")]
    IllegalIgnoreMandatoryJump,
    #[error("ILLEGAL_SET_TURN")]
    IllegalSetTurn,
    #[error("ILLEGAL_END_MATCH_SCORE")]
    IllegalEndMatchScore,
}

/// Rejection returned by [`crate::validate::is_move_ok`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize)]
#[error("{code} (contact: {contact})")]
pub struct IllegalMove {
    pub code: IllegalCode,
    pub contact: &'static str,
}

impl From<IllegalCode> for IllegalMove {
    fn from(code: IllegalCode) -> Self {
        Self {
            code,
            contact: DEVELOPER_CONTACT,
        }
    }
}

/// Errors raised while building a [`crate::board::Board`] from external data.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BoardError {
    #[error("unknown square code {code:?}")]
    UnknownSquare { code: String },

    #[error("row {row} has {len} squares, expected 8")]
    RowLength { row: usize, len: usize },

    #[error("square ({row}, {col}) is light and must be \"--\"")]
    PieceOnLightSquare { row: usize, col: usize },

    #[error("square ({row}, {col}) is dark and cannot be \"--\"")]
    LightMarkerOnDarkSquare { row: usize, col: usize },
}

/// Programmer errors in a search request. These fail at call time.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SearchConfigError {
    #[error("exactly one of millisecondsLimit and maxDepth must be given")]
    AmbiguousLimits,

    #[error("search limit must be positive")]
    ZeroLimit,

    #[error("player index {0} is out of range (expected 0 or 1)")]
    InvalidPlayerIndex(usize),

    #[error("invalid positional weights: {0}")]
    InvalidWeights(String),
}

/// Errors surfaced by [`crate::game::Match`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MatchError {
    #[error("match has not been started")]
    NotStarted,

    #[error("match is already started")]
    AlreadyStarted,

    #[error("match is already over")]
    MatchOver,

    #[error("side to move has no legal moves")]
    NoLegalMoves,

    #[error("move selector could not choose a move")]
    SelectorFailed,

    #[error("illegal move: {0}")]
    Illegal(#[from] IllegalMove),
}

impl From<IllegalCode> for MatchError {
    fn from(code: IllegalCode) -> Self {
        Self::Illegal(code.into())
    }
}
