//! Checkers rules: move classification, enumeration, mandatory capture,
//! promotion, chained jumps and end-of-match detection.
//!
//! Every function is pure over an explicit board and turn index.

use crate::board::{Board, Square};
pub use crate::board::is_dark_square;
use crate::error::IllegalCode;
use crate::transcript::{Operation, Transcript};
use crate::types::{Color, MoveCandidate, Piece, Position, Rank};

const SIDE_STEPS: [i8; 2] = [-1, 1];

/// Colour of the piece on `square`, `None` when there is no piece.
pub fn square_color(square: Square) -> Option<Color> {
    square.color()
}

pub fn square_rank(square: Square) -> Option<Rank> {
    square.rank()
}

/// One diagonal step in a direction the piece at `from` may move.
/// Occupancy of `to` is not checked here.
pub fn is_simple_move(board: &Board, from: Position, to: Position) -> bool {
    let Some(piece) = board.piece_at(from) else {
        return false;
    };
    let (dr, dc) = from.delta_to(to);
    dc.abs() == 1 && allows_row_step(piece, dr)
}

/// Two diagonal steps in a direction the piece at `from` may move. Whether the
/// capture itself is valid is decided by [`is_valid_jump`].
pub fn is_jump_move(board: &Board, from: Position, to: Position) -> bool {
    let Some(piece) = board.piece_at(from) else {
        return false;
    };
    let (dr, dc) = from.delta_to(to);
    dc.abs() == 2 && dr.abs() == 2 && allows_row_step(piece, dr / 2)
}

fn allows_row_step(piece: Piece, dr: i16) -> bool {
    piece.row_steps().iter().any(|&step| i16::from(step) == dr)
}

/// A jump needs an opposing piece in the middle and an empty landing square.
pub fn is_valid_jump(from: Square, jumped: Square, to: Square) -> bool {
    match (from.color(), jumped.color()) {
        (Some(mover), Some(victim)) => mover != victim && to.is_empty(),
        _ => false,
    }
}

/// Destinations of simple moves for the piece at `pos`, if it belongs to the
/// side `turn_index`.
pub fn get_simple_moves(board: &Board, pos: Position, turn_index: usize) -> Vec<Position> {
    let Some(piece) = owned_piece(board, pos, turn_index) else {
        return Vec::new();
    };

    let mut moves = Vec::new();
    for &dr in piece.row_steps() {
        for dc in SIDE_STEPS {
            if let Some(to) = pos.offset(dr, dc)
                && board.get(to).is_empty()
            {
                moves.push(to);
            }
        }
    }
    moves
}

/// Landing squares of captures for the piece at `pos`, if it belongs to the
/// side `turn_index`.
pub fn get_jump_moves(board: &Board, pos: Position, turn_index: usize) -> Vec<Position> {
    let Some(piece) = owned_piece(board, pos, turn_index) else {
        return Vec::new();
    };

    let mut moves = Vec::new();
    for &dr in piece.row_steps() {
        for dc in SIDE_STEPS {
            let (Some(jumped), Some(to)) = (pos.offset(dr, dc), pos.offset(2 * dr, 2 * dc)) else {
                continue;
            };
            if is_valid_jump(board.get(pos), board.get(jumped), board.get(to)) {
                moves.push(to);
            }
        }
    }
    moves
}

/// True iff any piece of `turn_index` can capture. Captures are mandatory.
pub fn has_mandatory_jumps(board: &Board, turn_index: usize) -> bool {
    let Some(color) = Color::from_turn_index(turn_index) else {
        return false;
    };
    board
        .pieces_of(color)
        .any(|(pos, _)| !get_jump_moves(board, pos, turn_index).is_empty())
}

/// All legal `(from, to)` pairs for `turn_index`: every capture when one
/// exists, otherwise every simple move. Row-major by origin.
pub fn legal_moves(board: &Board, turn_index: usize) -> Vec<MoveCandidate> {
    let Some(color) = Color::from_turn_index(turn_index) else {
        return Vec::new();
    };
    let generate = if has_mandatory_jumps(board, turn_index) {
        get_jump_moves
    } else {
        get_simple_moves
    };

    board
        .pieces_of(color)
        .flat_map(|(from, _)| {
            generate(board, from, turn_index)
                .into_iter()
                .map(move |to| MoveCandidate { from, to })
        })
        .collect()
}

/// Moves allowed while the piece on `piece` is in the middle of a chain: only
/// its own further captures.
pub fn continuation_moves(board: &Board, piece: Position, turn_index: usize) -> Vec<MoveCandidate> {
    get_jump_moves(board, piece, turn_index)
        .into_iter()
        .map(|to| MoveCandidate { from: piece, to })
        .collect()
}

pub fn has_any_move(board: &Board, color: Color) -> bool {
    let turn_index = color.turn_index();
    board.pieces_of(color).any(|(pos, _)| {
        !get_jump_moves(board, pos, turn_index).is_empty()
            || !get_simple_moves(board, pos, turn_index).is_empty()
    })
}

/// Winner of the position with `turn_index` to move, if the match is decided:
/// a side without pieces loses, and so does the side to move when it is stuck.
pub fn winner(board: &Board, turn_index: usize) -> Option<Color> {
    let to_move = Color::from_turn_index(turn_index)?;
    let other = to_move.opponent();

    if board.count_of(to_move) == 0 {
        Some(other)
    } else if board.count_of(other) == 0 {
        Some(to_move)
    } else if !has_any_move(board, to_move) {
        Some(other)
    } else {
        None
    }
}

/// Applies `from -> to` for `turn_index` and describes the result.
///
/// Checks fail fast in this order: turn index, square validity, move shape,
/// mandatory capture, then membership in the enumerated moves. After a jump the
/// same side keeps the turn when the landed piece can capture again, unless it
/// was just crowned.
pub fn create_move(
    board: &Board,
    from: Position,
    to: Position,
    turn_index: usize,
) -> Result<Transcript, IllegalCode> {
    let mover = Color::from_turn_index(turn_index).ok_or(IllegalCode::IllegalSetTurn)?;

    if !is_dark_square(from) || !is_dark_square(to) {
        return Err(IllegalCode::IllegalDelta);
    }

    let is_jump = if is_simple_move(board, from, to) {
        false
    } else if is_jump_move(board, from, to) {
        true
    } else {
        return Err(IllegalCode::IllegalMove);
    };

    if is_jump {
        if !get_jump_moves(board, from, turn_index).contains(&to) {
            return Err(IllegalCode::IllegalJumpMove);
        }
    } else {
        if has_mandatory_jumps(board, turn_index) {
            return Err(IllegalCode::IllegalIgnoreMandatoryJump);
        }
        if !get_simple_moves(board, from, turn_index).contains(&to) {
            return Err(IllegalCode::IllegalSimpleMove);
        }
    }

    let piece = board.piece_at(from).ok_or(IllegalCode::IllegalMove)?;
    let crowned = piece.rank == Rank::Man && to.row == mover.crowning_row();
    let landed = if crowned {
        Piece::new(piece.color, Rank::King)
    } else {
        piece
    };

    let mut next = *board;
    next.set(from, Square::Empty);
    if is_jump {
        next.set(from.midpoint(to), Square::Empty);
    }
    next.set(to, Square::Occupied(landed));

    let continues = is_jump && !crowned && !get_jump_moves(&next, to, turn_index).is_empty();
    let turn = match winner_after_move(&next, mover, continues) {
        Some(winner) => Operation::EndMatch {
            end_match_scores: winner.winning_scores(),
        },
        None if continues => Operation::AdvanceTurn { turn_index },
        None => Operation::AdvanceTurn {
            turn_index: mover.opponent().turn_index(),
        },
    };

    Ok(Transcript::new(turn, next, from, to))
}

fn winner_after_move(board: &Board, mover: Color, continues: bool) -> Option<Color> {
    let opponent = mover.opponent();
    if board.count_of(opponent) == 0 || (!continues && !has_any_move(board, opponent)) {
        Some(mover)
    } else {
        None
    }
}

fn owned_piece(board: &Board, pos: Position, turn_index: usize) -> Option<Piece> {
    let color = Color::from_turn_index(turn_index)?;
    board.piece_at(pos).filter(|piece| piece.color == color)
}
