//! Validation of claimed state transitions.
//!
//! A claimed move is accepted only if it is structurally identical to the
//! transcript [`create_move`] produces for the same board, turn and deltas.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::board::Board;
use crate::error::{IllegalCode, IllegalMove};
use crate::rules::create_move;
use crate::transcript::{MOVE_LEN, Operation, SetOperation, Transcript};
use crate::types::{BLACK_INDEX, Color, Position, Rank};

static OPENING_TRANSCRIPT: Lazy<Transcript> = Lazy::new(|| {
    Transcript::from_operations(vec![
        Operation::AdvanceTurn {
            turn_index: BLACK_INDEX,
        },
        Operation::Set(SetOperation::Board(Board::new())),
    ])
});

/// What the transport hands over for every submitted move.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateTransition {
    /// `None` before the match has been bootstrapped.
    #[serde(default)]
    pub state_before_move: Option<Board>,
    #[serde(default)]
    pub turn_index_before_move: usize,
    #[serde(rename = "move")]
    pub transcript: Transcript,
}

/// The only transcript accepted from an empty state: black to move on the
/// opening board.
pub fn initial_transcript() -> Transcript {
    OPENING_TRANSCRIPT.clone()
}

/// Accepts `transition` or explains why not. Never panics.
pub fn is_move_ok(transition: &StateTransition) -> Result<(), IllegalMove> {
    check_transition(transition).map_err(|code| {
        debug!(
            %code,
            turn_index = transition.turn_index_before_move,
            entries = transition.transcript.len(),
            "rejected move"
        );
        IllegalMove::from(code)
    })
}

fn check_transition(transition: &StateTransition) -> Result<(), IllegalCode> {
    let Some(board) = &transition.state_before_move else {
        return if transition.transcript == *OPENING_TRANSCRIPT {
            Ok(())
        } else {
            Err(IllegalCode::IllegalMove)
        };
    };

    let turn_index = transition.turn_index_before_move;
    if Color::from_turn_index(turn_index).is_none() {
        return Err(IllegalCode::IllegalSetTurn);
    }

    let claimed = &transition.transcript;
    if claimed.len() != MOVE_LEN {
        return Err(IllegalCode::IllegalMove);
    }
    let (Some(from), Some(to)) = (claimed.from_delta(), claimed.to_delta()) else {
        return Err(IllegalCode::IllegalMove);
    };

    let expected = create_move(board, from, to, turn_index)?;
    compare_transcripts(claimed, &expected)
}

/// Maps the first differing entry to the most specific code.
fn compare_transcripts(claimed: &Transcript, expected: &Transcript) -> Result<(), IllegalCode> {
    let mismatch = claimed
        .operations()
        .iter()
        .zip(expected.operations())
        .find(|(claimed_op, expected_op)| claimed_op != expected_op);

    let Some((claimed_op, expected_op)) = mismatch else {
        return Ok(());
    };

    let code = match (claimed_op, expected_op) {
        (Operation::EndMatch { .. }, Operation::EndMatch { .. }) => {
            IllegalCode::IllegalEndMatchScore
        }
        (_, Operation::AdvanceTurn { .. } | Operation::EndMatch { .. }) => {
            IllegalCode::IllegalSetTurn
        }
        (
            Operation::Set(SetOperation::Board(claimed_board)),
            Operation::Set(SetOperation::Board(expected_board)),
        ) => board_mismatch(claimed_board, expected_board),
        _ => IllegalCode::IllegalMove,
    };
    Err(code)
}

fn board_mismatch(claimed: &Board, expected: &Board) -> IllegalCode {
    let first_difference = (0..8u8)
        .flat_map(|row| (0..8u8).map(move |col| Position::new(row, col)))
        .find(|&pos| claimed.get(pos) != expected.get(pos));

    let Some(pos) = first_difference else {
        return IllegalCode::IllegalMove;
    };

    match (claimed.piece_at(pos), expected.piece_at(pos)) {
        (Some(got), Some(want)) if got.color != want.color => IllegalCode::IllegalColorChanged,
        (Some(got), Some(want)) => match (got.rank, want.rank) {
            (Rank::King, Rank::Man) => IllegalCode::IllegalCrowned,
            (Rank::Man, Rank::King) => IllegalCode::IllegalUncrowned,
            _ => IllegalCode::IllegalMove,
        },
        _ => IllegalCode::IllegalMove,
    }
}
