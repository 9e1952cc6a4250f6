//! Move transcripts: the ordered operation list that describes a completed move.
//!
//! A regular move is exactly four entries:
//! `[turn entry, set board, set fromDelta, set toDelta]`, where the turn entry is
//! either [`Operation::AdvanceTurn`] or [`Operation::EndMatch`]. Validation
//! compares transcripts structurally, so the entry order is part of the contract.

use serde::{Deserialize, Serialize};

use crate::board::Board;
use crate::types::Position;

pub const MOVE_LEN: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Operation {
    /// The given side moves next.
    #[serde(rename = "setTurn")]
    AdvanceTurn { turn_index: usize },
    /// The match is over with `[black, white]` scores.
    EndMatch { end_match_scores: [u8; 2] },
    Set(SetOperation),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "key", content = "value", rename_all = "camelCase")]
pub enum SetOperation {
    Board(Board),
    FromDelta(Position),
    ToDelta(Position),
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Transcript {
    operations: Vec<Operation>,
}

impl Transcript {
    /// Builds a regular four-entry move transcript.
    pub fn new(turn: Operation, board: Board, from: Position, to: Position) -> Self {
        debug_assert!(matches!(
            turn,
            Operation::AdvanceTurn { .. } | Operation::EndMatch { .. }
        ));
        Self {
            operations: vec![
                turn,
                Operation::Set(SetOperation::Board(board)),
                Operation::Set(SetOperation::FromDelta(from)),
                Operation::Set(SetOperation::ToDelta(to)),
            ],
        }
    }

    pub fn from_operations(operations: Vec<Operation>) -> Self {
        Self { operations }
    }

    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Side to move after this transcript, if the match continues.
    pub fn next_turn(&self) -> Option<usize> {
        match self.operations.first() {
            Some(Operation::AdvanceTurn { turn_index }) => Some(*turn_index),
            _ => None,
        }
    }

    pub fn end_match_scores(&self) -> Option<[u8; 2]> {
        match self.operations.first() {
            Some(Operation::EndMatch { end_match_scores }) => Some(*end_match_scores),
            _ => None,
        }
    }

    pub fn is_match_over(&self) -> bool {
        self.end_match_scores().is_some()
    }

    /// The first board set by this transcript.
    pub fn board(&self) -> Option<&Board> {
        self.operations.iter().find_map(|op| match op {
            Operation::Set(SetOperation::Board(board)) => Some(board),
            _ => None,
        })
    }

    /// Origin square, read from the third entry.
    pub fn from_delta(&self) -> Option<Position> {
        match self.operations.get(2) {
            Some(Operation::Set(SetOperation::FromDelta(pos))) => Some(*pos),
            _ => None,
        }
    }

    /// Destination square, read from the fourth entry.
    pub fn to_delta(&self) -> Option<Position> {
        match self.operations.get(3) {
            Some(Operation::Set(SetOperation::ToDelta(pos))) => Some(*pos),
            _ => None,
        }
    }

    /// The piece that must keep jumping when this move, played by
    /// `turn_index`, left the turn with the same side.
    pub fn chain_piece(&self, turn_index: usize) -> Option<Position> {
        if self.next_turn() == Some(turn_index) {
            self.to_delta()
        } else {
            None
        }
    }
}
