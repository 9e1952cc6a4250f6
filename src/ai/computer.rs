//! Move selection for the computer player on top of the generic search.

use tracing::trace;

use crate::ai::eval::{Evaluator, MAX_SCORE, MIN_SCORE};
use crate::ai::search::{GameTree, SearchLimits, SearchOutcome, alpha_beta_decision};
use crate::board::Board;
use crate::error::SearchConfigError;
use crate::game::MoveSelector;
use crate::rules::{continuation_moves, create_move, legal_moves};
use crate::transcript::Transcript;
use crate::types::Position;

/// A node of the checkers search tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ply {
    pub board: Board,
    /// The move that produced this position; `None` at the root.
    pub transcript: Option<Transcript>,
    /// Piece that must continue a capture chain from this position.
    pub chain_piece: Option<Position>,
}

impl Ply {
    pub fn root(board: Board) -> Self {
        Self {
            board,
            transcript: None,
            chain_piece: None,
        }
    }

    /// Root position in the middle of a capture chain by `piece`.
    pub fn continuing(board: Board, piece: Position) -> Self {
        Self {
            board,
            transcript: None,
            chain_piece: Some(piece),
        }
    }

    fn end_match_scores(&self) -> Option<[u8; 2]> {
        self.transcript.as_ref()?.end_match_scores()
    }
}

/// Checkers as a [`GameTree`]. Chained jumps are separate plies that keep the
/// same side to move.
#[derive(Debug, Clone, Copy, Default)]
pub struct CheckersTree {
    evaluator: Evaluator,
}

impl CheckersTree {
    pub fn new(evaluator: Evaluator) -> Self {
        Self { evaluator }
    }
}

impl GameTree for CheckersTree {
    type State = Ply;

    fn successors(&self, state: &Ply, turn_index: usize) -> Vec<Ply> {
        if state.end_match_scores().is_some() {
            return Vec::new();
        }

        let candidates = match state.chain_piece {
            Some(piece) => continuation_moves(&state.board, piece, turn_index),
            None => legal_moves(&state.board, turn_index),
        };
        let successors: Vec<Ply> = candidates
            .into_iter()
            .filter_map(|candidate| {
                let transcript =
                    create_move(&state.board, candidate.from, candidate.to, turn_index).ok()?;
                let board = *transcript.board()?;
                Some(Ply {
                    board,
                    chain_piece: transcript.chain_piece(turn_index),
                    transcript: Some(transcript),
                })
            })
            .collect();
        trace!(turn_index, successors = successors.len(), "generated plies");
        successors
    }

    fn evaluate(&self, state: &Ply, turn_index: usize) -> i32 {
        match state.end_match_scores() {
            Some([1, 0]) => MAX_SCORE,
            Some(_) => MIN_SCORE,
            None => self.evaluator.evaluate(&state.board, turn_index),
        }
    }

    fn next_turn(&self, child: &Ply, turn_index: usize) -> usize {
        child
            .transcript
            .as_ref()
            .and_then(Transcript::next_turn)
            .unwrap_or(1 - turn_index)
    }
}

/// Searches `board` for `player_index` and returns the full outcome.
pub fn search_move(
    board: &Board,
    player_index: usize,
    limits: SearchLimits,
    evaluator: &Evaluator,
) -> Result<Option<SearchOutcome<Ply>>, SearchConfigError> {
    search_from(&Ply::root(*board), player_index, limits, evaluator)
}

pub fn search_from(
    root: &Ply,
    player_index: usize,
    limits: SearchLimits,
    evaluator: &Evaluator,
) -> Result<Option<SearchOutcome<Ply>>, SearchConfigError> {
    let tree = CheckersTree::new(*evaluator);
    alpha_beta_decision(&tree, root, player_index, limits)
}

/// Chooses a move for `player_index` with the default evaluator. `Ok(None)`
/// means the side has no legal move.
pub fn create_computer_move(
    board: &Board,
    player_index: usize,
    limits: SearchLimits,
) -> Result<Option<Transcript>, SearchConfigError> {
    create_computer_move_with(board, player_index, limits, &Evaluator::default())
}

pub fn create_computer_move_with(
    board: &Board,
    player_index: usize,
    limits: SearchLimits,
    evaluator: &Evaluator,
) -> Result<Option<Transcript>, SearchConfigError> {
    let outcome = search_move(board, player_index, limits, evaluator)?;
    Ok(outcome.and_then(|outcome| outcome.best.transcript))
}

/// [`MoveSelector`] backed by alpha-beta search.
#[derive(Debug, Clone, Copy)]
pub struct AlphaBetaSelector {
    evaluator: Evaluator,
    limits: SearchLimits,
}

impl AlphaBetaSelector {
    /// Fails when `limits` is not usable.
    pub fn new(limits: SearchLimits, evaluator: Evaluator) -> Result<Self, SearchConfigError> {
        limits.validate()?;
        Ok(Self { evaluator, limits })
    }
}

impl MoveSelector for AlphaBetaSelector {
    fn select_move(
        &self,
        board: &Board,
        turn_index: usize,
        chain_piece: Option<Position>,
    ) -> Option<Transcript> {
        let root = match chain_piece {
            Some(piece) => Ply::continuing(*board, piece),
            None => Ply::root(*board),
        };
        let outcome = search_from(&root, turn_index, self.limits, &self.evaluator).ok()??;
        outcome.best.transcript
    }
}
