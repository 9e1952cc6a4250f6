use tracing::{debug, warn};

use crate::board::Board;
use crate::error::{IllegalCode, MatchError};
use crate::rules::{continuation_moves, create_move, legal_moves};
use crate::transcript::Transcript;
use crate::types::{BLACK_INDEX, MatchState, MoveCandidate, Position};
use crate::validate::{StateTransition, initial_transcript, is_move_ok};

/// Picks a move for the side to move. `None` when it cannot.
///
/// `chain_piece` is set when the side is in the middle of a capture chain and
/// must keep jumping with that piece.
pub trait MoveSelector: Send + Sync {
    fn select_move(
        &self,
        board: &Board,
        turn_index: usize,
        chain_piece: Option<Position>,
    ) -> Option<Transcript>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct FirstLegalMoveSelector;

impl MoveSelector for FirstLegalMoveSelector {
    fn select_move(
        &self,
        board: &Board,
        turn_index: usize,
        chain_piece: Option<Position>,
    ) -> Option<Transcript> {
        let candidates = match chain_piece {
            Some(piece) => continuation_moves(board, piece, turn_index),
            None => legal_moves(board, turn_index),
        };
        let candidate = candidates.into_iter().next()?;
        create_move(board, candidate.from, candidate.to, turn_index).ok()
    }
}

/// Caller-owned match state. Every move, human or computer, is committed only
/// after [`is_move_ok`] accepts it.
pub struct Match {
    board: Option<Board>,
    turn_index: usize,
    end_match_scores: Option<[u8; 2]>,
    last_move: Option<Transcript>,
    /// Piece that has to continue the current capture chain.
    chain_piece: Option<Position>,
    selector: Box<dyn MoveSelector>,
}

impl Match {
    pub fn new(selector: Box<dyn MoveSelector>) -> Self {
        Self {
            board: None,
            turn_index: BLACK_INDEX,
            end_match_scores: None,
            last_move: None,
            chain_piece: None,
            selector,
        }
    }

    pub fn new_with_default_selector() -> Self {
        Self::new(Box::new(FirstLegalMoveSelector))
    }

    /// Commits the opening transcript.
    pub fn start(&mut self) -> Result<(), MatchError> {
        if self.board.is_some() {
            return Err(MatchError::AlreadyStarted);
        }
        self.submit(initial_transcript())
    }

    pub fn board(&self) -> Option<&Board> {
        self.board.as_ref()
    }

    pub fn turn_index(&self) -> usize {
        self.turn_index
    }

    pub fn is_match_over(&self) -> bool {
        self.end_match_scores.is_some()
    }

    pub fn last_move(&self) -> Option<&Transcript> {
        self.last_move.as_ref()
    }

    pub fn chain_piece(&self) -> Option<Position> {
        self.chain_piece
    }

    /// Validates `transcript` against the current state and commits it. Mid
    /// chain, only a capture by the chaining piece is accepted.
    pub fn submit(&mut self, transcript: Transcript) -> Result<(), MatchError> {
        if self.is_match_over() {
            return Err(MatchError::MatchOver);
        }
        if let Some(piece) = self.chain_piece
            && transcript.from_delta() != Some(piece)
        {
            debug!(?piece, from = ?transcript.from_delta(), "move breaks the capture chain");
            return Err(IllegalCode::IllegalJumpMove.into());
        }

        let transition = StateTransition {
            state_before_move: self.board,
            turn_index_before_move: self.turn_index,
            transcript,
        };
        is_move_ok(&transition)?;
        self.commit(transition.transcript);
        Ok(())
    }

    /// Plays `from -> to` for the side to move.
    pub fn play(&mut self, from: Position, to: Position) -> Result<(), MatchError> {
        let board = self.current_board()?;
        let transcript = create_move(&board, from, to, self.turn_index)?;
        self.submit(transcript)
    }

    /// Lets the selector move for the side to move.
    pub fn do_ai_move(&mut self) -> Result<Transcript, MatchError> {
        let board = self.current_board()?;
        if self.legal_moves().is_empty() {
            return Err(MatchError::NoLegalMoves);
        }

        let Some(transcript) = self
            .selector
            .select_move(&board, self.turn_index, self.chain_piece)
        else {
            warn!(turn_index = self.turn_index, "selector produced no move");
            return Err(MatchError::SelectorFailed);
        };
        self.submit(transcript.clone())?;
        Ok(transcript)
    }

    pub fn legal_moves(&self) -> Vec<MoveCandidate> {
        match (&self.board, self.is_match_over(), self.chain_piece) {
            (Some(board), false, Some(piece)) => continuation_moves(board, piece, self.turn_index),
            (Some(board), false, None) => legal_moves(board, self.turn_index),
            _ => Vec::new(),
        }
    }

    pub fn to_match_state(&self) -> MatchState {
        let (black_count, white_count) = self.board.map(|board| board.count()).unwrap_or((0, 0));
        MatchState {
            board: self.board,
            turn_index: self.turn_index,
            black_count,
            white_count,
            is_match_over: self.is_match_over(),
            end_match_scores: self.end_match_scores,
            chain_piece: self.chain_piece,
        }
    }

    fn current_board(&self) -> Result<Board, MatchError> {
        if self.is_match_over() {
            return Err(MatchError::MatchOver);
        }
        self.board.ok_or(MatchError::NotStarted)
    }

    fn commit(&mut self, transcript: Transcript) {
        self.chain_piece = transcript.chain_piece(self.turn_index);
        if let Some(board) = transcript.board() {
            self.board = Some(*board);
        }
        if let Some(turn_index) = transcript.next_turn() {
            self.turn_index = turn_index;
        }
        self.end_match_scores = transcript.end_match_scores();
        debug!(
            turn_index = self.turn_index,
            is_match_over = self.is_match_over(),
            "committed move"
        );
        self.last_move = Some(transcript);
    }

    #[cfg(test)]
    fn set_board_for_test(&mut self, board: Board, turn_index: usize) {
        self.board = Some(board);
        self.turn_index = turn_index;
        self.end_match_scores = None;
        self.last_move = None;
        self.chain_piece = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::computer::AlphaBetaSelector;
    use crate::ai::eval::Evaluator;
    use crate::ai::search::SearchLimits;
    use crate::transcript::{Operation, SetOperation};
    use crate::types::WHITE_INDEX;

    struct FixedMoveSelector {
        transcript: Transcript,
    }

    impl MoveSelector for FixedMoveSelector {
        fn select_move(
            &self,
            _board: &Board,
            _turn_index: usize,
            _chain_piece: Option<Position>,
        ) -> Option<Transcript> {
            Some(self.transcript.clone())
        }
    }

    fn pos(row: u8, col: u8) -> Position {
        Position::new(row, col)
    }

    #[test]
    fn initial_state_is_correct() {
        let mut game = Match::new_with_default_selector();
        assert_eq!(game.play(pos(2, 1), pos(3, 0)), Err(MatchError::NotStarted));

        game.start().unwrap();
        let state = game.to_match_state();

        assert_eq!(state.turn_index, BLACK_INDEX);
        assert_eq!(state.black_count, 12);
        assert_eq!(state.white_count, 12);
        assert!(!state.is_match_over);
        assert_eq!(game.legal_moves().len(), 7);
        assert_eq!(game.start(), Err(MatchError::AlreadyStarted));
    }

    #[test]
    fn illegal_player_move_returns_error() {
        let mut game = Match::new_with_default_selector();
        game.start().unwrap();

        let err = game.play(pos(2, 1), pos(4, 3)).unwrap_err();

        assert_eq!(err, MatchError::from(IllegalCode::IllegalJumpMove));
        assert_eq!(game.to_match_state().board, Some(Board::new()));
    }

    #[test]
    fn moves_alternate_turns() {
        let mut game = Match::new_with_default_selector();
        game.start().unwrap();

        game.play(pos(2, 1), pos(3, 2)).unwrap();
        assert_eq!(game.turn_index(), WHITE_INDEX);

        let ai = game.do_ai_move().unwrap();
        assert_eq!(ai.next_turn(), Some(BLACK_INDEX));
        assert_eq!(game.turn_index(), BLACK_INDEX);
        assert_eq!(game.last_move(), Some(&ai));
    }

    #[test]
    fn selector_output_is_validated() {
        let bogus = Transcript::new(
            Operation::AdvanceTurn {
                turn_index: WHITE_INDEX,
            },
            Board::empty(),
            pos(2, 1),
            pos(3, 2),
        );
        let mut game = Match::new(Box::new(FixedMoveSelector { transcript: bogus }));
        game.start().unwrap();

        let err = game.do_ai_move().unwrap_err();

        assert!(matches!(err, MatchError::Illegal(_)));
        assert_eq!(game.turn_index(), BLACK_INDEX);
    }

    #[test]
    fn capturing_everything_ends_the_match() {
        let selector =
            AlphaBetaSelector::new(SearchLimits::MaxDepth(2), Evaluator::default()).unwrap();
        let mut game = Match::new(Box::new(selector));
        game.start().unwrap();
        game.set_board_for_test(
            Board::from_rows([
                "-- DS -- DS -- DS -- DS",
                "DS -- DS -- DS -- DS --",
                "-- DS -- DS -- DS -- DS",
                "DS -- DS -- BM -- DS --",
                "-- DS -- WM -- DS -- DS",
                "DS -- DS -- DS -- DS --",
                "-- DS -- DS -- DS -- DS",
                "DS -- DS -- DS -- DS --",
            ])
            .unwrap(),
            WHITE_INDEX,
        );

        let transcript = game.do_ai_move().unwrap();
        let state = game.to_match_state();

        assert_eq!(transcript.end_match_scores(), Some([0, 1]));
        assert!(state.is_match_over);
        assert_eq!(state.end_match_scores, Some([0, 1]));
        assert_eq!(state.black_count, 0);
        assert!(game.legal_moves().is_empty());
        assert_eq!(game.do_ai_move(), Err(MatchError::MatchOver));
        assert_eq!(
            game.submit(Transcript::from_operations(vec![Operation::Set(
                SetOperation::FromDelta(pos(0, 1))
            )])),
            Err(MatchError::MatchOver)
        );
    }

    // Black (2,1) can chain (2,1) -> (4,3) -> (6,5); black (2,5) can jump to (4,7).
    fn chain_board() -> Board {
        Board::from_rows([
            "-- DS -- DS -- DS -- DS",
            "DS -- DS -- DS -- DS --",
            "-- BM -- DS -- BM -- DS",
            "DS -- WM -- DS -- WM --",
            "-- DS -- DS -- DS -- DS",
            "DS -- DS -- WM -- DS --",
            "-- DS -- DS -- DS -- DS",
            "DS -- DS -- DS -- DS --",
        ])
        .unwrap()
    }

    #[test]
    fn capture_chain_must_continue_with_the_same_piece() {
        let mut game = Match::new_with_default_selector();
        game.start().unwrap();
        game.set_board_for_test(chain_board(), BLACK_INDEX);

        game.play(pos(2, 1), pos(4, 3)).unwrap();
        let mid = *game.board().unwrap();
        assert_eq!(game.turn_index(), BLACK_INDEX);
        assert_eq!(game.chain_piece(), Some(pos(4, 3)));
        assert_eq!(game.to_match_state().chain_piece, Some(pos(4, 3)));
        assert_eq!(
            game.legal_moves(),
            vec![MoveCandidate {
                from: pos(4, 3),
                to: pos(6, 5),
            }]
        );

        assert_eq!(
            game.play(pos(2, 5), pos(4, 7)),
            Err(MatchError::from(IllegalCode::IllegalJumpMove))
        );
        assert_eq!(game.board(), Some(&mid));

        game.play(pos(4, 3), pos(6, 5)).unwrap();
        assert_eq!(game.turn_index(), WHITE_INDEX);
        assert_eq!(game.chain_piece(), None);
    }

    #[test]
    fn selectors_continue_the_chain_with_the_same_piece() {
        let alpha_beta =
            AlphaBetaSelector::new(SearchLimits::MaxDepth(2), Evaluator::default()).unwrap();
        let selectors: [Box<dyn MoveSelector>; 2] =
            [Box::new(FirstLegalMoveSelector), Box::new(alpha_beta)];

        for selector in selectors {
            let mut game = Match::new(selector);
            game.start().unwrap();
            game.set_board_for_test(chain_board(), BLACK_INDEX);
            game.play(pos(2, 1), pos(4, 3)).unwrap();

            let transcript = game.do_ai_move().unwrap();

            assert_eq!(transcript.from_delta(), Some(pos(4, 3)));
            assert_eq!(transcript.to_delta(), Some(pos(6, 5)));
            assert_eq!(game.turn_index(), WHITE_INDEX);
        }
    }

    #[test]
    fn stuck_side_reports_no_legal_moves() {
        let mut game = Match::new_with_default_selector();
        game.start().unwrap();
        game.set_board_for_test(
            Board::from_rows([
                "-- BM -- DS -- DS -- DS",
                "WM -- DS -- DS -- DS --",
                "-- DS -- DS -- BM -- DS",
                "DS -- DS -- DS -- DS --",
                "-- DS -- DS -- DS -- DS",
                "DS -- DS -- DS -- DS --",
                "-- DS -- DS -- DS -- DS",
                "DS -- DS -- DS -- DS --",
            ])
            .unwrap(),
            WHITE_INDEX,
        );

        assert_eq!(game.do_ai_move(), Err(MatchError::NoLegalMoves));
    }
}
