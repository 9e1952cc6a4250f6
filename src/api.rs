//! JavaScript bindings. Values cross the boundary through `serde-wasm-bindgen`
//! using the wire shapes of [`crate::transcript`] and [`crate::validate`].
//! Absent values (`None`) reach JavaScript as `null`.

use serde::Serialize;
use tracing::debug;
use wasm_bindgen::prelude::*;

use crate::ai::computer::{AlphaBetaSelector, create_computer_move_with};
use crate::ai::eval::{Evaluator, PositionalWeights};
use crate::ai::search::{SearchLimits, SearchLimitsConfig};
use crate::board::Board;
use crate::error::{IllegalCode, IllegalMove, SearchConfigError};
use crate::game::Match;
use crate::rules::{create_move, legal_moves};
use crate::types::Position;
use crate::validate::{StateTransition, initial_transcript, is_move_ok};

#[wasm_bindgen(js_name = initialTranscript)]
pub fn initial_transcript_js() -> Result<JsValue, JsError> {
    Ok(to_js(&initial_transcript())?)
}

/// Returns `true`, or `{ code, contact }` describing the rejection. Never throws.
#[wasm_bindgen(js_name = isMoveOk)]
pub fn is_move_ok_js(transition: JsValue) -> JsValue {
    let verdict = match serde_wasm_bindgen::from_value::<StateTransition>(transition) {
        Ok(transition) => is_move_ok(&transition),
        Err(err) => {
            debug!(%err, "unparseable transition");
            Err(IllegalMove::from(IllegalCode::IllegalMove))
        }
    };

    match verdict {
        Ok(()) => JsValue::from_bool(true),
        Err(illegal) => to_js(&illegal).unwrap_or(JsValue::FALSE),
    }
}

/// Builds the transcript of `from -> to`; throws the illegal code on failure.
#[wasm_bindgen(js_name = createMove)]
pub fn create_move_js(
    board: JsValue,
    from_row: u8,
    from_col: u8,
    to_row: u8,
    to_col: u8,
    turn_index: usize,
) -> Result<JsValue, JsError> {
    let board: Board = serde_wasm_bindgen::from_value(board)?;
    let transcript = create_move(
        &board,
        Position::new(from_row, from_col),
        Position::new(to_row, to_col),
        turn_index,
    )?;
    Ok(to_js(&transcript)?)
}

#[wasm_bindgen(js_name = legalMoves)]
pub fn legal_moves_js(board: JsValue, turn_index: usize) -> Result<JsValue, JsError> {
    let board: Board = serde_wasm_bindgen::from_value(board)?;
    Ok(to_js(&legal_moves(&board, turn_index))?)
}

/// `limits` is `{ millisecondsLimit }` or `{ maxDepth }`. `weights` optionally
/// replaces the positional table with a `CKPW` blob. Returns the transcript, or
/// `null` when the side has no move.
#[wasm_bindgen(js_name = createComputerMove)]
pub fn create_computer_move_js(
    board: JsValue,
    player_index: usize,
    limits: JsValue,
    weights: Option<Vec<u8>>,
) -> Result<JsValue, JsError> {
    let board: Board = serde_wasm_bindgen::from_value(board)?;
    let limits = parse_limits(limits)?;
    let evaluator = match weights {
        Some(bytes) => Evaluator::new(
            PositionalWeights::from_bytes(&bytes).map_err(SearchConfigError::InvalidWeights)?,
        ),
        None => Evaluator::default(),
    };

    let transcript = create_computer_move_with(&board, player_index, limits, &evaluator)?;
    Ok(to_js(&transcript)?)
}

/// A match driven from JavaScript, with the computer moving through alpha-beta.
#[wasm_bindgen]
pub struct CheckersMatch {
    inner: Match,
}

#[wasm_bindgen]
impl CheckersMatch {
    #[wasm_bindgen(constructor)]
    pub fn new(limits: JsValue) -> Result<CheckersMatch, JsError> {
        let selector = AlphaBetaSelector::new(parse_limits(limits)?, Evaluator::default())?;
        Ok(Self {
            inner: Match::new(Box::new(selector)),
        })
    }

    pub fn start(&mut self) -> Result<(), JsError> {
        Ok(self.inner.start()?)
    }

    pub fn play(&mut self, from_row: u8, from_col: u8, to_row: u8, to_col: u8) -> Result<(), JsError> {
        self.inner.play(
            Position::new(from_row, from_col),
            Position::new(to_row, to_col),
        )?;
        Ok(())
    }

    #[wasm_bindgen(js_name = doAiMove)]
    pub fn do_ai_move(&mut self) -> Result<JsValue, JsError> {
        let transcript = self.inner.do_ai_move()?;
        Ok(to_js(&transcript)?)
    }

    #[wasm_bindgen(js_name = legalMoves)]
    pub fn legal_moves(&self) -> Result<JsValue, JsError> {
        Ok(to_js(&self.inner.legal_moves())?)
    }

    pub fn state(&self) -> Result<JsValue, JsError> {
        Ok(to_js(&self.inner.to_match_state())?)
    }
}

fn to_js<T: Serialize + ?Sized>(value: &T) -> Result<JsValue, serde_wasm_bindgen::Error> {
    value.serialize(&serde_wasm_bindgen::Serializer::new().serialize_missing_as_null(true))
}

fn parse_limits(limits: JsValue) -> Result<SearchLimits, JsError> {
    let config: SearchLimitsConfig = serde_wasm_bindgen::from_value(limits)?;
    Ok(SearchLimits::try_from(config)?)
}
