use wasm_bindgen::prelude::*;

pub mod ai;
pub mod api;
pub mod board;
pub mod error;
pub mod game;
pub mod rules;
pub mod transcript;
pub mod types;
pub mod validate;

pub use ai::computer::create_computer_move;
pub use ai::search::{SearchLimits, SearchLimitsConfig};
pub use board::{Board, Square};
pub use error::{IllegalCode, IllegalMove};
pub use rules::create_move;
pub use transcript::{Operation, SetOperation, Transcript};
pub use types::{BLACK_INDEX, Position, WHITE_INDEX};
pub use validate::{StateTransition, initial_transcript, is_move_ok};

#[wasm_bindgen(js_name = wasmReady)]
pub fn wasm_ready() -> bool {
    true
}

/// Routes Rust panics to the browser console when the
/// `console_error_panic_hook` feature is enabled (default).
#[wasm_bindgen(js_name = initPanicHook)]
pub fn init_panic_hook() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}
