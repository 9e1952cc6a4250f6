pub mod computer;
pub mod eval;
pub mod search;
