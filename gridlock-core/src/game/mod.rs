//! Game rules: the board and the automated opponent

pub mod board;
pub mod bot;

pub use board::{Board, BoardSnapshot, COLS, ROWS, Symbol};
pub use bot::{HeuristicBot, MoveStrategy};
