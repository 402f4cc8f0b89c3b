//! Automated opponent
//!
//! The heuristic plays an immediate win if one exists, blocks the
//! opponent's immediate win otherwise, and falls back to a center-first
//! column preference with some randomness so games do not repeat.

use rand::Rng;
use rand::seq::SliceRandom;

use super::board::{Board, COLS, Symbol};

/// Columns ordered from the center outward
const COLUMN_PRIORITY: [usize; COLS] = [3, 2, 4, 1, 5, 0, 6];

/// Default chance of passing over a preferred column
pub const DEFAULT_SKIP_PROBABILITY: f64 = 0.2;

/// Chooses a column for a bot-controlled slot
///
/// Returns `None` when no column is legal; callers treat that as "no move".
pub trait MoveStrategy: Send + Sync {
    fn choose_move(&self, board: &Board, symbol: Symbol) -> Option<usize>;
}

/// Win / block / center-preference / random heuristic
#[derive(Debug, Clone)]
pub struct HeuristicBot {
    skip_probability: f64,
}

impl HeuristicBot {
    /// Create a bot that skips each preferred column with the given probability
    pub fn new(skip_probability: f64) -> Self {
        Self {
            skip_probability: skip_probability.clamp(0.0, 1.0),
        }
    }

    /// Choose a column using the supplied random source
    pub fn choose_move_with<R: Rng + ?Sized>(
        &self,
        board: &Board,
        symbol: Symbol,
        rng: &mut R,
    ) -> Option<usize> {
        if let Some(column) = winning_column(board, symbol) {
            return Some(column);
        }

        if let Some(column) = winning_column(board, symbol.opponent()) {
            return Some(column);
        }

        for column in COLUMN_PRIORITY {
            if board.is_column_open(column) && !rng.gen_bool(self.skip_probability) {
                return Some(column);
            }
        }

        let legal: Vec<usize> = board.legal_columns().collect();
        legal.choose(rng).copied()
    }
}

impl Default for HeuristicBot {
    fn default() -> Self {
        Self::new(DEFAULT_SKIP_PROBABILITY)
    }
}

impl MoveStrategy for HeuristicBot {
    fn choose_move(&self, board: &Board, symbol: Symbol) -> Option<usize> {
        self.choose_move_with(board, symbol, &mut rand::thread_rng())
    }
}

/// First legal column where `symbol` would win immediately. Works on a copy.
fn winning_column(board: &Board, symbol: Symbol) -> Option<usize> {
    board.legal_columns().find(|&column| {
        let mut trial = *board;
        trial
            .drop_disc(column, symbol)
            .map(|row| trial.check_win(row, column, symbol))
            .unwrap_or(false)
    })
}
