//! Fixed-size grid with gravity-drop placement
//!
//! Row 0 is the top of the board, row `ROWS - 1` the bottom. Discs fall to
//! the lowest empty cell of a column, so a column is full exactly when its
//! top cell is occupied.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::MoveError;

/// Number of rows on the board
pub const ROWS: usize = 6;
/// Number of columns on the board
pub const COLS: usize = 7;

/// Contiguous discs needed to win
const WIN_LENGTH: usize = 4;

/// Direction vectors scanned by win detection: horizontal, vertical and both diagonals
const DIRECTIONS: [(isize, isize); 4] = [(0, 1), (1, 0), (1, 1), (1, -1)];

/// Wire form of the board: `0` for empty, otherwise the symbol number
pub type BoardSnapshot = [[u8; COLS]; ROWS];

/// The two-valued marker owning cells and turns
///
/// `One` is always the first mover. On the wire a symbol is the number 1 or 2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Symbol {
    One,
    Two,
}

impl Symbol {
    /// The symbol of the other player
    pub fn opponent(self) -> Self {
        match self {
            Symbol::One => Symbol::Two,
            Symbol::Two => Symbol::One,
        }
    }

    /// Zero-based slot index for this symbol
    pub fn index(self) -> usize {
        match self {
            Symbol::One => 0,
            Symbol::Two => 1,
        }
    }

    pub fn as_u8(self) -> u8 {
        match self {
            Symbol::One => 1,
            Symbol::Two => 2,
        }
    }
}

impl From<Symbol> for u8 {
    fn from(symbol: Symbol) -> Self {
        symbol.as_u8()
    }
}

impl TryFrom<u8> for Symbol {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Symbol::One),
            2 => Ok(Symbol::Two),
            other => Err(format!("invalid symbol: {}", other)),
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_u8())
    }
}

/// A 6x7 grid. Cheap to copy, which the bot relies on for lookahead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Board {
    cells: [[Option<Symbol>; COLS]; ROWS],
}

impl Board {
    /// Create an empty board
    pub fn new() -> Self {
        Self {
            cells: [[None; COLS]; ROWS],
        }
    }

    /// Cell contents, `None` when empty or out of bounds
    pub fn cell(&self, row: usize, column: usize) -> Option<Symbol> {
        self.cells.get(row)?.get(column).copied().flatten()
    }

    /// Whether a disc can still be dropped into `column`
    pub fn is_column_open(&self, column: usize) -> bool {
        column < COLS && self.cells[0][column].is_none()
    }

    /// Columns that can still accept a disc, left to right
    pub fn legal_columns(&self) -> impl Iterator<Item = usize> + '_ {
        (0..COLS).filter(|&column| self.is_column_open(column))
    }

    /// Drop a disc into `column`, returning the row it landed on
    ///
    /// Mutates exactly one cell on success and nothing on error.
    pub fn drop_disc(&mut self, column: usize, symbol: Symbol) -> Result<usize, MoveError> {
        if column >= COLS {
            return Err(MoveError::ColumnOutOfRange(column as i64));
        }

        for row in (0..ROWS).rev() {
            if self.cells[row][column].is_none() {
                self.cells[row][column] = Some(symbol);
                return Ok(row);
            }
        }

        Err(MoveError::ColumnFull(column))
    }

    /// True when every column is full
    ///
    /// Gravity means only the top row needs checking.
    pub fn is_full(&self) -> bool {
        self.cells[0].iter().all(Option::is_some)
    }

    /// Whether the disc just placed at (`row`, `column`) completes a line
    ///
    /// Only scans the four lines through that cell, up to three steps each
    /// way, so it must be called right after the placing move.
    pub fn check_win(&self, row: usize, column: usize, symbol: Symbol) -> bool {
        DIRECTIONS.iter().any(|&(dr, dc)| {
            let forward = self.run_length(row, column, dr, dc, symbol);
            let backward = self.run_length(row, column, -dr, -dc, symbol);
            1 + forward + backward >= WIN_LENGTH
        })
    }

    /// Count contiguous `symbol` cells stepping away from (row, column), capped at three
    fn run_length(&self, row: usize, column: usize, dr: isize, dc: isize, symbol: Symbol) -> usize {
        let mut count = 0;
        for step in 1..WIN_LENGTH as isize {
            let r = row as isize + dr * step;
            let c = column as isize + dc * step;
            if r < 0 || c < 0 {
                break;
            }
            if self.cell(r as usize, c as usize) != Some(symbol) {
                break;
            }
            count += 1;
        }
        count
    }

    /// Number of occupied cells
    pub fn occupied(&self) -> usize {
        self.cells.iter().flatten().filter(|cell| cell.is_some()).count()
    }

    /// Numeric grid for clients
    pub fn snapshot(&self) -> BoardSnapshot {
        let mut grid = [[0u8; COLS]; ROWS];
        for (row, cells) in self.cells.iter().enumerate() {
            for (column, cell) in cells.iter().enumerate() {
                grid[row][column] = cell.map(Symbol::as_u8).unwrap_or(0);
            }
        }
        grid
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Column sequence that fills the board without either side ever
    /// completing a line. Columns alternate symbols bottom to top.
    pub(crate) const DRAW_SEQUENCE: [usize; ROWS * COLS] = [
        2, 0, 0, 0, 0, 0, 0, 1, 1, 1, 1, 1, 1, 4, 4, 4, 4, 4, 4, 5, 5, 5, 5, 5, 5, 2, 2, 2, 2,
        2, 3, 3, 3, 3, 3, 3, 6, 6, 6, 6, 6, 6,
    ];

    fn play(board: &mut Board, moves: &[(usize, Symbol)]) -> usize {
        let mut last = 0;
        for &(column, symbol) in moves {
            last = board.drop_disc(column, symbol).unwrap();
        }
        last
    }

    #[test]
    fn discs_fill_columns_bottom_up() {
        let mut board = Board::new();
        assert_eq!(board.drop_disc(3, Symbol::One), Ok(5));
        assert_eq!(board.drop_disc(3, Symbol::Two), Ok(4));
        assert_eq!(board.cell(5, 3), Some(Symbol::One));
        assert_eq!(board.cell(4, 3), Some(Symbol::Two));
        assert_eq!(board.cell(3, 3), None);
    }

    #[test]
    fn full_column_rejects_drop_without_mutation() {
        let mut board = Board::new();
        for i in 0..ROWS {
            let symbol = if i % 2 == 0 { Symbol::One } else { Symbol::Two };
            board.drop_disc(0, symbol).unwrap();
        }
        let before = board;

        assert_eq!(board.drop_disc(0, Symbol::One), Err(MoveError::ColumnFull(0)));
        assert_eq!(board, before);
        assert!(!board.is_column_open(0));
    }

    #[test]
    fn out_of_range_column_is_rejected() {
        let mut board = Board::new();
        assert_eq!(
            board.drop_disc(COLS, Symbol::One),
            Err(MoveError::ColumnOutOfRange(COLS as i64))
        );
        assert_eq!(board.occupied(), 0);
    }

    #[test]
    fn four_in_center_column_wins_on_fourth_drop() {
        let mut board = Board::new();
        let mut rows = Vec::new();
        for _ in 0..3 {
            let row = board.drop_disc(3, Symbol::One).unwrap();
            assert!(!board.check_win(row, 3, Symbol::One));
            rows.push(row);
        }
        rows.push(board.drop_disc(3, Symbol::One).unwrap());

        assert_eq!(rows, vec![5, 4, 3, 2]);
        assert!(board.check_win(2, 3, Symbol::One));
    }

    #[test]
    fn three_vertical_is_not_a_win() {
        let mut board = Board::new();
        let row = play(
            &mut board,
            &[(3, Symbol::One), (3, Symbol::One), (3, Symbol::One)],
        );
        assert!(!board.check_win(row, 3, Symbol::One));
    }

    #[test]
    fn horizontal_win_detected_from_middle_cell() {
        let mut board = Board::new();
        play(
            &mut board,
            &[(0, Symbol::Two), (1, Symbol::Two), (3, Symbol::Two)],
        );
        let row = board.drop_disc(2, Symbol::Two).unwrap();
        assert!(board.check_win(row, 2, Symbol::Two));
    }

    #[test]
    fn horizontal_three_with_gap_is_not_a_win() {
        let mut board = Board::new();
        let row = play(
            &mut board,
            &[(0, Symbol::One), (1, Symbol::One), (2, Symbol::One), (4, Symbol::One)],
        );
        assert!(!board.check_win(row, 4, Symbol::One));
        assert!(!board.check_win(5, 2, Symbol::One));
    }

    #[test]
    fn rising_diagonal_win() {
        // One occupies (5,0) (4,1) (3,2) (2,3)
        let mut board = Board::new();
        play(
            &mut board,
            &[
                (0, Symbol::One),
                (1, Symbol::Two),
                (1, Symbol::One),
                (2, Symbol::Two),
                (2, Symbol::Two),
                (2, Symbol::One),
                (3, Symbol::Two),
                (3, Symbol::Two),
                (3, Symbol::Two),
            ],
        );
        let row = board.drop_disc(3, Symbol::One).unwrap();
        assert_eq!(row, 2);
        assert!(board.check_win(row, 3, Symbol::One));
    }

    #[test]
    fn falling_diagonal_win() {
        // Two occupies (2,3) (3,4) (4,5) (5,6)
        let mut board = Board::new();
        play(
            &mut board,
            &[
                (6, Symbol::Two),
                (5, Symbol::One),
                (5, Symbol::Two),
                (4, Symbol::One),
                (4, Symbol::One),
                (4, Symbol::Two),
                (3, Symbol::One),
                (3, Symbol::One),
                (3, Symbol::One),
            ],
        );
        let row = board.drop_disc(3, Symbol::Two).unwrap();
        assert_eq!(row, 2);
        assert!(board.check_win(row, 3, Symbol::Two));
    }

    #[test]
    fn diagonal_of_three_is_not_a_win() {
        let mut board = Board::new();
        play(
            &mut board,
            &[
                (0, Symbol::One),
                (1, Symbol::Two),
                (1, Symbol::One),
                (2, Symbol::Two),
                (2, Symbol::Two),
            ],
        );
        let row = board.drop_disc(2, Symbol::One).unwrap();
        assert!(!board.check_win(row, 2, Symbol::One));
    }

    #[test]
    fn draw_sequence_fills_board_without_a_win() {
        let mut board = Board::new();
        let mut symbol = Symbol::One;
        for (i, &column) in DRAW_SEQUENCE.iter().enumerate() {
            assert!(!board.is_full(), "board full early at move {}", i);
            let row = board.drop_disc(column, symbol).unwrap();
            assert!(
                !board.check_win(row, column, symbol),
                "unexpected win at move {}",
                i
            );
            symbol = symbol.opponent();
        }
        assert!(board.is_full());
        assert_eq!(board.occupied(), ROWS * COLS);
        assert_eq!(board.legal_columns().count(), 0);
    }

    #[test]
    fn snapshot_uses_symbol_numbers() {
        let mut board = Board::new();
        board.drop_disc(0, Symbol::One).unwrap();
        board.drop_disc(6, Symbol::Two).unwrap();

        let grid = board.snapshot();
        assert_eq!(grid[5][0], 1);
        assert_eq!(grid[5][6], 2);
        assert_eq!(grid[0][0], 0);
    }

    #[test]
    fn symbol_serializes_as_number() {
        assert_eq!(serde_json::to_string(&Symbol::Two).unwrap(), "2");
        let parsed: Symbol = serde_json::from_str("1").unwrap();
        assert_eq!(parsed, Symbol::One);
        assert!(serde_json::from_str::<Symbol>("3").is_err());
    }
}
