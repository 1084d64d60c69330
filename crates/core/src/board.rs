//! Board module - manages the game grid
//!
//! The board is a `height x width` grid of cell tags (0 = empty). Storage is a flat
//! row-major vector; dimensions are fixed until the board is rebuilt on reset.
//! Coordinates are (row, col) with row 0 at the top.

use crate::pieces::Shape;
use crate::types::{Cell, EMPTY};

/// The game board
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Board {
    width: usize,
    height: usize,
    /// Flat array of cells, row-major order (row * width + col)
    cells: Vec<Cell>,
}

impl Board {
    /// Create a new empty board
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![EMPTY; width * height],
        }
    }

    /// Build a board from rows of equal length (top row first).
    ///
    /// Returns None for empty or ragged input.
    pub fn from_rows(rows: &[Vec<Cell>]) -> Option<Self> {
        let width = rows.first()?.len();
        if width == 0 || rows.iter().any(|row| row.len() != width) {
            return None;
        }
        Some(Self {
            width,
            height: rows.len(),
            cells: rows.concat(),
        })
    }

    /// Calculate flat index from (row, col)
    #[inline(always)]
    fn index(&self, row: i32, col: i32) -> Option<usize> {
        if row < 0 || col < 0 || row as usize >= self.height || col as usize >= self.width {
            return None;
        }
        Some(row as usize * self.width + col as usize)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Get cell at (row, col); None if out of bounds
    pub fn get(&self, row: i32, col: i32) -> Option<Cell> {
        self.index(row, col).map(|idx| self.cells[idx])
    }

    /// Set cell at (row, col); returns false if out of bounds
    pub fn set(&mut self, row: i32, col: i32, cell: Cell) -> bool {
        match self.index(row, col) {
            Some(idx) => {
                self.cells[idx] = cell;
                true
            }
            None => false,
        }
    }

    /// Within bounds and empty
    pub fn is_empty_at(&self, row: i32, col: i32) -> bool {
        matches!(self.get(row, col), Some(EMPTY))
    }

    /// One row of cells
    pub fn row(&self, row: usize) -> &[Cell] {
        let start = row * self.width;
        &self.cells[start..start + self.width]
    }

    /// Iterate rows top to bottom
    pub fn rows(&self) -> impl Iterator<Item = &[Cell]> {
        self.cells.chunks(self.width.max(1))
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// True iff every occupied shape cell lands in bounds over an empty cell
    pub fn can_place(&self, shape: &Shape, row: i32, col: i32) -> bool {
        shape
            .filled()
            .all(|(r, c, _)| self.is_empty_at(row + r as i32, col + c as i32))
    }

    /// Write `tag` into every occupied shape cell.
    ///
    /// Callers check `can_place` first; cells outside the grid are skipped.
    pub fn place(&mut self, shape: &Shape, tag: Cell, row: i32, col: i32) {
        for (r, c, _) in shape.filled() {
            self.set(row + r as i32, col + c as i32, tag);
        }
    }

    /// Zero the 3x3 neighbourhood around (center_row, center_col), clamped to the grid
    pub fn clear_bomb_area(&mut self, center_row: i32, center_col: i32) {
        for row in (center_row - 1)..=(center_row + 1) {
            for col in (center_col - 1)..=(center_col + 1) {
                self.set(row, col, EMPTY);
            }
        }
    }

    /// Zero a whole row; no-op when out of range
    pub fn clear_row(&mut self, row: i32) {
        if row < 0 || row as usize >= self.height {
            return;
        }
        let start = row as usize * self.width;
        self.cells[start..start + self.width].fill(EMPTY);
    }

    /// Zero a whole column; no-op when out of range
    pub fn clear_column(&mut self, col: i32) {
        if col < 0 || col as usize >= self.width {
            return;
        }
        for row in 0..self.height {
            self.cells[row * self.width + col as usize] = EMPTY;
        }
    }

    /// Check if a row is completely filled
    pub fn is_row_full(&self, row: usize) -> bool {
        row < self.height && self.row(row).iter().all(|&c| c != EMPTY)
    }

    /// Number of filled cells in a row
    pub fn filled_in_row(&self, row: usize) -> usize {
        self.row(row).iter().filter(|&&c| c != EMPTY).count()
    }

    /// Remove one row, shifting every row above it down and zeroing row 0
    fn collapse_row(&mut self, row: usize) {
        let width = self.width;
        // copy_within handles the overlapping ranges
        self.cells.copy_within(0..row * width, width);
        self.cells[..width].fill(EMPTY);
    }

    /// Clear all full rows and return how many were removed.
    ///
    /// Scans bottom to top; after collapsing a row the same index is examined again,
    /// since the row shifted into it may be full as well.
    pub fn clear_full_rows(&mut self) -> usize {
        // A zero-width row reads as full and would never collapse
        if self.width == 0 {
            return 0;
        }
        let mut cleared = 0;
        let mut row = self.height;
        while row > 0 {
            if self.is_row_full(row - 1) {
                self.collapse_row(row - 1);
                cleared += 1;
            } else {
                row -= 1;
            }
        }
        cleared
    }

    /// Column height: `height - topmost filled row`, 0 for an empty column
    pub fn column_height(&self, col: usize) -> usize {
        (0..self.height)
            .find(|&row| self.cells[row * self.width + col] != EMPTY)
            .map_or(0, |row| self.height - row)
    }

    /// Row index of the topmost filled cell anywhere on the board
    pub fn top_filled_row(&self) -> Option<usize> {
        (0..self.height).find(|&row| self.filled_in_row(row) > 0)
    }

    /// Number of filled cells on the board
    pub fn filled_count(&self) -> usize {
        self.cells.iter().filter(|&&c| c != EMPTY).count()
    }

    /// Clear the entire board
    pub fn clear(&mut self) {
        self.cells.fill(EMPTY);
    }
}
