//! Single-ply heuristic placement search
//!
//! Every (rotation, column) pair is dropped straight down from row 0 onto a copy of
//! the board, full rows are cleared on the copy, and the result is scored with a fixed
//! linear evaluation. The live board is never touched.

use duo_tetris_core::{Board, Shape};

/// Weights of the linear board evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchWeights {
    pub lines: i64,
    pub holes: i64,
    pub stack_height: i64,
    pub roughness: i64,
    pub gaps: i64,
    pub near_full_rows: i64,
}

impl Default for SearchWeights {
    fn default() -> Self {
        Self {
            lines: 10_000,
            holes: -200,
            stack_height: -50,
            roughness: -20,
            gaps: -100,
            near_full_rows: 500,
        }
    }
}

impl SearchWeights {
    pub fn score(&self, lines: usize, features: &BoardFeatures) -> i64 {
        self.lines * lines as i64
            + self.holes * features.holes as i64
            + self.stack_height * features.stack_height as i64
            + self.roughness * features.roughness as i64
            + self.gaps * features.gaps as i64
            + self.near_full_rows * features.near_full_rows as i64
    }
}

/// Evaluation terms measured on a board after placement and clearing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BoardFeatures {
    /// Empty cells with a filled cell somewhere above them in the same column
    pub holes: usize,
    /// `height - topmost filled row`, 0 when the board is empty
    pub stack_height: usize,
    /// Sum of absolute height differences between adjacent columns
    pub roughness: usize,
    /// Empty cells below each column's topmost filled cell
    pub gaps: usize,
    /// Filled cells summed over rows with at least `width - 2` filled cells
    pub near_full_rows: usize,
}

impl BoardFeatures {
    pub fn measure(board: &Board) -> Self {
        let width = board.width();
        let height = board.height();

        let mut holes = 0;
        for col in 0..width {
            let mut block_seen = false;
            for row in 0..height {
                let filled = board.get(row as i32, col as i32).is_some_and(|c| c != 0);
                if filled {
                    block_seen = true;
                } else if block_seen {
                    holes += 1;
                }
            }
        }

        let stack_height = board.top_filled_row().map_or(0, |row| height - row);

        let roughness = (1..width)
            .map(|col| board.column_height(col - 1).abs_diff(board.column_height(col)))
            .sum();

        // Column heights give the topmost filled cell directly
        let mut gaps = 0;
        for col in 0..width {
            let h = board.column_height(col);
            if h == 0 {
                continue;
            }
            gaps += (height - h..height)
                .filter(|&row| board.get(row as i32, col as i32) == Some(0))
                .count();
        }

        let near_full_rows = (0..height)
            .map(|row| board.filled_in_row(row))
            .filter(|&filled| filled + 2 >= width)
            .sum();

        Self {
            holes,
            stack_height,
            roughness,
            gaps,
            near_full_rows,
        }
    }
}

/// A scored placement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveCandidate {
    /// Clockwise quarter turns applied to the input shape (0..=3)
    pub rotation: u8,
    /// Target anchor column
    pub col: i32,
    /// Anchor row where the shape comes to rest
    pub row: i32,
    /// Lines the placement clears on the simulated board
    pub lines_cleared: usize,
    pub score: i64,
}

/// Row where `shape` comes to rest when dropped from row 0.
///
/// None when the shape does not fit at row 0.
pub fn resting_row(board: &Board, shape: &Shape, col: i32) -> Option<i32> {
    if !board.can_place(shape, 0, col) {
        return None;
    }
    let last = board.height() as i32 - 1;
    let mut row = 0;
    while row < last && board.can_place(shape, row + 1, col) {
        row += 1;
    }
    Some(row)
}

/// Best placement for `shape` with the default weights
pub fn find_best_move(board: &Board, shape: &Shape) -> Option<MoveCandidate> {
    find_best_move_with(board, shape, &SearchWeights::default())
}

/// Best placement for `shape`; ties keep the lowest rotation, then the lowest column
pub fn find_best_move_with(
    board: &Board,
    shape: &Shape,
    weights: &SearchWeights,
) -> Option<MoveCandidate> {
    let mut best: Option<MoveCandidate> = None;
    let mut scratch = board.clone();

    let mut rotated = shape.clone();
    for rotation in 0..4u8 {
        for col in 0..board.width() as i32 {
            let Some(row) = resting_row(board, &rotated, col) else {
                continue;
            };

            scratch.clone_from(board);
            scratch.place(&rotated, 1, row, col);
            let lines_cleared = scratch.clear_full_rows();
            let features = BoardFeatures::measure(&scratch);
            let score = weights.score(lines_cleared, &features);

            if best.map_or(true, |b| score > b.score) {
                best = Some(MoveCandidate {
                    rotation,
                    col,
                    row,
                    lines_cleared,
                    score,
                });
            }
        }
        rotated = rotated.rotate_cw();
    }

    best
}
