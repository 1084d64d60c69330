//! Pieces module - piece catalog, shape matrices and rotation
//!
//! Shapes are small rectangular matrices of cell tags (0 = empty). Rotation builds a
//! new matrix turned 90° clockwise, so an `r x c` shape becomes `c x r`. There is no
//! kick table: a rotation either fits at the same anchor or is rejected.

use arrayvec::ArrayVec;
use rand::Rng;

use crate::types::{
    Cell, PowerUp, Rgb, EMPTY, EXTENDED_PIECE_COUNT, MAX_TAG, POWER_UP_CHANCE,
    STANDARD_PIECE_COUNT,
};

/// Largest number of cells a shape matrix may hold
pub const MAX_SHAPE_CELLS: usize = 16;

/// Catalog shapes, indexed by `tag - 1`
const SHAPES: [&[&[Cell]]; STANDARD_PIECE_COUNT + EXTENDED_PIECE_COUNT] = [
    // I
    &[&[1, 1, 1, 1]],
    // O
    &[&[2, 2], &[2, 2]],
    // T
    &[&[0, 3, 0], &[3, 3, 3]],
    // S
    &[&[0, 4, 4], &[4, 4, 0]],
    // Z
    &[&[5, 5, 0], &[0, 5, 5]],
    // J
    &[&[6, 0, 0], &[6, 6, 6]],
    // L
    &[&[0, 0, 7], &[7, 7, 7]],
    // Plus
    &[&[0, 8, 0], &[8, 8, 8], &[0, 8, 0]],
    // U
    &[&[9, 0, 9], &[9, 9, 9]],
    // Dot
    &[&[10]],
    // Domino
    &[&[11, 11]],
    // Corner
    &[&[12, 0], &[12, 12]],
    // Long
    &[&[13, 13, 13, 13, 13]],
];

const COLORS: [Rgb; STANDARD_PIECE_COUNT + EXTENDED_PIECE_COUNT] = [
    Rgb::new(0, 255, 255),   // cyan
    Rgb::new(255, 255, 0),   // yellow
    Rgb::new(255, 0, 255),   // magenta
    Rgb::new(0, 255, 0),     // green
    Rgb::new(255, 0, 0),     // red
    Rgb::new(0, 0, 255),     // blue
    Rgb::new(255, 200, 0),   // orange
    Rgb::new(255, 255, 255), // white
    Rgb::new(255, 175, 175), // pink
    Rgb::new(128, 128, 128), // gray
    Rgb::new(191, 255, 0),   // lime
    Rgb::new(0, 128, 128),   // teal
    Rgb::new(255, 215, 0),   // gold
];

/// Rectangular matrix of cell tags
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Shape {
    rows: usize,
    cols: usize,
    /// Row-major cells
    cells: ArrayVec<Cell, MAX_SHAPE_CELLS>,
}

impl Shape {
    /// Build a shape from rows of equal length.
    ///
    /// Returns None for empty, ragged or oversized input.
    pub fn from_rows(rows: &[&[Cell]]) -> Option<Self> {
        let cols = rows.first()?.len();
        if cols == 0 || rows.len() * cols > MAX_SHAPE_CELLS {
            return None;
        }
        let mut cells = ArrayVec::new();
        for row in rows {
            if row.len() != cols {
                return None;
            }
            cells.try_extend_from_slice(row).ok()?;
        }
        Some(Self {
            rows: rows.len(),
            cols,
            cells,
        })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Cell at (row, col); out of range reads as empty
    pub fn get(&self, row: usize, col: usize) -> Cell {
        if row >= self.rows || col >= self.cols {
            return EMPTY;
        }
        self.cells[row * self.cols + col]
    }

    /// Iterate the non-empty cells as `(row, col, tag)`
    pub fn filled(&self) -> impl Iterator<Item = (usize, usize, Cell)> + '_ {
        let cols = self.cols;
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, &c)| c != EMPTY)
            .map(move |(i, &c)| (i / cols, i % cols, c))
    }

    /// New matrix rotated 90° clockwise: `out[c][rows - 1 - r] = in[r][c]`
    pub fn rotate_cw(&self) -> Shape {
        let (rows, cols) = (self.rows, self.cols);
        let mut cells: ArrayVec<Cell, MAX_SHAPE_CELLS> = ArrayVec::new();
        // Output has `cols` rows of `rows` cells.
        for out_r in 0..cols {
            for out_c in 0..rows {
                cells.push(self.cells[(rows - 1 - out_c) * cols + out_r]);
            }
        }
        Shape {
            rows: cols,
            cols: rows,
            cells,
        }
    }

    /// Rotate clockwise `times` times (mod 4)
    pub fn rotated(&self, times: u8) -> Shape {
        let mut shape = self.clone();
        for _ in 0..(times % 4) {
            shape = shape.rotate_cw();
        }
        shape
    }
}

/// Canonical shape for a piece tag
pub fn shape_for(tag: Cell) -> Option<Shape> {
    if tag == EMPTY || tag > MAX_TAG {
        return None;
    }
    Some(catalog_shape(tag as usize - 1))
}

/// Catalog entries are constants that all fit in `MAX_SHAPE_CELLS`.
fn catalog_shape(index: usize) -> Shape {
    let rows = SHAPES[index];
    let mut cells = ArrayVec::new();
    for row in rows {
        cells.extend(row.iter().copied());
    }
    Shape {
        rows: rows.len(),
        cols: rows[0].len(),
        cells,
    }
}

/// Display color for a piece tag
pub fn color_for(tag: Cell) -> Option<Rgb> {
    if tag == EMPTY || tag > MAX_TAG {
        return None;
    }
    Some(COLORS[tag as usize - 1])
}

/// Rotate a shape 90° clockwise (catalog entry point)
pub fn rotate_cw(shape: &Shape) -> Shape {
    shape.rotate_cw()
}

/// Active falling piece
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Piece {
    pub shape: Shape,
    pub kind: Cell,
    /// Board row of the shape's top-left cell
    pub row: i32,
    /// Board column of the shape's top-left cell
    pub col: i32,
    pub special: bool,
    pub power_up: Option<PowerUp>,
}

impl Piece {
    /// Piece of the given tag at its spawn anchor, without a power-up
    pub fn new(kind: Cell, board_width: usize) -> Option<Self> {
        let shape = shape_for(kind)?;
        let col = spawn_col(board_width, shape.cols());
        Some(Self {
            shape,
            kind,
            row: 0,
            col,
            special: kind as usize > STANDARD_PIECE_COUNT,
            power_up: None,
        })
    }

    pub fn with_power_up(mut self, power_up: PowerUp) -> Self {
        self.power_up = Some(power_up);
        self
    }

    pub fn color(&self) -> Rgb {
        color_for(self.kind).unwrap_or(Rgb::new(255, 255, 255))
    }

    /// Board cell at the middle of the shape (used by BOMB)
    pub fn center(&self) -> (i32, i32) {
        (
            self.row + (self.shape.rows() / 2) as i32,
            self.col + (self.shape.cols() / 2) as i32,
        )
    }
}

fn spawn_col(board_width: usize, shape_cols: usize) -> i32 {
    (board_width / 2) as i32 - (shape_cols / 2) as i32
}

/// Pick a random piece and centre it on a board of `board_width` columns.
///
/// Extended mode draws from all 13 pieces; extended-only pieces are marked special and
/// carry a random power-up 30% of the time.
pub fn spawn<R: Rng + ?Sized>(board_width: usize, extended: bool, rng: &mut R) -> Piece {
    let count = if extended {
        STANDARD_PIECE_COUNT + EXTENDED_PIECE_COUNT
    } else {
        STANDARD_PIECE_COUNT
    };
    let index = rng.gen_range(0..count);
    let kind = (index + 1) as Cell;
    let shape = catalog_shape(index);

    let mut piece = Piece {
        col: spawn_col(board_width, shape.cols()),
        shape,
        kind,
        row: 0,
        special: false,
        power_up: None,
    };

    if index >= STANDARD_PIECE_COUNT {
        piece.special = true;
        if rng.gen_bool(POWER_UP_CHANCE) {
            piece.power_up = Some(PowerUp::ALL[rng.gen_range(0..PowerUp::ALL.len())]);
        }
    }

    piece
}
