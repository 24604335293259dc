use crate::{CatalogError, core::piece::Rotation};

/// Side length of the bounding box every piece shape must fit in.
///
/// Matches the number of hidden rows above the visible board, so a freshly
/// spawned piece always has room to enter the field.
pub const MAX_DIM: usize = 4;

/// Occupancy grid for one rotation of a piece, padded to the maximum
/// bounding box. Cells outside the piece's own `dim` are always `false`.
type ShapeGrid = [[bool; MAX_DIM]; MAX_DIM];

/// Palette slot a locked cell is painted with.
///
/// The engine does not interpret colors beyond carrying them from the catalog
/// into the board; the valid range 1..=8 leaves 0 free for "no cell" in
/// whatever palette the caller renders with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ColorIndex(u8);

impl ColorIndex {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 8;

    #[must_use]
    pub const fn new(value: u8) -> Option<Self> {
        if value >= Self::MIN && value <= Self::MAX {
            Some(Self(value))
        } else {
            None
        }
    }

    #[must_use]
    pub const fn get(self) -> u8 {
        self.0
    }
}

/// A piece shape with all four rotations precomputed at construction.
///
/// Built from a caller-supplied square boolean grid. Rotation `k + 1` is
/// rotation `k` turned 90° clockwise, so stepping through the rotation index
/// walks the full clockwise cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tetrimino {
    dim: usize,
    color: ColorIndex,
    rotations: [ShapeGrid; 4],
}

impl Tetrimino {
    /// Builds a piece from its spawn-orientation grid.
    ///
    /// The grid must be square, contain at least one occupied cell, and fit
    /// in the [`MAX_DIM`] bounding box; `color` must lie in
    /// [`ColorIndex::MIN`]..=[`ColorIndex::MAX`].
    pub fn new(color: u8, shape: &[Vec<bool>]) -> Result<Self, CatalogError> {
        let dim = shape.len();
        if dim == 0 {
            return Err(CatalogError::EmptyShape);
        }
        if dim > MAX_DIM {
            return Err(CatalogError::OversizedShape { dim });
        }
        if let Some(row) = shape.iter().find(|row| row.len() != dim) {
            return Err(CatalogError::NotSquare {
                rows: dim,
                cols: row.len(),
            });
        }
        if !shape.iter().flatten().any(|&occupied| occupied) {
            return Err(CatalogError::EmptyShape);
        }
        let color = ColorIndex::new(color).ok_or(CatalogError::ColorOutOfRange { value: color })?;

        let mut base = [[false; MAX_DIM]; MAX_DIM];
        for (row, cells) in base.iter_mut().zip(shape) {
            row[..dim].copy_from_slice(cells);
        }

        Ok(Self {
            dim,
            color,
            rotations: shape_rotations(dim, base),
        })
    }

    /// Side length of this piece's bounding box.
    #[must_use]
    pub const fn dim(&self) -> usize {
        self.dim
    }

    #[must_use]
    pub const fn color(&self) -> ColorIndex {
        self.color
    }

    /// Returns an iterator of occupied `(row, col)` offsets for the given
    /// rotation, relative to the top-left of the bounding box.
    pub fn cells(&self, rotation: Rotation) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.rotations[rotation.index()]
            .iter()
            .enumerate()
            .flat_map(|(row, cols)| {
                cols.iter()
                    .enumerate()
                    .filter_map(move |(col, &occupied)| occupied.then_some((row, col)))
            })
    }

    /// Whether the cell at the given bounding-box offset is occupied.
    ///
    /// Offsets outside the bounding box are unoccupied rather than an error,
    /// which keeps overlay lookups free of bounds arithmetic.
    #[must_use]
    pub fn occupies(&self, rotation: Rotation, row: usize, col: usize) -> bool {
        row < MAX_DIM && col < MAX_DIM && self.rotations[rotation.index()][row][col]
    }
}

/// Generates all 4 rotation states of a shape by rotating 90° clockwise.
fn shape_rotations(dim: usize, base: ShapeGrid) -> [ShapeGrid; 4] {
    let mut rotations = [base; 4];
    for k in 1..4 {
        let prev = rotations[k - 1];
        let mut next = [[false; MAX_DIM]; MAX_DIM];
        for (i, row) in prev.iter().enumerate().take(dim) {
            for (j, &occupied) in row.iter().enumerate().take(dim) {
                next[j][dim - 1 - i] = occupied;
            }
        }
        rotations[k] = next;
    }
    rotations
}

/// Immutable set of piece shapes a game is played with.
///
/// Built once and shared (typically behind an `Arc`) between the simulation
/// and whatever renders previews; restarting a game reuses the same catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PieceCatalog {
    pieces: Vec<Tetrimino>,
}

impl PieceCatalog {
    pub fn new(pieces: Vec<Tetrimino>) -> Result<Self, CatalogError> {
        if pieces.is_empty() {
            return Err(CatalogError::EmptyCatalog);
        }
        Ok(Self { pieces })
    }

    /// The classic seven tetrominoes (I, O, S, Z, J, L, T) with colors 1-7.
    #[must_use]
    pub fn standard() -> Self {
        let shapes: [&[&str]; 7] = [
            // I-piece
            &["....", "####", "....", "...."],
            // O-piece
            &["##", "##"],
            // S-piece
            &[".##", "##.", "..."],
            // Z-piece
            &["##.", ".##", "..."],
            // J-piece
            &["#..", "###", "..."],
            // L-piece
            &["..#", "###", "..."],
            // T-piece
            &[".#.", "###", "..."],
        ];
        let pieces = shapes
            .iter()
            .zip(1u8..)
            .map(|(rows, color)| {
                let grid: Vec<Vec<bool>> = rows
                    .iter()
                    .map(|row| row.chars().map(|c| c == '#').collect())
                    .collect();
                Tetrimino::new(color, &grid).expect("builtin shapes are valid")
            })
            .collect();
        Self { pieces }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pieces.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pieces.is_empty()
    }

    /// Returns the piece for a type id handed out by the queue.
    ///
    /// # Panics
    ///
    /// Panics if `type_id` is not an index into this catalog.
    #[must_use]
    pub fn piece(&self, type_id: usize) -> &Tetrimino {
        &self.pieces[type_id]
    }

    #[must_use]
    pub fn pieces(&self) -> &[Tetrimino] {
        &self.pieces
    }
}
