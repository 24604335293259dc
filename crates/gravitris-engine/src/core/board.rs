use arrayvec::ArrayVec;

use crate::core::{
    catalog::{ColorIndex, Tetrimino},
    piece::{ActivePiece, Rotation},
};

/// A single board cell: empty, or locked with the color of the piece that
/// filled it.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Cell {
    #[default]
    Empty,
    Filled(ColorIndex),
}

impl Cell {
    #[must_use]
    pub const fn is_empty(self) -> bool {
        matches!(self, Cell::Empty)
    }

    #[must_use]
    pub const fn is_filled(self) -> bool {
        matches!(self, Cell::Filled(_))
    }
}

/// The playing field: a color grid with hidden rows above the visible area.
///
/// # Coordinate System
///
/// All public accessors take visible-board coordinates: row 0 is the top
/// visible row, row `VISIBLE_HEIGHT - 1` the bottom. The hidden rows extend
/// the grid upward so a spawning piece can straddle the top edge; internally
/// they sit at storage rows `0..HIDDEN_ROWS`, and signed rows as far up as
/// `-HIDDEN_ROWS` map into them.
///
/// The board is mutated in exactly three ways: locking a piece in, wiping
/// single cells during the line-clear animation, and collapsing a completed
/// row. Everything else is read-only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    cells: [[Cell; Self::WIDTH]; Self::TOTAL_HEIGHT],
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl Board {
    /// Number of columns.
    pub const WIDTH: usize = 10;
    /// Number of visible rows.
    pub const VISIBLE_HEIGHT: usize = 20;
    /// Rows of headroom above the visible area.
    pub const HIDDEN_ROWS: usize = 4;
    /// Total stored rows, hidden rows included.
    pub const TOTAL_HEIGHT: usize = Self::VISIBLE_HEIGHT + Self::HIDDEN_ROWS;

    /// How far above the visible top edge a piece cell may still sit. Rows
    /// beyond this soft ceiling are reserved for spawning only.
    const CEILING_MARGIN: i32 = 2;

    #[must_use]
    pub const fn new() -> Self {
        Self {
            cells: [[Cell::Empty; Self::WIDTH]; Self::TOTAL_HEIGHT],
        }
    }

    /// Whether the piece may legally sit at the given placement.
    ///
    /// This is the single legality check the whole engine goes through: side
    /// walls, the visible bottom edge, the soft ceiling, and overlap with
    /// locked cells. A cell above the soft ceiling fails even though storage
    /// for it exists, so pieces cannot be steered back into the spawn rows.
    #[must_use]
    #[expect(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    pub fn fits(&self, shape: &Tetrimino, x: i32, y: i32, rotation: Rotation) -> bool {
        shape.cells(rotation).all(|(row, col)| {
            let cell_y = y + row as i32;
            let cell_x = x + col as i32;
            cell_x >= 0
                && cell_x < Self::WIDTH as i32
                && cell_y >= -Self::CEILING_MARGIN
                && cell_y < Self::VISIBLE_HEIGHT as i32
                && self.signed_cell(cell_y, cell_x).is_empty()
        })
    }

    /// Locks the piece into the grid, painting its cells with the shape's
    /// color. The placement must satisfy [`Self::fits`].
    #[expect(
        clippy::cast_possible_truncation,
        clippy::cast_possible_wrap,
        clippy::cast_sign_loss
    )]
    pub fn fill_piece(&mut self, shape: &Tetrimino, piece: &ActivePiece) {
        for (row, col) in shape.cells(piece.rotation) {
            let storage_y = (piece.y + row as i32 + Self::HIDDEN_ROWS as i32) as usize;
            let storage_x = (piece.x + col as i32) as usize;
            self.cells[storage_y][storage_x] = Cell::Filled(shape.color());
        }
    }

    /// Visible rows that are completely filled, top to bottom.
    ///
    /// A locked piece spans at most four rows, so at most four rows can
    /// complete at once during play.
    #[must_use]
    pub fn completed_rows(&self) -> ArrayVec<usize, 4> {
        let mut rows = ArrayVec::new();
        for y in 0..Self::VISIBLE_HEIGHT {
            if self.cells[Self::HIDDEN_ROWS + y].iter().all(|c| c.is_filled()) {
                rows.push(y);
            }
        }
        rows
    }

    /// Blanks a single cell. Used by the column-wipe animation.
    pub fn clear_cell(&mut self, row: usize, col: usize) {
        self.cells[Self::HIDDEN_ROWS + row][col] = Cell::Empty;
    }

    /// Removes a visible row, shifting everything above it down one row and
    /// leaving a blank row at the top of storage.
    pub fn collapse_row(&mut self, row: usize) {
        let target = Self::HIDDEN_ROWS + row;
        for y in (1..=target).rev() {
            self.cells[y] = self.cells[y - 1];
        }
        self.cells[0] = [Cell::Empty; Self::WIDTH];
    }

    /// Cell at a visible-board coordinate.
    ///
    /// # Panics
    ///
    /// Panics if `row` or `col` is outside the visible board.
    #[must_use]
    pub fn cell(&self, row: usize, col: usize) -> Cell {
        assert!(row < Self::VISIBLE_HEIGHT && col < Self::WIDTH);
        self.cells[Self::HIDDEN_ROWS + row][col]
    }

    #[expect(
        clippy::cast_possible_truncation,
        clippy::cast_possible_wrap,
        clippy::cast_sign_loss
    )]
    fn signed_cell(&self, row: i32, col: i32) -> Cell {
        self.cells[(row + Self::HIDDEN_ROWS as i32) as usize][col as usize]
    }

    /// Builds a board from ASCII art for tests and fixtures.
    ///
    /// Each non-empty line is one visible row, top to bottom, and must hold
    /// exactly [`Self::WIDTH`] cell characters: `.` for empty, `#` for a cell
    /// of color 1, or a digit `1`-`8` for that color. Fewer than
    /// [`Self::VISIBLE_HEIGHT`] lines leave the remaining bottom rows empty.
    ///
    /// # Panics
    ///
    /// Panics if a row has the wrong width or holds an unknown character.
    #[must_use]
    pub fn from_ascii(art: &str) -> Self {
        let mut board = Self::new();
        let lines: Vec<&str> = art.lines().filter(|line| !line.trim().is_empty()).collect();

        for (y, line) in lines.iter().enumerate() {
            let chars: Vec<char> = line.trim().chars().collect();
            assert_eq!(
                chars.len(),
                Self::WIDTH,
                "each row must have exactly {} cells, got {} at row {y}",
                Self::WIDTH,
                chars.len(),
            );

            for (x, &ch) in chars.iter().enumerate() {
                let cell = match ch {
                    '.' => Cell::Empty,
                    '#' => Cell::Filled(ColorIndex::new(1).unwrap()),
                    '1'..='8' => {
                        let value = ch.to_digit(10).unwrap();
                        Cell::Filled(ColorIndex::new(u8::try_from(value).unwrap()).unwrap())
                    }
                    _ => panic!("unknown cell character {ch:?} at row {y}"),
                };
                board.cells[Self::HIDDEN_ROWS + y][x] = cell;
            }
        }
        board
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single_cell_piece() -> Tetrimino {
        Tetrimino::new(1, &[vec![true]]).unwrap()
    }

    fn square_piece() -> Tetrimino {
        Tetrimino::new(2, &[vec![true, true], vec![true, true]]).unwrap()
    }

    #[test]
    fn test_fits_respects_walls_and_floor() {
        let board = Board::new();
        let piece = single_cell_piece();
        let r = Rotation::default();

        assert!(board.fits(&piece, 0, 0, r));
        assert!(board.fits(&piece, 9, 19, r));
        assert!(!board.fits(&piece, -1, 0, r));
        assert!(!board.fits(&piece, 10, 0, r));
        assert!(!board.fits(&piece, 0, 20, r));
    }

    #[test]
    fn test_fits_allows_two_rows_above_top_edge() {
        let board = Board::new();
        let piece = single_cell_piece();
        let r = Rotation::default();

        assert!(board.fits(&piece, 4, -1, r));
        assert!(board.fits(&piece, 4, -2, r));
        assert!(!board.fits(&piece, 4, -3, r));
    }

    #[test]
    fn test_fits_rejects_overlap_with_locked_cells() {
        let board = Board::from_ascii(
            r"
            ..........
            ....#.....
            ",
        );
        let piece = square_piece();
        let r = Rotation::default();

        assert!(!board.fits(&piece, 4, 0, r));
        assert!(!board.fits(&piece, 3, 1, r));
        assert!(board.fits(&piece, 5, 0, r));
        assert!(board.fits(&piece, 4, 2, r));
    }

    #[test]
    fn test_fill_piece_paints_color() {
        let mut board = Board::new();
        let shape = square_piece();
        let piece = ActivePiece::new(0, 4, 18);

        board.fill_piece(&shape, &piece);

        for (row, col) in [(18, 4), (18, 5), (19, 4), (19, 5)] {
            assert_eq!(board.cell(row, col), Cell::Filled(shape.color()));
        }
        assert!(board.cell(17, 4).is_empty());
        assert!(board.cell(18, 6).is_empty());
    }

    #[test]
    fn test_fill_piece_in_hidden_rows() {
        let mut board = Board::new();
        let shape = square_piece();
        let piece = ActivePiece::new(0, 4, -1);

        board.fill_piece(&shape, &piece);

        // Only the lower half of the piece is on the visible board.
        assert_eq!(board.cell(0, 4), Cell::Filled(shape.color()));
        assert_eq!(board.cell(0, 5), Cell::Filled(shape.color()));
        assert!(!board.fits(&single_cell_piece(), 4, 0, Rotation::default()));
    }

    #[test]
    fn test_completed_rows_reports_full_rows_in_order() {
        let board = Board::from_ascii(
            r"
            ..........
            ##########
            .#########
            ##########
            ",
        );
        assert_eq!(board.completed_rows().as_slice(), &[1, 3]);
    }

    #[test]
    fn test_collapse_row_shifts_rows_above() {
        let mut board = Board::from_ascii(
            r"
            12........
            ##########
            ...3......
            ",
        );

        board.collapse_row(1);

        assert_eq!(board.cell(0, 0), Cell::Empty);
        assert_eq!(board.cell(1, 0), Cell::Filled(ColorIndex::new(1).unwrap()));
        assert_eq!(board.cell(1, 1), Cell::Filled(ColorIndex::new(2).unwrap()));
        // The row below the collapsed one stays where it was.
        assert_eq!(board.cell(2, 3), Cell::Filled(ColorIndex::new(3).unwrap()));
        assert!(board.completed_rows().is_empty());
    }

    #[test]
    fn test_clear_cell() {
        let mut board = Board::from_ascii(
            r"
            ##########
            ",
        );

        board.clear_cell(0, 9);

        assert!(board.cell(0, 9).is_empty());
        assert!(board.completed_rows().is_empty());
    }

    #[test]
    fn test_from_ascii_colors() {
        let board = Board::from_ascii(
            r"
            1.3.5.7.#.
            ",
        );
        assert_eq!(board.cell(0, 0), Cell::Filled(ColorIndex::new(1).unwrap()));
        assert_eq!(board.cell(0, 2), Cell::Filled(ColorIndex::new(3).unwrap()));
        assert_eq!(board.cell(0, 8), Cell::Filled(ColorIndex::new(1).unwrap()));
        assert!(board.cell(0, 1).is_empty());
        assert!(board.cell(1, 0).is_empty());
    }
}
