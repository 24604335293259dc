pub use self::{core::*, engine::*};

pub mod core;
pub mod engine;

/// Validation failure while building a [`Tetrimino`] or [`PieceCatalog`].
#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum CatalogError {
    #[display("piece catalog must contain at least one piece")]
    EmptyCatalog,
    #[display("piece shape must be square, got a {rows}x{cols} grid")]
    NotSquare { rows: usize, cols: usize },
    #[display("piece shape must contain at least one occupied cell")]
    EmptyShape,
    #[display("piece shape of dimension {dim} exceeds the 4x4 bounding box")]
    OversizedShape { dim: usize },
    #[display("color index {value} is outside the valid range 1..=8")]
    ColorOutOfRange { value: u8 },
}
