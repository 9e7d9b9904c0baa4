// THEORY:
// Every failure the engine can report is a local, recoverable rejection of one
// requested operation. None of them poison the session: the caller gets the error
// back and the grid, relation and base color are exactly as they were before the
// call. Numeric edge cases (hue wrap, saturation/lightness clamping) are policies,
// not errors, and never show up here.

use thiserror::Error;

/// Errors produced by the relational color engine.
#[derive(Debug, Error)]
pub enum Error {
    /// A color string was not a 3- or 6-digit hex color.
    #[error("invalid color format: {0:?}")]
    InvalidColorFormat(String),

    /// A cell index outside the grid.
    #[error("index {index} is out of bounds for a grid of {len} cells")]
    InvalidIndex { index: usize, len: usize },

    /// Confirm was requested while no cell is selected.
    #[error("cannot confirm an empty selection")]
    EmptySelection,

    /// Only selected cells may become the base pixel.
    #[error("cell {0} is not selected and cannot become the base pixel")]
    BaseNotSelected(usize),

    /// A session operation was invoked in a state that does not allow it.
    #[error("`{operation}` is not allowed while the session is {state}")]
    InvalidTransition {
        operation: &'static str,
        state: &'static str,
    },

    /// The grid edge length is not one of the supported sizes.
    #[error("unsupported grid size {0} (expected 16 or 32)")]
    UnsupportedGridSize(u32),

    /// An ingestion buffer did not match the grid: `size * size * 4` bytes for raw
    /// RGBA, `size * size` entries for a pixel list.
    #[error("expected a buffer of {expected} entries, got {actual}")]
    BufferLength { expected: usize, actual: usize },

    /// Export scale must be finite and strictly positive.
    #[error("invalid export scale {0}")]
    InvalidScale(f32),

    #[error(transparent)]
    Image(#[from] image::ImageError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("invalid session configuration: {0}")]
    Config(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
