//! Error types for regridding.

use thiserror::Error;

/// Errors that can occur while building or applying a regridder.
#[derive(Debug, Error)]
pub enum RegridError {
    /// A coordinate array does not match the declared grid shape.
    #[error("array length mismatch for {name}: expected {expected}, got {got}")]
    ShapeMismatch {
        name: &'static str,
        expected: usize,
        got: usize,
    },

    /// A grid dimension is zero.
    #[error("grid must have at least 2x2 cell centers, got {ny}x{nx}")]
    GridTooSmall { ny: usize, nx: usize },

    /// The conservative method needs cell corners on both grids.
    #[error("conservative regridding requires cell corners on the {0} grid")]
    CornersRequired(&'static str),

    /// A field passed to `apply` does not live on the source grid.
    #[error("field length {got} does not match source grid size {expected}")]
    FieldLength { expected: usize, got: usize },

    /// Unrecognized method name.
    #[error("unknown regrid method '{0}'")]
    UnknownMethod(String),
}

/// Result type for regridding operations.
pub type Result<T> = std::result::Result<T, RegridError>;
