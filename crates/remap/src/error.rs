//! Error types for field remapping.

use thiserror::Error;

/// Errors that can occur while preparing or remapping fields.
#[derive(Debug, Error)]
pub enum RemapError {
    /// Planar axis units must be meters or kilometers.
    #[error("invalid units '{0}', must be 'm' or 'km'")]
    InvalidUnits(String),

    /// A rotation angle array exceeds the 2*pi magnitude bound, which means
    /// it is almost certainly in degrees.
    #[error("rotation angle looks like degrees (max |angle| = {max_abs:.3}), expected radians")]
    AngleNotRadians { max_abs: f64 },

    /// A field expected to be a plain 2-D array has a different rank.
    #[error("field '{name}' must be 2-dimensional, has {ndim} dimensions")]
    NotTwoDimensional { name: String, ndim: usize },

    /// A named field is absent from the dataset.
    #[error("field not found: {0}")]
    MissingField(String),

    /// Co-indexed arrays disagree in shape.
    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),

    /// The supergrid arrays do not describe a valid double-resolution mesh.
    #[error("invalid supergrid: {0}")]
    InvalidSupergrid(String),

    /// Projection setup or evaluation failed.
    #[error("projection error: {0}")]
    Projection(#[from] projection::ProjectionError),

    /// Regridding failed.
    #[error("regridding error: {0}")]
    Regrid(#[from] regridder::RegridError),
}

/// Result type for remapping operations.
pub type Result<T> = std::result::Result<T, RemapError>;
