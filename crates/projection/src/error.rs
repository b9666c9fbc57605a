//! Error types for projection setup and evaluation.

use thiserror::Error;

/// Errors that can occur while building or evaluating a projection.
#[derive(Debug, Error)]
pub enum ProjectionError {
    /// A `+key=value` token could not be parsed.
    #[error("invalid proj string token '{token}': {message}")]
    InvalidProjString { token: String, message: String },

    /// The descriptor does not request a projection this crate implements.
    #[error("unsupported projection '{0}', only 'stere' is implemented")]
    UnsupportedProjection(String),

    /// The descriptor is missing a required parameter.
    #[error("missing required parameter '+{0}'")]
    MissingParameter(String),

    /// Stereographic setup requires a polar aspect.
    #[error("latitude of origin must be +90 or -90 degrees, got {0}")]
    NotPolar(f64),

    /// Planar units other than meters are not supported.
    #[error("unsupported planar units '{0}', expected 'm'")]
    UnsupportedUnits(String),

    /// Only the WGS84 datum (or explicit semi-axes) is supported.
    #[error("unsupported datum or ellipsoid '{0}'")]
    UnsupportedDatum(String),

    /// Coordinate arrays passed together must have equal lengths.
    #[error("coordinate arrays have mismatched lengths: {left} vs {right}")]
    LengthMismatch { left: usize, right: usize },
}

/// Result type for projection operations.
pub type Result<T> = std::result::Result<T, ProjectionError>;
