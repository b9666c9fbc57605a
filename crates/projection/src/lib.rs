//! Coordinate reference system transformations for polar grids.
//!
//! Implements the polar stereographic projection from scratch without
//! external dependencies, constructed from PROJ.4-style descriptor strings
//! as used by the polar gridded-data community.

pub mod error;
pub mod proj4;
pub mod stereographic;

pub use error::{ProjectionError, Result};
pub use proj4::Proj4Params;
pub use stereographic::{Ellipsoid, PolarStereographic, Pole};
