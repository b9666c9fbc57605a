//! Regridding between curvilinear grids.
//!
//! This crate maps fields defined on the cell centers of one logically
//! rectangular, curvilinear grid onto the cell centers of another. The
//! expensive part — computing the sparse interpolation weights — is done
//! once per (source, destination, method) triple; the resulting
//! [`Regridder`] can then be applied to any number of fields.
//!
//! ```text
//! source Grid ──┐
//!               ├─► Regridder::new(..., method)   (weights, cached)
//! dest Grid ────┘            │
//!                            ▼
//!       field on source ──► apply ──► field on dest (NaN where unmapped)
//! ```
//!
//! Destination cells the source grid cannot reach are always signalled as
//! NaN, never silently zero-filled.

pub mod error;
pub mod grid;
pub mod method;
pub mod regridder;
pub mod search;
pub mod weights;

pub use error::{RegridError, Result};
pub use grid::{CellCenters, CellCorners, Grid};
pub use method::Method;
pub use regridder::Regridder;
pub use weights::RemapWeights;
