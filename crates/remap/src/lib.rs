//! Remap polar stereographic forcing fields onto an ocean model grid.
//!
//! Atmospheric and ice-sheet surface fields are commonly distributed on a
//! polar stereographic projection, while ocean models run on curvilinear
//! grids. This crate moves scalar and vector fields between the two,
//! handling the three problems that come with the transform:
//!
//! - **Coordinates**: geodetic lon/lat are attached to the stereographic
//!   grid by inverse projection, and the model supergrid is unpacked into
//!   cell-center and cell-corner views ([`coords`]).
//! - **Vector rotation**: vector components are rotated between each grid's
//!   local basis and geographic east/north ([`rotate`]).
//! - **Gap filling**: model cells the source grid cannot reach are filled
//!   by diffusive extrapolation ([`extrap`]).
//!
//! # Pipeline
//!
//! ```text
//! stereographic dataset (x, y axes + fields)
//!      │
//!      ├─► add_lon_lat            (inverse projection)
//!      ├─► rotate_stereo_to_east  (vectors only)
//!      ├─► Regridder::apply       (per component, NaN where unmapped)
//!      ├─► rotate_east_to_model   (vectors only, angle_dx)
//!      └─► fill_field             (vectors only, sentinel-driven)
//!      │
//!      ▼
//! dataset on the model grid's cell centers
//! ```
//!
//! Scalars regrid without rotation or gap filling; handling unmapped ocean
//! cells is the caller's decision there.

pub mod coords;
pub mod error;
pub mod extrap;
pub mod field;
pub mod remapper;
pub mod rotate;

pub use coords::{add_lon_lat, meshgrid, use_included_lon_lat, Supergrid};
pub use error::{RemapError, Result};
pub use extrap::{fill_field, fill_grid, FillConfig, FillStats};
pub use field::{Dataset, Field, StereoDataset};
pub use remapper::{remap_scalar_field, remap_vector_field, FieldRemapper, SourceCoordinates};
pub use rotate::{
    angle_to_east_axes, angle_to_east_mesh, rotate_east_to_model, rotate_east_to_stereo,
    rotate_model_to_east, rotate_stereo_to_east, rotate_winds,
};

// the collaborator types callers need to drive the pipeline
pub use projection::PolarStereographic;
pub use regridder::Method;
