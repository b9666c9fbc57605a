//! Remapping orchestration: stereographic source fields onto the ocean
//! model grid.
//!
//! The scalar and vector paths are deliberately different contracts. A
//! scalar is regridded as-is: unmapped ocean cells stay NaN for the caller
//! to handle. Vector components are rotated through the geographic basis
//! around the regridding, and the result is gap-filled so every ocean cell
//! carries a finite value.

use projection::PolarStereographic;
use regridder::{CellCenters, Grid, Method, Regridder};

use crate::coords::{add_lon_lat, use_included_lon_lat, Supergrid};
use crate::error::Result;
use crate::extrap::{fill_field, FillConfig, FillStats};
use crate::field::{Dataset, Field, StereoDataset};
use crate::rotate::{angle_to_east_axes, rotate_east_to_model, rotate_winds};

/// Where the source grid's geodetic coordinates come from.
pub enum SourceCoordinates<'a> {
    /// Inverse-project the 1-D planar axes; `units` is "m" or "km".
    Projected {
        projection: &'a PolarStereographic,
        units: &'a str,
    },
    /// Use 2-D lon/lat fields already present in the dataset.
    Included { lon: &'a str, lat: &'a str },
}

/// Remaps fields from one stereographic source grid onto one destination
/// supergrid.
///
/// Building the regridding weights is the expensive step, so construct the
/// remapper once per (source grid, destination grid, method) triple and
/// reuse it for every field.
pub struct FieldRemapper {
    regridder: Regridder,
    /// Destination rotation angle (degrees) at cell centers
    dest_angle_deg: Vec<f64>,
    /// Source rotation angle (radians) from the planar axes
    source_angle: Vec<f64>,
    dest_ny: usize,
    dest_nx: usize,
}

impl FieldRemapper {
    /// Build the destination views and regridding weights.
    ///
    /// The dataset must already carry `lon`/`lat` fields (see
    /// [`add_lon_lat`] and [`use_included_lon_lat`]).
    pub fn new(ds: &StereoDataset, dest: &Supergrid, method: Method) -> Result<Self> {
        let lon = ds.fields.field("lon")?;
        let lat = ds.fields.field("lat")?;
        let (ny, nx) = ds.grid_shape();

        let centers = CellCenters::new(nx, ny, lon.data.clone(), lat.data.clone())?;
        let source = Grid::from_centers(centers);

        let dest_grid = dest.to_grid()?;
        let (_, dest_angle_deg) = dest.centers()?;

        let regridder = Regridder::new(&source, &dest_grid, method)?;

        Ok(Self {
            regridder,
            dest_angle_deg,
            source_angle: angle_to_east_axes(&ds.x, &ds.y),
            dest_ny: dest.ny,
            dest_nx: dest.nx,
        })
    }

    /// Destination grid shape as (ny, nx).
    pub fn dest_shape(&self) -> (usize, usize) {
        (self.dest_ny, self.dest_nx)
    }

    /// Regrid each trailing 2-D plane of raw source samples.
    fn regrid_planes(&self, data: &[f64], plane_len: usize) -> Result<Vec<f64>> {
        let mut out = Vec::with_capacity(data.len() / plane_len * self.dest_ny * self.dest_nx);
        for plane in data.chunks_exact(plane_len) {
            out.extend(self.regridder.apply(plane)?);
        }
        Ok(out)
    }

    /// Dimension labels and sizes for a destination field with the same
    /// batch dimensions as `source`.
    fn dest_layout(&self, source: &Field) -> (Vec<usize>, Vec<String>) {
        let nbatch = source.shape.len() - 2;
        let mut shape: Vec<usize> = source.shape[..nbatch].to_vec();
        shape.push(self.dest_ny);
        shape.push(self.dest_nx);
        let mut dims: Vec<String> = source.dims[..nbatch].to_vec();
        dims.push("yh".to_string());
        dims.push("xh".to_string());
        (shape, dims)
    }

    /// Remap a scalar field onto the destination cell centers.
    ///
    /// No rotation and no gap-filling is applied; destination cells the
    /// source cannot reach stay NaN.
    pub fn remap_scalar(&self, ds: &StereoDataset, name: &str) -> Result<Field> {
        let field = ds.fields.field(name)?;
        let data = self.regrid_planes(&field.data, field.plane_len())?;

        let (shape, dims) = self.dest_layout(field);
        let mut out = Field::new(name, data, shape, dims)?;
        out.units = field.units.clone();

        tracing::debug!(
            field = name,
            method = self.regridder.method().name(),
            unmapped = self.regridder.unmapped_count(),
            "remapped scalar field"
        );
        Ok(out)
    }

    /// Remap a vector field onto the destination grid's local basis.
    ///
    /// The components are rotated to geographic east/north using the angle
    /// of the source's planar axes, regridded independently, rotated into
    /// the destination basis using `angle_dx`, and gap-filled with the
    /// sentinel substituted for unmapped cells.
    pub fn remap_vector(
        &self,
        ds: &StereoDataset,
        u_name: &str,
        v_name: &str,
        fill: &FillConfig,
    ) -> Result<(Field, Field)> {
        let u = ds.fields.field(u_name)?;
        let v = ds.fields.field(v_name)?;
        u.check_same_shape(v)?;

        // to the geographic basis, still on the source grid
        let (u_east, v_north) = rotate_winds(&u.data, &v.data, &self.source_angle)?;

        // each geographic component regrids independently
        let u_regr = self.regrid_planes(&u_east, u.plane_len())?;
        let v_regr = self.regrid_planes(&v_north, v.plane_len())?;

        // into the destination grid's local basis
        let (mut u_model, mut v_model) =
            rotate_east_to_model(&u_regr, &v_regr, &self.dest_angle_deg)?;

        // unmapped cells become the sentinel the gap filler solves for
        for w in u_model.iter_mut().chain(v_model.iter_mut()) {
            if w.is_nan() {
                *w = fill.missing;
            }
        }

        let (shape, dims) = self.dest_layout(u);
        let u_field = Field::new(u_name, u_model, shape.clone(), dims.clone())?;
        let v_field = Field::new(v_name, v_model, shape, dims)?;

        let (mut u_filled, u_stats) = fill_field(&u_field, fill);
        let (mut v_filled, v_stats) = fill_field(&v_field, fill);
        u_filled.units = u.units.clone();
        v_filled.units = v.units.clone();

        log_fill(u_name, &u_stats);
        log_fill(v_name, &v_stats);

        Ok((u_filled, v_filled))
    }
}

fn log_fill(name: &str, stats: &[FillStats]) {
    let max_iterations = stats.iter().map(|s| s.iterations).max().unwrap_or(0);
    let max_residual = stats.iter().map(|s| s.max_residual).fold(0.0, f64::max);
    tracing::debug!(
        field = name,
        planes = stats.len(),
        max_iterations,
        max_residual,
        "gap-filled vector component"
    );
}

/// Remap one scalar field from a stereographic dataset onto a model
/// supergrid.
///
/// Attaches `lon`/`lat` to the dataset according to `coords`, builds the
/// regridding weights and regrids the named field. For repeated fields on
/// the same grid pair, build a [`FieldRemapper`] once instead.
pub fn remap_scalar_field(
    ds: &mut StereoDataset,
    dest: &Supergrid,
    name: &str,
    coords: SourceCoordinates<'_>,
    method: Method,
) -> Result<Dataset> {
    match coords {
        SourceCoordinates::Projected { projection, units } => add_lon_lat(ds, projection, units)?,
        SourceCoordinates::Included { lon, lat } => use_included_lon_lat(ds, lon, lat)?,
    }

    let remapper = FieldRemapper::new(ds, dest, method)?;
    let mut out = Dataset::new();
    out.insert(remapper.remap_scalar(ds, name)?);
    Ok(out)
}

/// Remap one vector field from a stereographic dataset onto a model
/// supergrid, rotating through the geographic basis and gap-filling the
/// result.
pub fn remap_vector_field(
    ds: &mut StereoDataset,
    dest: &Supergrid,
    u_name: &str,
    v_name: &str,
    projection: &PolarStereographic,
    units: &str,
    method: Method,
    fill: &FillConfig,
) -> Result<Dataset> {
    add_lon_lat(ds, projection, units)?;

    let remapper = FieldRemapper::new(ds, dest, method)?;
    let (u, v) = remapper.remap_vector(ds, u_name, v_name, fill)?;

    let mut out = Dataset::new();
    out.insert(u);
    out.insert(v);
    Ok(out)
}
