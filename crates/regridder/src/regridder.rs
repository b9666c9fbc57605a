//! Weight computation and the cached regridder.

use nalgebra::{Matrix3, Vector3};
use rayon::prelude::*;

use crate::error::{RegridError, Result};
use crate::grid::{CellCorners, Grid};
use crate::method::Method;
use crate::search::{
    locate_cell_in_corners, locate_in_centers, nearest_center, spherical_quad_area, unit_vector,
    TangentPlane,
};
use crate::weights::RemapWeights;

/// Half-width of the neighborhood used by the patch method.
const PATCH_RADIUS: i64 = 2;

/// Regrids fields from one curvilinear grid to another.
///
/// Weight computation is the expensive part of regridding; the weights are
/// computed once per (source grid, destination grid, method) triple at
/// construction and reused by every `apply` call.
pub struct Regridder {
    method: Method,
    weights: RemapWeights,
    dest_nx: usize,
    dest_ny: usize,
}

impl Regridder {
    /// Compute regridding weights from `source` to `dest`.
    pub fn new(source: &Grid, dest: &Grid, method: Method) -> Result<Self> {
        let dest_centers = &dest.centers;

        tracing::debug!(
            method = method.name(),
            source_cells = source.centers.len(),
            dest_cells = dest_centers.len(),
            "computing regridding weights"
        );

        let entries = match method {
            Method::Nearest => Self::nearest_entries(source, dest),
            Method::Bilinear => Self::bilinear_entries(source, dest),
            Method::Patch => Self::patch_entries(source, dest),
            Method::Conservative => Self::conservative_entries(source, dest)?,
        };

        let weights = RemapWeights::new(
            source.centers.len(),
            dest_centers.len(),
            entries,
            method == Method::Conservative,
        );

        let unmapped = weights.unmapped_count();
        if unmapped > 0 {
            tracing::warn!(
                unmapped,
                dest_cells = dest_centers.len(),
                "destination cells outside the source grid will be NaN"
            );
        }

        Ok(Self {
            method,
            weights,
            dest_nx: dest_centers.nx,
            dest_ny: dest_centers.ny,
        })
    }

    /// The method the weights were built with.
    pub fn method(&self) -> Method {
        self.method
    }

    /// Destination grid shape as (ny, nx).
    pub fn dest_shape(&self) -> (usize, usize) {
        (self.dest_ny, self.dest_nx)
    }

    /// Number of destination cells with no source contribution.
    pub fn unmapped_count(&self) -> usize {
        self.weights.unmapped_count()
    }

    /// Resample a field from the source cell centers onto the destination
    /// cell centers. Unmapped destination cells are NaN.
    pub fn apply(&self, field: &[f64]) -> Result<Vec<f64>> {
        self.weights.apply(field)
    }

    fn nearest_entries(source: &Grid, dest: &Grid) -> Vec<Vec<(u32, f64)>> {
        let centers = &source.centers;
        let periodic = source.periodic;

        (0..dest.centers.len())
            .into_par_iter()
            .map(|k| {
                let p = unit_vector(dest.centers.lon[k], dest.centers.lat[k]);
                let (j, i) = nearest_center(centers, periodic, p);
                vec![(centers.index(j, i) as u32, 1.0)]
            })
            .collect()
    }

    fn bilinear_entries(source: &Grid, dest: &Grid) -> Vec<Vec<(u32, f64)>> {
        let centers = &source.centers;
        let periodic = source.periodic;

        (0..dest.centers.len())
            .into_par_iter()
            .map(|k| {
                let p = unit_vector(dest.centers.lon[k], dest.centers.lat[k]);
                match locate_in_centers(centers, periodic, p) {
                    Some(loc) => loc
                        .indices
                        .iter()
                        .zip(loc.weights.iter())
                        .map(|(&idx, &w)| (idx as u32, w))
                        .collect(),
                    None => Vec::new(),
                }
            })
            .collect()
    }

    /// Local least-squares plane recovery over the neighborhood of the
    /// nearest source center. Reproduces constants and linear fields
    /// exactly; destination cells outside the source mesh stay unmapped.
    fn patch_entries(source: &Grid, dest: &Grid) -> Vec<Vec<(u32, f64)>> {
        let centers = &source.centers;
        let periodic = source.periodic;
        let (nx, ny) = (centers.nx, centers.ny);

        (0..dest.centers.len())
            .into_par_iter()
            .map(|k| {
                let p = unit_vector(dest.centers.lon[k], dest.centers.lat[k]);

                // same hull test as bilinear
                if locate_in_centers(centers, periodic, p).is_none() {
                    return Vec::new();
                }

                let (nj, ni) = nearest_center(centers, periodic, p);
                let plane = TangentPlane::at(p);

                // gather the neighborhood on the tangent plane
                let mut pts: Vec<(usize, f64, f64)> = Vec::new();
                for dj in -PATCH_RADIUS..=PATCH_RADIUS {
                    let j = nj as i64 + dj;
                    if j < 0 || j >= ny as i64 {
                        continue;
                    }
                    for di in -PATCH_RADIUS..=PATCH_RADIUS {
                        let i = if periodic {
                            (ni as i64 + di).rem_euclid(nx as i64)
                        } else {
                            let i = ni as i64 + di;
                            if i < 0 || i >= nx as i64 {
                                continue;
                            }
                            i
                        };
                        let idx = centers.index(j as usize, i as usize);
                        let (u, v) =
                            plane.project(unit_vector(centers.lon[idx], centers.lat[idx]));
                        pts.push((idx, u, v));
                    }
                }

                // Gaussian distance weighting scaled by the neighborhood size
                let h2 = pts.iter().map(|&(_, u, v)| u * u + v * v).sum::<f64>()
                    / pts.len() as f64;
                let h2 = h2.max(1e-30);

                let mut m = Matrix3::zeros();
                for &(_, u, v) in &pts {
                    let w = (-(u * u + v * v) / h2).exp();
                    let x = Vector3::new(1.0, u, v);
                    m += w * x * x.transpose();
                }

                match m.try_inverse() {
                    Some(minv) => {
                        let row = minv.row(0);
                        pts.iter()
                            .map(|&(idx, u, v)| {
                                let w = (-(u * u + v * v) / h2).exp();
                                let weight = w * (row[0] + row[1] * u + row[2] * v);
                                (idx as u32, weight)
                            })
                            .collect()
                    }
                    // degenerate neighborhood geometry: keep the nearest value
                    None => vec![(centers.index(nj, ni) as u32, 1.0)],
                }
            })
            .collect()
    }

    /// First-order conservative binning: every source cell deposits its
    /// spherical area into the destination cell containing its center, and
    /// each destination cell averages its deposits by area.
    fn conservative_entries(source: &Grid, dest: &Grid) -> Result<Vec<Vec<(u32, f64)>>> {
        let src_corners = source
            .corners
            .as_ref()
            .ok_or(RegridError::CornersRequired("source"))?;
        let dest_corners = dest
            .corners
            .as_ref()
            .ok_or(RegridError::CornersRequired("destination"))?;

        let src_centers = &source.centers;
        let mut entries: Vec<Vec<(u32, f64)>> = vec![Vec::new(); dest.centers.len()];

        for j in 0..src_centers.ny {
            for i in 0..src_centers.nx {
                let k = src_centers.index(j, i);
                let p = unit_vector(src_centers.lon[k], src_centers.lat[k]);

                let seed = nearest_center(&dest.centers, dest.periodic, p);
                let Some((dj, di)) = locate_cell_in_corners(dest_corners, seed, p) else {
                    continue;
                };

                let area = cell_area(src_corners, j, i);
                entries[dest.centers.index(dj, di)].push((k as u32, area));
            }
        }

        // normalize deposits per destination cell
        for entry in &mut entries {
            let total: f64 = entry.iter().map(|&(_, w)| w).sum();
            if total > 0.0 {
                for e in entry.iter_mut() {
                    e.1 /= total;
                }
            }
        }

        Ok(entries)
    }
}

/// Spherical area of cell (j, i) from its corner quad.
fn cell_area(corners: &CellCorners, j: usize, i: usize) -> f64 {
    let sw = corners.index(j, i);
    let se = corners.index(j, i + 1);
    let nw = corners.index(j + 1, i);
    let ne = corners.index(j + 1, i + 1);
    spherical_quad_area(
        unit_vector(corners.lon[sw], corners.lat[sw]),
        unit_vector(corners.lon[se], corners.lat[se]),
        unit_vector(corners.lon[ne], corners.lat[ne]),
        unit_vector(corners.lon[nw], corners.lat[nw]),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{CellCenters, CellCorners};

    /// Regular lon/lat mesh of cell centers.
    fn centers(nx: usize, ny: usize, lon0: f64, lat0: f64, step: f64) -> CellCenters {
        let mut lon = Vec::with_capacity(nx * ny);
        let mut lat = Vec::with_capacity(nx * ny);
        for j in 0..ny {
            for i in 0..nx {
                lon.push(lon0 + i as f64 * step);
                lat.push(lat0 + j as f64 * step);
            }
        }
        CellCenters::new(nx, ny, lon, lat).unwrap()
    }

    /// Corner mesh matching `centers` (offset by half a step).
    fn corners(nx: usize, ny: usize, lon0: f64, lat0: f64, step: f64) -> CellCorners {
        let mut lon = Vec::with_capacity((nx + 1) * (ny + 1));
        let mut lat = Vec::with_capacity((nx + 1) * (ny + 1));
        for j in 0..=ny {
            for i in 0..=nx {
                lon.push(lon0 - step / 2.0 + i as f64 * step);
                lat.push(lat0 - step / 2.0 + j as f64 * step);
            }
        }
        CellCorners::new(nx, ny, lon, lat).unwrap()
    }

    fn linear_field(c: &CellCenters) -> Vec<f64> {
        c.lon
            .iter()
            .zip(c.lat.iter())
            .map(|(&lo, &la)| 2.0 * lo + 3.0 * la)
            .collect()
    }

    #[test]
    fn test_bilinear_reproduces_constant() {
        let src = Grid::from_centers(centers(12, 12, 0.0, 20.0, 1.0));
        let dst = Grid::from_centers(centers(8, 8, 2.1, 22.3, 0.9));
        let r = Regridder::new(&src, &dst, Method::Bilinear).unwrap();

        let field = vec![4.25; src.centers.len()];
        let out = r.apply(&field).unwrap();
        for (k, v) in out.iter().enumerate() {
            assert!(
                (v - 4.25).abs() < 1e-9,
                "constant not preserved at dest cell {}: {}",
                k,
                v
            );
        }
    }

    #[test]
    fn test_bilinear_nan_outside_hull() {
        let src = Grid::from_centers(centers(6, 6, 0.0, 20.0, 1.0));
        // destination extends far east of the source mesh
        let dst = Grid::from_centers(centers(8, 4, 3.0, 21.0, 2.0));
        let r = Regridder::new(&src, &dst, Method::Bilinear).unwrap();

        assert!(r.unmapped_count() > 0, "expected unmapped cells");
        let out = r.apply(&vec![1.0; src.centers.len()]).unwrap();
        assert!(out.iter().any(|v| v.is_nan()));
        assert!(out.iter().any(|v| !v.is_nan()));
    }

    #[test]
    fn test_nearest_maps_everything() {
        let src = Grid::from_centers(centers(6, 6, 0.0, 20.0, 1.0));
        let dst = Grid::from_centers(centers(8, 4, -10.0, 10.0, 4.0));
        let r = Regridder::new(&src, &dst, Method::Nearest).unwrap();

        assert_eq!(r.unmapped_count(), 0);
        let out = r.apply(&linear_field(&src.centers)).unwrap();
        assert!(out.iter().all(|v| !v.is_nan()));
    }

    #[test]
    fn test_patch_reproduces_linear_field() {
        let src = Grid::from_centers(centers(14, 14, 0.0, 30.0, 0.5));
        let dst = Grid::from_centers(centers(5, 5, 1.7, 31.6, 0.5));
        let r = Regridder::new(&src, &dst, Method::Patch).unwrap();

        let out = r.apply(&linear_field(&src.centers)).unwrap();
        for (k, v) in out.iter().enumerate() {
            let expect = 2.0 * dst.centers.lon[k] + 3.0 * dst.centers.lat[k];
            // plane recovery on the tangent plane is linear to first order
            assert!(
                (v - expect).abs() < 0.05,
                "patch value at {} should be ~{}, got {}",
                k,
                expect,
                v
            );
        }
    }

    #[test]
    fn test_conservative_requires_corners() {
        let src = Grid::from_centers(centers(6, 6, 0.0, 20.0, 1.0));
        let dst = Grid::from_centers(centers(4, 4, 1.0, 21.0, 1.0));
        let err = Regridder::new(&src, &dst, Method::Conservative).unwrap_err();
        assert!(matches!(err, RegridError::CornersRequired(_)));
    }

    #[test]
    fn test_conservative_preserves_constant() {
        let src = Grid::with_corners(
            centers(12, 12, 0.0, 20.0, 0.5),
            corners(12, 12, 0.0, 20.0, 0.5),
        )
        .unwrap();
        let dst = Grid::with_corners(
            centers(4, 4, 0.8, 20.8, 1.0),
            corners(4, 4, 0.8, 20.8, 1.0),
        )
        .unwrap();
        let r = Regridder::new(&src, &dst, Method::Conservative).unwrap();

        let out = r.apply(&vec![7.5; src.centers.len()]).unwrap();
        for v in out.iter().filter(|v| !v.is_nan()) {
            assert!((v - 7.5).abs() < 1e-9);
        }
        // the destination sits inside a finer source grid, so every cell
        // should have received deposits
        assert_eq!(r.unmapped_count(), 0);
    }

    #[test]
    fn test_weights_are_reused_deterministically() {
        let src = Grid::from_centers(centers(10, 10, 0.0, 20.0, 1.0));
        let dst = Grid::from_centers(centers(6, 6, 1.1, 21.1, 1.0));
        let r = Regridder::new(&src, &dst, Method::Bilinear).unwrap();

        let field = linear_field(&src.centers);
        let a = r.apply(&field).unwrap();
        let b = r.apply(&field).unwrap();
        assert_eq!(a, b);
    }
}
