//! Point location on curvilinear grids.
//!
//! All geometry is done with unit vectors on the sphere, so longitude
//! wrapping and pole proximity need no special-casing. For interpolation the
//! neighborhood of a destination point is projected onto the local tangent
//! plane, where the usual planar formulas apply.

use crate::grid::{CellCenters, CellCorners};

/// Unit vector on the sphere for a lon/lat position in degrees.
#[inline]
pub(crate) fn unit_vector(lon_deg: f64, lat_deg: f64) -> [f64; 3] {
    let lon = lon_deg.to_radians();
    let lat = lat_deg.to_radians();
    let (sin_lon, cos_lon) = lon.sin_cos();
    let (sin_lat, cos_lat) = lat.sin_cos();
    [cos_lat * cos_lon, cos_lat * sin_lon, sin_lat]
}

/// Squared chord distance between two unit vectors. Monotonic in the
/// great-circle distance, cheaper to compare.
#[inline]
pub(crate) fn chord_dist2(p: [f64; 3], q: [f64; 3]) -> f64 {
    let dx = p[0] - q[0];
    let dy = p[1] - q[1];
    let dz = p[2] - q[2];
    dx * dx + dy * dy + dz * dz
}

#[inline]
fn cross(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

#[inline]
fn dot(a: [f64; 3], b: [f64; 3]) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

/// Local tangent plane at a point on the sphere, spanned by the unit east
/// and north directions.
pub(crate) struct TangentPlane {
    east: [f64; 3],
    north: [f64; 3],
}

impl TangentPlane {
    /// Tangent plane at the given unit vector.
    pub(crate) fn at(p: [f64; 3]) -> Self {
        // east = z-hat x p, degenerate at the poles where any direction works
        let mut east = [-p[1], p[0], 0.0];
        let norm = (east[0] * east[0] + east[1] * east[1]).sqrt();
        if norm < 1e-12 {
            east = [1.0, 0.0, 0.0];
        } else {
            east[0] /= norm;
            east[1] /= norm;
        }
        let north = cross(p, east);
        Self { east, north }
    }

    /// Planar coordinates of a unit vector on this tangent plane.
    #[inline]
    pub(crate) fn project(&self, q: [f64; 3]) -> (f64, f64) {
        (dot(q, self.east), dot(q, self.north))
    }
}

/// Find the source center nearest to `p` on a logically rectangular mesh.
///
/// Seeds with a coarse subsample of the mesh, then walks greedily through
/// the 8-neighborhood until the chord distance stops decreasing. The walk
/// wraps in i when the grid is periodic.
pub(crate) fn nearest_center(centers: &CellCenters, periodic: bool, p: [f64; 3]) -> (usize, usize) {
    let (nx, ny) = (centers.nx, centers.ny);

    // coarse seed
    let stride_j = (ny / 32).max(1);
    let stride_i = (nx / 32).max(1);
    let mut best = (0usize, 0usize);
    let mut best_d = f64::INFINITY;
    let mut j = 0;
    while j < ny {
        let mut i = 0;
        while i < nx {
            let k = centers.index(j, i);
            let d = chord_dist2(p, unit_vector(centers.lon[k], centers.lat[k]));
            if d < best_d {
                best_d = d;
                best = (j, i);
            }
            i += stride_i;
        }
        j += stride_j;
    }

    // greedy descent
    loop {
        let (bj, bi) = best;
        let mut improved = false;
        for dj in -1i64..=1 {
            for di in -1i64..=1 {
                if dj == 0 && di == 0 {
                    continue;
                }
                let nj = bj as i64 + dj;
                if nj < 0 || nj >= ny as i64 {
                    continue;
                }
                let ni = if periodic {
                    (bi as i64 + di).rem_euclid(nx as i64)
                } else {
                    let ni = bi as i64 + di;
                    if ni < 0 || ni >= nx as i64 {
                        continue;
                    }
                    ni
                };
                let k = centers.index(nj as usize, ni as usize);
                let d = chord_dist2(p, unit_vector(centers.lon[k], centers.lat[k]));
                if d < best_d {
                    best_d = d;
                    best = (nj as usize, ni as usize);
                    improved = true;
                }
            }
        }
        if !improved {
            return best;
        }
    }
}

/// Invert the bilinear map of a planar quad for the origin.
///
/// The quad is given as (p00, p10, p01, p11) on the tangent plane centered
/// at the query point, so the target is (0, 0). Returns the fractional
/// coordinates (s, t) in [0, 1] when the origin lies inside the quad.
pub(crate) fn invert_bilinear(quad: [(f64, f64); 4]) -> Option<(f64, f64)> {
    let [(x00, y00), (x10, y10), (x01, y01), (x11, y11)] = quad;

    // scale for the convergence test
    let diam2 = (x11 - x00) * (x11 - x00) + (y11 - y00) * (y11 - y00);
    let tol2 = (diam2.max(1e-30)) * 1e-20;

    let mut s = 0.5;
    let mut t = 0.5;
    for _ in 0..25 {
        let fx = (1.0 - s) * (1.0 - t) * x00 + s * (1.0 - t) * x10 + (1.0 - s) * t * x01
            + s * t * x11;
        let fy = (1.0 - s) * (1.0 - t) * y00 + s * (1.0 - t) * y10 + (1.0 - s) * t * y01
            + s * t * y11;

        if fx * fx + fy * fy < tol2 {
            const EDGE: f64 = 1e-6;
            if (-EDGE..=1.0 + EDGE).contains(&s) && (-EDGE..=1.0 + EDGE).contains(&t) {
                return Some((s.clamp(0.0, 1.0), t.clamp(0.0, 1.0)));
            }
            return None;
        }

        let dxs = (1.0 - t) * (x10 - x00) + t * (x11 - x01);
        let dys = (1.0 - t) * (y10 - y00) + t * (y11 - y01);
        let dxt = (1.0 - s) * (x01 - x00) + s * (x11 - x10);
        let dyt = (1.0 - s) * (y01 - y00) + s * (y11 - y10);

        let det = dxs * dyt - dxt * dys;
        if det.abs() < 1e-30 {
            return None;
        }
        s -= (fx * dyt - fy * dxt) / det;
        t -= (fy * dxs - fx * dys) / det;

        // diverging iterations are not going to come back
        if !s.is_finite() || !t.is_finite() || s.abs() > 10.0 || t.abs() > 10.0 {
            return None;
        }
    }
    None
}

/// A located quad: four flat source indices and their bilinear weights.
pub(crate) struct QuadLocation {
    pub indices: [usize; 4],
    pub weights: [f64; 4],
}

/// Locate the center-mesh quad containing `p` and compute bilinear weights.
///
/// Candidate quads are anchored in a small window around the nearest center;
/// returns `None` when `p` falls outside the mesh (an unmapped destination
/// cell).
pub(crate) fn locate_in_centers(
    centers: &CellCenters,
    periodic: bool,
    p: [f64; 3],
) -> Option<QuadLocation> {
    let (nj, ni) = nearest_center(centers, periodic, p);
    let plane = TangentPlane::at(p);
    let (nx, ny) = (centers.nx, centers.ny);

    let project = |j: usize, i: usize| -> (f64, f64) {
        let k = centers.index(j, i);
        plane.project(unit_vector(centers.lon[k], centers.lat[k]))
    };

    for dj in -2i64..=1 {
        let j0 = nj as i64 + dj;
        if j0 < 0 || j0 + 1 >= ny as i64 {
            continue;
        }
        let j0 = j0 as usize;
        for di in -2i64..=1 {
            let (i0, i1) = if periodic {
                let i0 = (ni as i64 + di).rem_euclid(nx as i64) as usize;
                (i0, (i0 + 1) % nx)
            } else {
                let i0 = ni as i64 + di;
                if i0 < 0 || i0 + 1 >= nx as i64 {
                    continue;
                }
                (i0 as usize, i0 as usize + 1)
            };

            let quad = [
                project(j0, i0),
                project(j0, i1),
                project(j0 + 1, i0),
                project(j0 + 1, i1),
            ];
            if let Some((s, t)) = invert_bilinear(quad) {
                return Some(QuadLocation {
                    indices: [
                        centers.index(j0, i0),
                        centers.index(j0, i1),
                        centers.index(j0 + 1, i0),
                        centers.index(j0 + 1, i1),
                    ],
                    weights: [
                        (1.0 - s) * (1.0 - t),
                        s * (1.0 - t),
                        (1.0 - s) * t,
                        s * t,
                    ],
                });
            }
        }
    }
    None
}

/// Locate the cell whose corner quad contains `p`, searching a window of
/// cells around the seed cell (j, i). Used by conservative binning.
pub(crate) fn locate_cell_in_corners(
    corners: &CellCorners,
    seed: (usize, usize),
    p: [f64; 3],
) -> Option<(usize, usize)> {
    let plane = TangentPlane::at(p);
    let (nx, ny) = (corners.nx, corners.ny);

    let project = |j: usize, i: usize| -> (f64, f64) {
        let k = corners.index(j, i);
        plane.project(unit_vector(corners.lon[k], corners.lat[k]))
    };

    for dj in -2i64..=2 {
        let j = seed.0 as i64 + dj;
        if j < 0 || j >= ny as i64 {
            continue;
        }
        let j = j as usize;
        for di in -2i64..=2 {
            let i = seed.1 as i64 + di;
            if i < 0 || i >= nx as i64 {
                continue;
            }
            let i = i as usize;

            let quad = [
                project(j, i),
                project(j, i + 1),
                project(j + 1, i),
                project(j + 1, i + 1),
            ];
            if invert_bilinear(quad).is_some() {
                return Some((j, i));
            }
        }
    }
    None
}

/// Area of the spherical triangle (a, b, c) via the Van Oosterom-Strackee
/// solid-angle formula. Unit-sphere areas are only ever used as relative
/// weights, so no radius scaling is applied.
fn spherical_triangle_area(a: [f64; 3], b: [f64; 3], c: [f64; 3]) -> f64 {
    let triple = dot(a, cross(b, c));
    let denom = 1.0 + dot(a, b) + dot(b, c) + dot(a, c);
    2.0 * f64::atan2(triple.abs(), denom)
}

/// Area of the spherical quad (a, b, c, d) given in winding order.
pub(crate) fn spherical_quad_area(a: [f64; 3], b: [f64; 3], c: [f64; 3], d: [f64; 3]) -> f64 {
    spherical_triangle_area(a, b, c) + spherical_triangle_area(a, c, d)
}
