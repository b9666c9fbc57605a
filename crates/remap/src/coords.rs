//! Coordinate handling: attaching geodetic coordinates to a stereographic
//! dataset and unpacking an ocean-model supergrid.

use projection::PolarStereographic;
use regridder::{CellCenters, CellCorners, Grid};

use crate::error::{RemapError, Result};
use crate::field::{Field, StereoDataset};

/// Mesh two 1-D axes into co-indexed 2-D row-major arrays of shape
/// (y.len(), x.len()).
pub fn meshgrid(x: &[f64], y: &[f64]) -> (Vec<f64>, Vec<f64>) {
    let mut xx = Vec::with_capacity(x.len() * y.len());
    let mut yy = Vec::with_capacity(x.len() * y.len());
    for &py in y {
        for &px in x {
            xx.push(px);
            yy.push(py);
        }
    }
    (xx, yy)
}

/// Attach `lon`/`lat` fields to a stereographic dataset by inverse
/// projection of its planar axes.
///
/// `units` names the unit of the x/y axes and must be `"m"` or `"km"`;
/// kilometer axes are converted to meters before projecting.
pub fn add_lon_lat(
    ds: &mut StereoDataset,
    proj: &PolarStereographic,
    units: &str,
) -> Result<()> {
    let scale = match units {
        "m" => 1.0,
        "km" => 1000.0,
        other => return Err(RemapError::InvalidUnits(other.to_string())),
    };

    let (mut xx, mut yy) = meshgrid(&ds.x, &ds.y);
    if scale != 1.0 {
        for v in xx.iter_mut().chain(yy.iter_mut()) {
            *v *= scale;
        }
    }

    let (lon, lat) = proj.inverse_arrays(&xx, &yy)?;
    let (ny, nx) = ds.grid_shape();

    ds.insert(Field::new_2d("lon", lon, ny, nx)?.with_units("degrees_east"))?;
    ds.insert(Field::new_2d("lat", lat, ny, nx)?.with_units("degrees_north"))?;
    Ok(())
}

/// Promote 2-D lon/lat arrays already present in the dataset to the
/// canonical `lon`/`lat` fields, instead of recomputing them from a
/// projection.
pub fn use_included_lon_lat(ds: &mut StereoDataset, lon_name: &str, lat_name: &str) -> Result<()> {
    for (name, canonical, units) in [
        (lon_name, "lon", "degrees_east"),
        (lat_name, "lat", "degrees_north"),
    ] {
        let field = ds.fields.field(name)?;
        if field.shape.len() != 2 {
            return Err(RemapError::NotTwoDimensional {
                name: name.to_string(),
                ndim: field.shape.len(),
            });
        }
        let promoted =
            Field::new_2d(canonical, field.data.clone(), field.ny(), field.nx())?
                .with_units(units);
        ds.insert(promoted)?;
    }
    Ok(())
}

/// An ocean-model supergrid (MOM6 `ocean_hgrid.nc` convention): node
/// positions and the local x-axis rotation stored at twice the target
/// resolution, so that cell centers and cell corners live on one mesh.
///
/// For a model grid of (ny, nx) cells the supergrid mesh has shape
/// (2*ny + 1, 2*nx + 1); odd rows/columns are cell centers and even
/// rows/columns are cell corners. That parity convention is unpacked here,
/// once, into the explicitly typed center/corner views.
#[derive(Debug, Clone)]
pub struct Supergrid {
    /// Model-grid cells in x
    pub nx: usize,
    /// Model-grid cells in y
    pub ny: usize,
    /// Node longitudes (degrees east), shape (2*ny+1, 2*nx+1) row-major
    pub x: Vec<f64>,
    /// Node latitudes (degrees north), same shape
    pub y: Vec<f64>,
    /// Angle between the grid x-axis and true east (degrees), same shape
    pub angle_dx: Vec<f64>,
}

impl Supergrid {
    /// Create a supergrid from its node arrays.
    ///
    /// `snx` and `sny` are the supergrid mesh dimensions, which must be odd
    /// (2n + 1) and at least 3.
    pub fn new(snx: usize, sny: usize, x: Vec<f64>, y: Vec<f64>, angle_dx: Vec<f64>) -> Result<Self> {
        if snx < 3 || sny < 3 || snx % 2 == 0 || sny % 2 == 0 {
            return Err(RemapError::InvalidSupergrid(format!(
                "mesh dimensions must be odd and >= 3, got ({}, {})",
                sny, snx
            )));
        }
        let expected = snx * sny;
        for (name, arr) in [("x", &x), ("y", &y), ("angle_dx", &angle_dx)] {
            if arr.len() != expected {
                return Err(RemapError::InvalidSupergrid(format!(
                    "array '{}' has {} nodes, expected {}",
                    name,
                    arr.len(),
                    expected
                )));
            }
        }
        Ok(Self {
            nx: (snx - 1) / 2,
            ny: (sny - 1) / 2,
            x,
            y,
            angle_dx,
        })
    }

    /// Supergrid mesh width.
    fn snx(&self) -> usize {
        2 * self.nx + 1
    }

    fn node(&self, j: usize, i: usize) -> usize {
        j * self.snx() + i
    }

    /// Cell centers (odd supergrid parity) and the center-point rotation
    /// angle in degrees.
    pub fn centers(&self) -> Result<(CellCenters, Vec<f64>)> {
        let mut lon = Vec::with_capacity(self.nx * self.ny);
        let mut lat = Vec::with_capacity(self.nx * self.ny);
        let mut angle = Vec::with_capacity(self.nx * self.ny);
        for j in 0..self.ny {
            for i in 0..self.nx {
                let k = self.node(2 * j + 1, 2 * i + 1);
                lon.push(self.x[k]);
                lat.push(self.y[k]);
                angle.push(self.angle_dx[k]);
            }
        }
        let centers = CellCenters::new(self.nx, self.ny, lon, lat)?;
        Ok((centers, angle))
    }

    /// Cell corners (even supergrid parity).
    pub fn corners(&self) -> Result<CellCorners> {
        let mut lon = Vec::with_capacity((self.nx + 1) * (self.ny + 1));
        let mut lat = Vec::with_capacity((self.nx + 1) * (self.ny + 1));
        for j in 0..=self.ny {
            for i in 0..=self.nx {
                let k = self.node(2 * j, 2 * i);
                lon.push(self.x[k]);
                lat.push(self.y[k]);
            }
        }
        Ok(CellCorners::new(self.nx, self.ny, lon, lat)?)
    }

    /// The interpolation-ready grid: centers plus corners.
    pub fn to_grid(&self) -> Result<Grid> {
        let (centers, _) = self.centers()?;
        Ok(Grid::with_corners(centers, self.corners()?)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meshgrid_ordering() {
        let (xx, yy) = meshgrid(&[1.0, 2.0, 3.0], &[10.0, 20.0]);
        assert_eq!(xx, vec![1.0, 2.0, 3.0, 1.0, 2.0, 3.0]);
        assert_eq!(yy, vec![10.0, 10.0, 10.0, 20.0, 20.0, 20.0]);
    }

    #[test]
    fn test_add_lon_lat_in_meters() {
        let proj = PolarStereographic::antarctic();
        let mut ds = StereoDataset::new(
            vec![-100_000.0, 0.0, 100_000.0],
            vec![1_900_000.0, 2_000_000.0],
        );
        add_lon_lat(&mut ds, &proj, "m").unwrap();

        let lon = ds.fields.field("lon").unwrap();
        let lat = ds.fields.field("lat").unwrap();
        assert_eq!(lon.shape, vec![2, 3]);
        assert_eq!(lat.units.as_deref(), Some("degrees_north"));
        // southern hemisphere grid: all latitudes negative
        assert!(lat.data.iter().all(|&v| v < -60.0));
    }

    #[test]
    fn test_add_lon_lat_km_matches_meters() {
        let proj = PolarStereographic::antarctic();
        let mut ds_m = StereoDataset::new(vec![250_000.0, 500_000.0], vec![1_500_000.0, 1_750_000.0]);
        let mut ds_km = StereoDataset::new(vec![250.0, 500.0], vec![1500.0, 1750.0]);
        add_lon_lat(&mut ds_m, &proj, "m").unwrap();
        add_lon_lat(&mut ds_km, &proj, "km").unwrap();

        let lat_m = &ds_m.fields.field("lat").unwrap().data;
        let lat_km = &ds_km.fields.field("lat").unwrap().data;
        for (a, b) in lat_m.iter().zip(lat_km.iter()) {
            assert!((a - b).abs() < 1e-9);
        }
    }

    #[test]
    fn test_add_lon_lat_rejects_unknown_units() {
        let proj = PolarStereographic::antarctic();
        let mut ds = StereoDataset::new(vec![0.0], vec![0.0]);
        let err = add_lon_lat(&mut ds, &proj, "miles").unwrap_err();
        assert!(matches!(err, RemapError::InvalidUnits(_)));
    }

    #[test]
    fn test_included_lon_lat_must_be_2d() {
        let mut ds = StereoDataset::new(vec![0.0, 1.0], vec![0.0, 1.0]);
        ds.insert(
            Field::new(
                "LON",
                vec![0.0; 8],
                vec![2, 2, 2],
                vec!["time".into(), "y".into(), "x".into()],
            )
            .unwrap(),
        )
        .unwrap();
        ds.insert(Field::new_2d("LAT", vec![0.0; 4], 2, 2).unwrap())
            .unwrap();

        let err = use_included_lon_lat(&mut ds, "LON", "LAT").unwrap_err();
        assert!(matches!(err, RemapError::NotTwoDimensional { .. }));
    }

    /// Synthetic supergrid over a small lon/lat box: node (j, i) sits at
    /// half-step spacing so centers and corners interleave.
    fn synthetic_supergrid(nx: usize, ny: usize) -> Supergrid {
        let (snx, sny) = (2 * nx + 1, 2 * ny + 1);
        let mut x = Vec::with_capacity(snx * sny);
        let mut y = Vec::with_capacity(snx * sny);
        let mut angle = Vec::with_capacity(snx * sny);
        for j in 0..sny {
            for i in 0..snx {
                x.push(10.0 + 0.5 * i as f64);
                y.push(-72.0 + 0.5 * j as f64);
                angle.push(i as f64);
            }
        }
        Supergrid::new(snx, sny, x, y, angle).unwrap()
    }

    #[test]
    fn test_supergrid_parity_split() {
        let sg = synthetic_supergrid(3, 2);
        let (centers, angle) = sg.centers().unwrap();
        let corners = sg.corners().unwrap();

        assert_eq!((centers.ny, centers.nx), (2, 3));
        assert_eq!((corners.ny, corners.nx), (2, 3));

        // center (0, 0) is supergrid node (1, 1)
        assert!((centers.lon[0] - 10.5).abs() < 1e-12);
        assert!((centers.lat[0] - (-71.5)).abs() < 1e-12);
        assert!((angle[0] - 1.0).abs() < 1e-12);

        // corner (0, 0) is supergrid node (0, 0)
        assert!((corners.lon[0] - 10.0).abs() < 1e-12);
        // corner mesh is one node larger than the center mesh
        assert_eq!(corners.lon.len(), 4 * 3);
    }

    #[test]
    fn test_supergrid_rejects_even_dims() {
        let err = Supergrid::new(4, 5, vec![0.0; 20], vec![0.0; 20], vec![0.0; 20]).unwrap_err();
        assert!(matches!(err, RemapError::InvalidSupergrid(_)));
    }

    #[test]
    fn test_supergrid_rejects_short_arrays() {
        let err = Supergrid::new(5, 5, vec![0.0; 20], vec![0.0; 25], vec![0.0; 25]).unwrap_err();
        assert!(matches!(err, RemapError::InvalidSupergrid(_)));
    }
}
