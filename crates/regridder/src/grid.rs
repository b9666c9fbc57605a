//! Curvilinear grid descriptions.
//!
//! A curvilinear grid is logically rectangular: cell centers form a (ny, nx)
//! mesh and cell corners a (ny+1, nx+1) mesh, both stored row-major with
//! geodetic longitude/latitude per node. Centers and corners are distinct
//! types so the two meshes cannot be mixed up by index arithmetic.

use crate::error::{RegridError, Result};

/// Cell-center coordinates of a curvilinear grid, shape (ny, nx) row-major.
#[derive(Debug, Clone)]
pub struct CellCenters {
    /// Number of cells in the x (column) direction
    pub nx: usize,
    /// Number of cells in the y (row) direction
    pub ny: usize,
    /// Longitudes in degrees east, length ny * nx
    pub lon: Vec<f64>,
    /// Latitudes in degrees north, length ny * nx
    pub lat: Vec<f64>,
}

impl CellCenters {
    /// Create cell centers, validating array lengths.
    pub fn new(nx: usize, ny: usize, lon: Vec<f64>, lat: Vec<f64>) -> Result<Self> {
        if nx < 2 || ny < 2 {
            return Err(RegridError::GridTooSmall { ny, nx });
        }
        let expected = nx * ny;
        if lon.len() != expected {
            return Err(RegridError::ShapeMismatch {
                name: "center lon",
                expected,
                got: lon.len(),
            });
        }
        if lat.len() != expected {
            return Err(RegridError::ShapeMismatch {
                name: "center lat",
                expected,
                got: lat.len(),
            });
        }
        Ok(Self { nx, ny, lon, lat })
    }

    /// Total number of cells.
    pub fn len(&self) -> usize {
        self.nx * self.ny
    }

    /// Check if the grid is empty.
    pub fn is_empty(&self) -> bool {
        self.nx == 0 || self.ny == 0
    }

    /// Flat index of cell (j, i).
    #[inline]
    pub fn index(&self, j: usize, i: usize) -> usize {
        j * self.nx + i
    }
}

/// Cell-corner coordinates of a curvilinear grid, shape (ny+1, nx+1)
/// row-major. Corner (j, i) is the southwest corner of cell (j, i).
#[derive(Debug, Clone)]
pub struct CellCorners {
    /// Number of cells (not corner nodes) in the x direction
    pub nx: usize,
    /// Number of cells in the y direction
    pub ny: usize,
    /// Longitudes in degrees east, length (ny + 1) * (nx + 1)
    pub lon: Vec<f64>,
    /// Latitudes in degrees north, length (ny + 1) * (nx + 1)
    pub lat: Vec<f64>,
}

impl CellCorners {
    /// Create cell corners for a grid of (ny, nx) cells.
    pub fn new(nx: usize, ny: usize, lon: Vec<f64>, lat: Vec<f64>) -> Result<Self> {
        if nx < 1 || ny < 1 {
            return Err(RegridError::GridTooSmall { ny, nx });
        }
        let expected = (nx + 1) * (ny + 1);
        if lon.len() != expected {
            return Err(RegridError::ShapeMismatch {
                name: "corner lon",
                expected,
                got: lon.len(),
            });
        }
        if lat.len() != expected {
            return Err(RegridError::ShapeMismatch {
                name: "corner lat",
                expected,
                got: lat.len(),
            });
        }
        Ok(Self { nx, ny, lon, lat })
    }

    /// Flat index of corner node (j, i) on the (ny+1, nx+1) mesh.
    #[inline]
    pub fn index(&self, j: usize, i: usize) -> usize {
        j * (self.nx + 1) + i
    }
}

/// A curvilinear grid: centers, optional corners, optional x-periodicity.
#[derive(Debug, Clone)]
pub struct Grid {
    pub centers: CellCenters,
    pub corners: Option<CellCorners>,
    /// Whether the grid wraps around in the x (column) direction
    pub periodic: bool,
}

impl Grid {
    /// Grid from centers only.
    pub fn from_centers(centers: CellCenters) -> Self {
        Self {
            centers,
            corners: None,
            periodic: false,
        }
    }

    /// Grid from centers and corners, validating that they describe the same
    /// number of cells.
    pub fn with_corners(centers: CellCenters, corners: CellCorners) -> Result<Self> {
        if corners.nx != centers.nx || corners.ny != centers.ny {
            return Err(RegridError::ShapeMismatch {
                name: "corner mesh",
                expected: centers.len(),
                got: corners.nx * corners.ny,
            });
        }
        Ok(Self {
            centers,
            corners: Some(corners),
            periodic: false,
        })
    }

    /// Mark the grid as periodic in x.
    pub fn periodic(mut self) -> Self {
        self.periodic = true;
        self
    }
}
