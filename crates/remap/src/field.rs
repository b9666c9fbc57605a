//! Labeled multi-dimensional fields and datasets.
//!
//! A [`Field`] is a row-major array whose two trailing dimensions are
//! spatial (y, x); any leading dimensions are batch dimensions such as time.
//! Numeric kernels operate on the trailing 2-D planes independently.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{RemapError, Result};

/// A named, labeled, row-major array of samples.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Field {
    /// Variable name
    pub name: String,
    /// Row-major sample data
    pub data: Vec<f64>,
    /// Dimension sizes; the last two are (ny, nx)
    pub shape: Vec<usize>,
    /// Dimension names, co-indexed with `shape`
    pub dims: Vec<String>,
    /// Units attribute, when known
    pub units: Option<String>,
}

impl Field {
    /// Create a field, validating that data length, shape and dims agree and
    /// that there are at least two (spatial) dimensions.
    pub fn new(
        name: impl Into<String>,
        data: Vec<f64>,
        shape: Vec<usize>,
        dims: Vec<String>,
    ) -> Result<Self> {
        let name = name.into();
        if shape.len() < 2 {
            return Err(RemapError::ShapeMismatch(format!(
                "field '{}' needs at least 2 dimensions, got {}",
                name,
                shape.len()
            )));
        }
        if dims.len() != shape.len() {
            return Err(RemapError::ShapeMismatch(format!(
                "field '{}' has {} dims for {} shape entries",
                name,
                dims.len(),
                shape.len()
            )));
        }
        let expected: usize = shape.iter().product();
        if data.len() != expected {
            return Err(RemapError::ShapeMismatch(format!(
                "field '{}' has {} samples for shape {:?}",
                name,
                data.len(),
                shape
            )));
        }
        Ok(Self {
            name,
            data,
            shape,
            dims,
            units: None,
        })
    }

    /// Create a plain 2-D field with dimensions ("y", "x").
    pub fn new_2d(name: impl Into<String>, data: Vec<f64>, ny: usize, nx: usize) -> Result<Self> {
        Self::new(
            name,
            data,
            vec![ny, nx],
            vec!["y".to_string(), "x".to_string()],
        )
    }

    /// Attach a units attribute.
    pub fn with_units(mut self, units: impl Into<String>) -> Self {
        self.units = Some(units.into());
        self
    }

    /// Number of rows of the trailing spatial plane.
    pub fn ny(&self) -> usize {
        self.shape[self.shape.len() - 2]
    }

    /// Number of columns of the trailing spatial plane.
    pub fn nx(&self) -> usize {
        self.shape[self.shape.len() - 1]
    }

    /// Samples per spatial plane.
    pub fn plane_len(&self) -> usize {
        self.ny() * self.nx()
    }

    /// Number of trailing 2-D planes (product of the batch dimensions).
    pub fn num_planes(&self) -> usize {
        self.data.len() / self.plane_len()
    }

    /// Iterate over the trailing 2-D planes.
    pub fn planes(&self) -> impl Iterator<Item = &[f64]> {
        self.data.chunks_exact(self.plane_len())
    }

    /// Iterate mutably over the trailing 2-D planes.
    pub fn planes_mut(&mut self) -> impl Iterator<Item = &mut [f64]> {
        let plane_len = self.plane_len();
        self.data.chunks_exact_mut(plane_len)
    }

    /// Check that another field has the same shape.
    pub fn check_same_shape(&self, other: &Field) -> Result<()> {
        if self.shape != other.shape {
            return Err(RemapError::ShapeMismatch(format!(
                "'{}' has shape {:?} but '{}' has shape {:?}",
                self.name, self.shape, other.name, other.shape
            )));
        }
        Ok(())
    }
}

/// A collection of named fields.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    fields: BTreeMap<String, Field>,
}

impl Dataset {
    /// Empty dataset.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a field under its own name, replacing any previous entry.
    pub fn insert(&mut self, field: Field) {
        self.fields.insert(field.name.clone(), field);
    }

    /// Look up a field by name.
    pub fn get(&self, name: &str) -> Option<&Field> {
        self.fields.get(name)
    }

    /// Look up a field by name, failing when it is absent.
    pub fn field(&self, name: &str) -> Result<&Field> {
        self.fields
            .get(name)
            .ok_or_else(|| RemapError::MissingField(name.to_string()))
    }

    /// Names of all fields, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(|s| s.as_str())
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Check whether the dataset holds no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// A source dataset on a regular stereographic grid: 1-D planar axes plus
/// any number of data fields on the (y, x) mesh.
#[derive(Debug, Clone)]
pub struct StereoDataset {
    /// 1-D x axis of the projected grid (m or km)
    pub x: Vec<f64>,
    /// 1-D y axis of the projected grid (m or km)
    pub y: Vec<f64>,
    /// Data fields, plus `lon`/`lat` once coordinates are attached
    pub fields: Dataset,
}

impl StereoDataset {
    /// Create a dataset from its planar axes.
    pub fn new(x: Vec<f64>, y: Vec<f64>) -> Self {
        Self {
            x,
            y,
            fields: Dataset::new(),
        }
    }

    /// Grid shape as (ny, nx).
    pub fn grid_shape(&self) -> (usize, usize) {
        (self.y.len(), self.x.len())
    }

    /// Insert a field after validating its spatial shape against the axes.
    pub fn insert(&mut self, field: Field) -> Result<()> {
        let (ny, nx) = self.grid_shape();
        if field.ny() != ny || field.nx() != nx {
            return Err(RemapError::ShapeMismatch(format!(
                "field '{}' has spatial shape ({}, {}) but the grid is ({}, {})",
                field.name,
                field.ny(),
                field.nx(),
                ny,
                nx
            )));
        }
        self.fields.insert(field);
        Ok(())
    }
}
