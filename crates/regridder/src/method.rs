//! Regridding method selection.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::RegridError;

/// Interpolation method used to map source cell values onto the destination
/// grid.
///
/// The choice of method should be matched to the field type:
/// - **Nearest**: fast, preserves exact values, good for masks and
///   categorical fields. Every destination cell gets a value.
/// - **Bilinear**: smooth, good default for continuous fields. Destination
///   cells outside the source mesh are left unmapped (NaN).
/// - **Conservative**: first-order area-weighted, preserves integrals, good
///   for fluxes. Requires cell corners on both grids.
/// - **Patch**: local least-squares recovery, smoother derivatives than
///   bilinear, good for fields that feed gradient computations (e.g.
///   velocities).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Method {
    Nearest,
    #[default]
    Bilinear,
    Conservative,
    Patch,
}

impl Method {
    /// Lowercase name of the method, as used in configuration files.
    pub fn name(&self) -> &'static str {
        match self {
            Method::Nearest => "nearest",
            Method::Bilinear => "bilinear",
            Method::Conservative => "conservative",
            Method::Patch => "patch",
        }
    }
}

impl FromStr for Method {
    type Err = RegridError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "nearest" => Ok(Method::Nearest),
            "bilinear" => Ok(Method::Bilinear),
            "conservative" => Ok(Method::Conservative),
            "patch" => Ok(Method::Patch),
            other => Err(RegridError::UnknownMethod(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_method_names() {
        assert_eq!("bilinear".parse::<Method>().unwrap(), Method::Bilinear);
        assert_eq!("patch".parse::<Method>().unwrap(), Method::Patch);
        assert!("cubic".parse::<Method>().is_err());
    }

    #[test]
    fn test_default_is_bilinear() {
        assert_eq!(Method::default(), Method::Bilinear);
    }
}
