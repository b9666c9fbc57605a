//! Polar stereographic projection.
//!
//! This projection is the standard choice for polar gridded products (NSIDC
//! sea-ice grids, the MAR regional climate model over Greenland and
//! Antarctica). It maps the ellipsoid onto a plane tangent (or secant) at one
//! of the poles.
//!
//! The projection parameters include:
//! - Pole of projection (lat_0 = +90 or -90)
//! - True-scale latitude (lat_ts), or a scale factor k at the pole
//! - Central meridian (lon_0)
//! - False easting/northing (x_0, y_0)
//! - Ellipsoid (datum, or explicit semi-axes)
//!
//! Formulas follow Snyder, "Map Projections: A Working Manual" (1987), §21,
//! with the series inversion of the conformal latitude.

use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI};

use crate::error::{ProjectionError, Result};
use crate::proj4::Proj4Params;

/// Reference ellipsoid, described by its semi-major axis and eccentricity.
#[derive(Debug, Clone, Copy)]
pub struct Ellipsoid {
    /// Semi-major axis (meters)
    pub a: f64,
    /// First eccentricity
    pub e: f64,
}

impl Ellipsoid {
    /// WGS84 ellipsoid.
    pub fn wgs84() -> Self {
        // a = 6378137, 1/f = 298.257223563
        Self::from_semi_axes(6378137.0, 6356752.314245179)
    }

    /// Hughes 1980 ellipsoid, used by the NSIDC polar stereographic grids.
    pub fn hughes() -> Self {
        Self::from_semi_axes(6378273.0, 6356889.449)
    }

    /// Sphere of the given radius.
    pub fn sphere(radius: f64) -> Self {
        Self { a: radius, e: 0.0 }
    }

    /// Build from semi-major and semi-minor axes.
    pub fn from_semi_axes(a: f64, b: f64) -> Self {
        let e2 = 1.0 - (b * b) / (a * a);
        Self { a, e: e2.sqrt() }
    }
}

/// Pole at which the projection plane touches the ellipsoid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pole {
    North,
    South,
}

/// Polar stereographic projection.
///
/// Converts between geodetic coordinates (longitude/latitude in degrees) and
/// planar coordinates (x/y in meters). Constructed either from explicit
/// parameters or from a PROJ.4 descriptor string.
#[derive(Debug, Clone)]
pub struct PolarStereographic {
    /// Projection pole
    pub pole: Pole,
    /// Central meridian in radians
    pub lon0: f64,
    /// False easting (meters)
    pub x0: f64,
    /// False northing (meters)
    pub y0: f64,
    /// Reference ellipsoid
    pub ellipsoid: Ellipsoid,
    /// Scale constant: rho = akm1 * t(phi)
    akm1: f64,
    /// Conformal latitude inversion series coefficients
    c2: f64,
    c4: f64,
    c6: f64,
    c8: f64,
}

/// Isometric latitude function t (Snyder 15-9).
fn tsfn(phi: f64, e: f64) -> f64 {
    let s = e * phi.sin();
    (FRAC_PI_4 - phi / 2.0).tan() / ((1.0 - s) / (1.0 + s)).powf(e / 2.0)
}

/// Parallel radius function m (Snyder 14-15).
fn msfn(phi: f64, e: f64) -> f64 {
    let s = phi.sin();
    phi.cos() / (1.0 - e * e * s * s).sqrt()
}

/// Normalize an angle in radians to [-pi, pi].
fn normalize_lon(mut lon: f64) -> f64 {
    while lon > PI {
        lon -= 2.0 * PI;
    }
    while lon < -PI {
        lon += 2.0 * PI;
    }
    lon
}

impl PolarStereographic {
    /// Create a polar stereographic projection from explicit parameters.
    ///
    /// # Arguments
    /// * `pole` - Projection pole (north or south aspect)
    /// * `lat_ts_deg` - True-scale latitude in degrees; `None` means the
    ///   scale factor `k0` applies at the pole itself
    /// * `lon0_deg` - Central meridian (degrees)
    /// * `k0` - Scale factor at the pole, ignored when `lat_ts_deg` is given
    /// * `x0`, `y0` - False easting/northing (meters)
    /// * `ellipsoid` - Reference ellipsoid
    pub fn new(
        pole: Pole,
        lat_ts_deg: Option<f64>,
        lon0_deg: f64,
        k0: f64,
        x0: f64,
        y0: f64,
        ellipsoid: Ellipsoid,
    ) -> Self {
        let to_rad = PI / 180.0;
        let e = ellipsoid.e;

        // lat_ts enters through its absolute value: the south aspect is
        // handled by reflecting latitudes, not by a separate formula set.
        let akm1 = match lat_ts_deg {
            Some(ts_deg) if ts_deg.abs() < 90.0 - 1e-9 => {
                let ts = ts_deg.abs() * to_rad;
                ellipsoid.a * msfn(ts, e) / tsfn(ts, e)
            }
            _ => {
                ellipsoid.a * 2.0 * k0
                    / ((1.0 + e).powf(1.0 + e) * (1.0 - e).powf(1.0 - e)).sqrt()
            }
        };

        let e2 = e * e;
        let e4 = e2 * e2;
        let e6 = e4 * e2;
        let e8 = e4 * e4;

        Self {
            pole,
            lon0: lon0_deg * to_rad,
            x0,
            y0,
            ellipsoid,
            akm1,
            c2: e2 / 2.0 + 5.0 * e4 / 24.0 + e6 / 12.0 + 13.0 * e8 / 360.0,
            c4: 7.0 * e4 / 48.0 + 29.0 * e6 / 240.0 + 811.0 * e8 / 11520.0,
            c6: 7.0 * e6 / 120.0 + 81.0 * e8 / 1120.0,
            c8: 4279.0 * e8 / 161280.0,
        }
    }

    /// Create a projection from a PROJ.4 descriptor string.
    ///
    /// Only `+proj=stere` with a polar `+lat_0` is accepted. The ellipsoid is
    /// taken from `+a`/`+b` when given, otherwise from `+datum`/`+ellps`
    /// (WGS84), defaulting to WGS84.
    pub fn from_proj4(projstring: &str) -> Result<Self> {
        let params = Proj4Params::parse(projstring)?;

        let proj = params
            .value("proj")
            .ok_or_else(|| ProjectionError::MissingParameter("proj".to_string()))?;
        if proj != "stere" {
            return Err(ProjectionError::UnsupportedProjection(proj.to_string()));
        }

        let lat0 = params.number_or("lat_0", 0.0)?;
        let pole = if (lat0 - 90.0).abs() < 1e-9 {
            Pole::North
        } else if (lat0 + 90.0).abs() < 1e-9 {
            Pole::South
        } else {
            return Err(ProjectionError::NotPolar(lat0));
        };

        if let Some(units) = params.value("units") {
            if units != "m" {
                return Err(ProjectionError::UnsupportedUnits(units.to_string()));
            }
        }

        let ellipsoid = match (params.number("a")?, params.number("b")?) {
            (Some(a), Some(b)) => Ellipsoid::from_semi_axes(a, b),
            (Some(a), None) => Ellipsoid::sphere(a),
            _ => {
                let datum = params.value("datum").or_else(|| params.value("ellps"));
                match datum {
                    None | Some("WGS84") => Ellipsoid::wgs84(),
                    Some(other) => {
                        return Err(ProjectionError::UnsupportedDatum(other.to_string()))
                    }
                }
            }
        };

        let lat_ts = params.number("lat_ts")?;
        let lon0 = params.number_or("lon_0", 0.0)?;
        let k0 = match params.number("k")? {
            Some(k) => k,
            None => params.number_or("k_0", 1.0)?,
        };
        let x0 = params.number_or("x_0", 0.0)?;
        let y0 = params.number_or("y_0", 0.0)?;

        Ok(Self::new(pole, lat_ts, lon0, k0, x0, y0, ellipsoid))
    }

    /// South polar grid used for Antarctic forcing fields
    /// (`+lat_0=-90 +lat_ts=-71 +lon_0=0`, WGS84).
    pub fn antarctic() -> Self {
        Self::new(Pole::South, Some(-71.0), 0.0, 1.0, 0.0, 0.0, Ellipsoid::wgs84())
    }

    /// North polar grid used by MAR over Greenland
    /// (`+lat_0=90 +lat_ts=71 +lon_0=-39`, WGS84).
    pub fn greenland() -> Self {
        Self::new(Pole::North, Some(71.0), -39.0, 1.0, 0.0, 0.0, Ellipsoid::wgs84())
    }

    /// NSIDC north polar stereographic grid
    /// (`+lat_0=90 +lat_ts=70 +lon_0=-45`, Hughes 1980 ellipsoid).
    pub fn north_polar_hughes() -> Self {
        Self::new(Pole::North, Some(70.0), -45.0, 1.0, 0.0, 0.0, Ellipsoid::hughes())
    }

    /// Project geodetic coordinates (degrees) to planar x/y (meters).
    pub fn forward(&self, lon_deg: f64, lat_deg: f64) -> (f64, f64) {
        let to_rad = PI / 180.0;
        let lam = normalize_lon(lon_deg * to_rad - self.lon0);

        // The south aspect reflects latitude and the meridian cosine.
        let (phi, coslam_sign) = match self.pole {
            Pole::North => (lat_deg * to_rad, 1.0),
            Pole::South => (-lat_deg * to_rad, -1.0),
        };

        let rho = self.akm1 * tsfn(phi, self.ellipsoid.e);
        let x = self.x0 + rho * lam.sin();
        let y = self.y0 - rho * lam.cos() * coslam_sign;

        (x, y)
    }

    /// Inverse projection: planar x/y (meters) to geodetic lon/lat (degrees).
    pub fn inverse(&self, x: f64, y: f64) -> (f64, f64) {
        let to_deg = 180.0 / PI;
        let dx = x - self.x0;
        let dy = y - self.y0;
        let rho = (dx * dx + dy * dy).sqrt();

        if rho == 0.0 {
            let pole_lat = match self.pole {
                Pole::North => 90.0,
                Pole::South => -90.0,
            };
            return (self.lon0 * to_deg, pole_lat);
        }

        let t = rho / self.akm1;
        let chi = FRAC_PI_2 - 2.0 * t.atan();

        // Series inversion of the conformal latitude (Snyder 3-5).
        let phi_abs = chi
            + self.c2 * (2.0 * chi).sin()
            + self.c4 * (4.0 * chi).sin()
            + self.c6 * (6.0 * chi).sin()
            + self.c8 * (8.0 * chi).sin();

        let (phi, lam) = match self.pole {
            Pole::North => (phi_abs, f64::atan2(dx, -dy)),
            Pole::South => (-phi_abs, f64::atan2(dx, dy)),
        };

        let lon = normalize_lon(self.lon0 + lam);
        (lon * to_deg, phi * to_deg)
    }

    /// Project co-indexed lon/lat slices to planar x/y.
    pub fn forward_arrays(&self, lon: &[f64], lat: &[f64]) -> Result<(Vec<f64>, Vec<f64>)> {
        if lon.len() != lat.len() {
            return Err(ProjectionError::LengthMismatch {
                left: lon.len(),
                right: lat.len(),
            });
        }
        let mut xs = Vec::with_capacity(lon.len());
        let mut ys = Vec::with_capacity(lon.len());
        for (&lo, &la) in lon.iter().zip(lat.iter()) {
            let (x, y) = self.forward(lo, la);
            xs.push(x);
            ys.push(y);
        }
        Ok((xs, ys))
    }

    /// Inverse-project co-indexed x/y slices to lon/lat.
    pub fn inverse_arrays(&self, x: &[f64], y: &[f64]) -> Result<(Vec<f64>, Vec<f64>)> {
        if x.len() != y.len() {
            return Err(ProjectionError::LengthMismatch {
                left: x.len(),
                right: y.len(),
            });
        }
        let mut lons = Vec::with_capacity(x.len());
        let mut lats = Vec::with_capacity(x.len());
        for (&px, &py) in x.iter().zip(y.iter()) {
            let (lon, lat) = self.inverse(px, py);
            lons.push(lon);
            lats.push(lat);
        }
        Ok((lons, lats))
    }
}
