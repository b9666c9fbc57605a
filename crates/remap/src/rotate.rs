//! Vector rotation between local grid bases and geographic east/north.
//!
//! A vector field on a projected grid is expressed in the grid's local x/y
//! basis. Regridding the components separately is only meaningful in a
//! common basis, so vectors are rotated to geographic east/north first and
//! rotated into the destination grid's local basis afterwards.

use std::f64::consts::{FRAC_PI_2, PI, TAU};

use crate::error::{RemapError, Result};

/// Angle between the local x-axis and true east for a mesh of planar
/// coordinates, in radians.
///
/// On a polar stereographic plane the direction toward the pole is -r-hat,
/// so the local north/south direction at (x, y) is atan2(y, x) and east is a
/// quarter turn behind it.
pub fn angle_to_east_mesh(xx: &[f64], yy: &[f64]) -> Result<Vec<f64>> {
    if xx.len() != yy.len() {
        return Err(RemapError::ShapeMismatch(format!(
            "x mesh has {} samples but y mesh has {}",
            xx.len(),
            yy.len()
        )));
    }
    Ok(xx
        .iter()
        .zip(yy.iter())
        .map(|(&x, &y)| f64::atan2(y, x) - FRAC_PI_2)
        .collect())
}

/// Angle between the local x-axis and true east for 1-D planar axes,
/// meshed to a (y.len(), x.len()) grid.
pub fn angle_to_east_axes(x: &[f64], y: &[f64]) -> Vec<f64> {
    let mut angle = Vec::with_capacity(x.len() * y.len());
    for &yy in y {
        for &xx in x {
            angle.push(f64::atan2(yy, xx) - FRAC_PI_2);
        }
    }
    angle
}

/// Rotate a vector field by a per-cell angle (radians).
///
/// `u` and `v` may carry leading batch dimensions: their length must be a
/// multiple of the angle field's length, and the angle is broadcast over
/// each batch plane. Angles with magnitude above 2*pi are rejected as a
/// degrees/radians mix-up before any output is produced.
pub fn rotate_winds(u: &[f64], v: &[f64], angle: &[f64]) -> Result<(Vec<f64>, Vec<f64>)> {
    if u.len() != v.len() {
        return Err(RemapError::ShapeMismatch(format!(
            "u has {} samples but v has {}",
            u.len(),
            v.len()
        )));
    }
    if angle.is_empty() || u.len() % angle.len() != 0 {
        return Err(RemapError::ShapeMismatch(format!(
            "angle field of {} samples does not divide vector field of {}",
            angle.len(),
            u.len()
        )));
    }

    let max_abs = angle.iter().fold(0.0_f64, |m, a| m.max(a.abs()));
    if max_abs > TAU {
        return Err(RemapError::AngleNotRadians { max_abs });
    }

    let mut u_rot = Vec::with_capacity(u.len());
    let mut v_rot = Vec::with_capacity(v.len());
    for (plane_u, plane_v) in u.chunks_exact(angle.len()).zip(v.chunks_exact(angle.len())) {
        for ((&pu, &pv), &a) in plane_u.iter().zip(plane_v.iter()).zip(angle.iter()) {
            let (sin_a, cos_a) = a.sin_cos();
            u_rot.push(pu * cos_a + pv * sin_a);
            v_rot.push(pv * cos_a - pu * sin_a);
        }
    }
    Ok((u_rot, v_rot))
}

/// Rotate from geographic east/north to the model grid's local basis.
/// The model angle (`angle_dx`) is in degrees.
pub fn rotate_east_to_model(
    u_east: &[f64],
    v_north: &[f64],
    angle_deg: &[f64],
) -> Result<(Vec<f64>, Vec<f64>)> {
    let angle_rad: Vec<f64> = angle_deg.iter().map(|a| a * PI / 180.0).collect();
    rotate_winds(u_east, v_north, &angle_rad)
}

/// Rotate from the model grid's local basis to geographic east/north.
/// The model angle (`angle_dx`) is in degrees.
pub fn rotate_model_to_east(
    u_model: &[f64],
    v_model: &[f64],
    angle_deg: &[f64],
) -> Result<(Vec<f64>, Vec<f64>)> {
    let angle_rad: Vec<f64> = angle_deg.iter().map(|a| -a * PI / 180.0).collect();
    rotate_winds(u_model, v_model, &angle_rad)
}

/// Rotate from the stereographic grid's local basis to geographic
/// east/north, deriving the angle from the 1-D planar axes.
pub fn rotate_stereo_to_east(
    u_stereo: &[f64],
    v_stereo: &[f64],
    x: &[f64],
    y: &[f64],
) -> Result<(Vec<f64>, Vec<f64>)> {
    let angle = angle_to_east_axes(x, y);
    rotate_winds(u_stereo, v_stereo, &angle)
}

/// Rotate from geographic east/north to the stereographic grid's local
/// basis, deriving the angle from the 1-D planar axes.
pub fn rotate_east_to_stereo(
    u_east: &[f64],
    v_north: &[f64],
    x: &[f64],
    y: &[f64],
) -> Result<(Vec<f64>, Vec<f64>)> {
    let angle: Vec<f64> = angle_to_east_axes(x, y).iter().map(|a| -a).collect();
    rotate_winds(u_east, v_north, &angle)
}
