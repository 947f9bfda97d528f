// ─────────────────────────────────────────────────────────────────────
// SCPN Beam Core — Vector Helpers
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Small vector utilities shared by the field models and steppers.

use nalgebra::{Rotation3, Vector3};

/// Substitute `previous` for a non-finite `value`.
///
/// Square roots and trigonometric renormalisations inside the analytic
/// steppers can go NaN through roundoff. The stepper keeps the pre-step
/// value instead of propagating it.
#[inline]
pub fn finite_or(value: f64, previous: f64) -> f64 {
    if !value.is_finite() {
        previous
    } else {
        value
    }
}

/// Longitudinal unit-momentum component `sqrt(1 - xp² - yp²)`,
/// falling back to `previous` when the argument is negative.
#[inline]
pub fn longitudinal(xp: f64, yp: f64, previous: f64) -> f64 {
    finite_or((1.0 - xp * xp - yp * yp).sqrt(), previous)
}

/// Rotate `v` by `angle` about the local z axis.
pub fn rotate_z(v: &Vector3<f64>, angle: f64) -> Vector3<f64> {
    if angle == 0.0 {
        return *v;
    }
    Rotation3::from_axis_angle(&Vector3::z_axis(), angle) * v
}

/// Rotate `v` by `angle` about the local y axis.
pub fn rotate_y(v: &Vector3<f64>, angle: f64) -> Vector3<f64> {
    if angle == 0.0 {
        return *v;
    }
    Rotation3::from_axis_angle(&Vector3::y_axis(), angle) * v
}

/// Unit vector along `v`, or zero for a null vector.
pub fn unit_or_zero(v: &Vector3<f64>) -> Vector3<f64> {
    let n = v.norm();
    if n == 0.0 || !n.is_finite() {
        Vector3::zeros()
    } else {
        v / n
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finite_or_replaces_nan() {
        assert_eq!(finite_or(f64::NAN, 0.7), 0.7);
        assert_eq!(finite_or(f64::INFINITY, 0.7), 0.7);
        assert_eq!(finite_or(0.3, 0.7), 0.3);
    }

    #[test]
    fn test_longitudinal_keeps_previous_when_overkicked() {
        // xp² + yp² > 1 would give sqrt of a negative number
        let zp = longitudinal(0.9, 0.6, 0.42);
        assert_eq!(zp, 0.42);
        let zp = longitudinal(0.6, 0.0, 0.42);
        assert!((zp - 0.8).abs() < 1e-15);
    }

    #[test]
    fn test_rotate_z_quarter_turn() {
        let v = rotate_z(&Vector3::new(1.0, 0.0, 0.5), std::f64::consts::FRAC_PI_2);
        assert!(v.x.abs() < 1e-15);
        assert!((v.y - 1.0).abs() < 1e-15);
        assert!((v.z - 0.5).abs() < 1e-15);
    }

    #[test]
    fn test_rotate_y_sign() {
        // right-handed rotation about +y takes +z towards +x
        let v = rotate_y(&Vector3::new(0.0, 0.0, 1.0), 0.1);
        assert!((v.x - 0.1f64.sin()).abs() < 1e-15);
        assert!((v.z - 0.1f64.cos()).abs() < 1e-15);
    }
}
