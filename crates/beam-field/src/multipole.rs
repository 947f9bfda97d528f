// ─────────────────────────────────────────────────────────────────────
// SCPN Beam Core — Analytic Magnet Fields
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Closed-form fields of ideal magnets built from a strength table.
//!
//! A normal multipole with coefficient `b_n = brho·k_n` has
//! `B_y + i·B_x = b_n·(x + i·y)^n / n!`. Strengths are converted to host
//! length units with `StrengthTable::value_in_units`, so `b_n` comes out
//! in T per host-length^n.

use crate::model::{FieldModel, FieldSample, FieldVector};
use beam_math::series::{power_series, skew_angle};
use beam_types::config::Units;
use beam_types::constants::MAX_MULTIPOLE_ORDER;
use beam_types::strength::StrengthTable;
use nalgebra::Vector3;
use num_complex::Complex64;

/// Uniform vertical field `(0, field, 0)`.
#[derive(Debug, Clone, Copy)]
pub struct DipoleField {
    field: Vector3<f64>,
}

impl DipoleField {
    pub fn new(field: f64) -> Self {
        DipoleField {
            field: Vector3::new(0.0, field, 0.0),
        }
    }

    pub fn from_strength(strength: &StrengthTable) -> Self {
        DipoleField::new(strength.get("field"))
    }
}

impl FieldModel for DipoleField {
    fn evaluate(&self, _position: &Vector3<f64>, _t: f64) -> FieldSample {
        FieldSample::magnetic(self.field)
    }
}

/// `B = (g·y, g·x, 0)` with `g = brho·k1`.
#[derive(Debug, Clone, Copy)]
pub struct QuadrupoleField {
    gradient: f64,
}

impl QuadrupoleField {
    pub fn new(gradient: f64) -> Self {
        QuadrupoleField { gradient }
    }

    pub fn from_strength(strength: &StrengthTable, brho: f64, units: &Units) -> Self {
        QuadrupoleField::new(brho * strength.value_in_units("k1", units))
    }

    pub fn gradient(&self) -> f64 {
        self.gradient
    }
}

impl FieldModel for QuadrupoleField {
    fn evaluate(&self, position: &Vector3<f64>, _t: f64) -> FieldSample {
        let g = self.gradient;
        FieldSample::magnetic(Vector3::new(g * position.y, g * position.x, 0.0))
    }
}

/// Second derivative field `B'' = brho·k2`.
#[derive(Debug, Clone, Copy)]
pub struct SextupoleField {
    b2: f64,
}

impl SextupoleField {
    pub fn new(b2: f64) -> Self {
        SextupoleField { b2 }
    }

    pub fn from_strength(strength: &StrengthTable, brho: f64, units: &Units) -> Self {
        SextupoleField::new(brho * strength.value_in_units("k2", units))
    }
}

impl FieldModel for SextupoleField {
    fn evaluate(&self, position: &Vector3<f64>, _t: f64) -> FieldSample {
        let (x, y) = (position.x, position.y);
        let half = 0.5 * self.b2;
        FieldSample::magnetic(Vector3::new(self.b2 * x * y, half * (x * x - y * y), 0.0))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct OctupoleField {
    b3: f64,
}

impl OctupoleField {
    pub fn new(b3: f64) -> Self {
        OctupoleField { b3 }
    }

    pub fn from_strength(strength: &StrengthTable, brho: f64, units: &Units) -> Self {
        OctupoleField::new(brho * strength.value_in_units("k3", units))
    }
}

impl FieldModel for OctupoleField {
    fn evaluate(&self, position: &Vector3<f64>, _t: f64) -> FieldSample {
        let (x, y) = (position.x, position.y);
        let c = self.b3 / 6.0;
        let bx = c * (3.0 * x * x * y - y * y * y);
        let by = c * (x * x * x - 3.0 * x * y * y);
        FieldSample::magnetic(Vector3::new(bx, by, 0.0))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct DecapoleField {
    b4: f64,
}

impl DecapoleField {
    pub fn new(b4: f64) -> Self {
        DecapoleField { b4 }
    }

    pub fn from_strength(strength: &StrengthTable, brho: f64, units: &Units) -> Self {
        DecapoleField::new(brho * strength.value_in_units("k4", units))
    }
}

impl FieldModel for DecapoleField {
    fn evaluate(&self, position: &Vector3<f64>, _t: f64) -> FieldSample {
        let (x, y) = (position.x, position.y);
        let (x2, y2) = (x * x, y * y);
        let c = self.b4 / 24.0;
        let bx = c * 4.0 * x * y * (x2 - y2);
        let by = c * (x2 * x2 - 6.0 * x2 * y2 + y2 * y2);
        FieldSample::magnetic(Vector3::new(bx, by, 0.0))
    }
}

/// Sum of all normal and skew orders present in a strength table.
///
/// A skew term of order n + 1 is the normal term rotated by
/// `π / (2(n + 1))`: the position is rotated by that angle before the
/// normal series is evaluated and the field is rotated back after.
#[derive(Debug, Clone)]
pub struct MultipoleField {
    /// `(n, b_n)` for kN with b_n != 0
    normal: Vec<(usize, f64)>,
    skew: Vec<(usize, f64)>,
}

impl MultipoleField {
    pub fn from_strength(strength: &StrengthTable, brho: f64, units: &Units) -> Self {
        let collect = |keys: &[&str]| -> Vec<(usize, f64)> {
            keys.iter()
                .take(MAX_MULTIPOLE_ORDER)
                .enumerate()
                .map(|(i, key)| (i + 1, brho * strength.value_in_units(key, units)))
                .filter(|(_, b)| *b != 0.0)
                .collect()
        };
        MultipoleField {
            normal: collect(StrengthTable::normal_keys()),
            skew: collect(StrengthTable::skew_keys()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.normal.is_empty() && self.skew.is_empty()
    }
}

/// Normal-series field at `z = x + i·y`, returned as `(B_x, B_y)`.
fn normal_series(z: Complex64, terms: &[(usize, f64)]) -> (f64, f64) {
    let f = power_series(z, terms.iter().map(|&(n, b)| (n, Complex64::new(b, 0.0))));
    (f.im, f.re)
}

impl FieldModel for MultipoleField {
    fn evaluate(&self, position: &Vector3<f64>, _t: f64) -> FieldSample {
        let z = Complex64::new(position.x, position.y);
        let (mut bx, mut by) = normal_series(z, &self.normal);
        for &(n, b) in &self.skew {
            let rot = Complex64::from_polar(1.0, skew_angle(n + 1));
            // field vector (bx, by) as the complex number bx + i·by
            let (sx, sy) = normal_series(z * rot, &[(n, b)]);
            let back = Complex64::new(sx, sy) * rot.conj();
            bx += back.re;
            by += back.im;
        }
        FieldSample::magnetic(Vector3::new(bx, by, 0.0))
    }
}

/// Uniform longitudinal field `(0, 0, brho·ks)`.
#[derive(Debug, Clone, Copy)]
pub struct SolenoidField {
    bz: f64,
}

impl SolenoidField {
    pub fn new(bz: f64) -> Self {
        SolenoidField { bz }
    }

    pub fn from_strength(strength: &StrengthTable, brho: f64) -> Self {
        SolenoidField::new(brho * strength.get("ks"))
    }
}

impl FieldModel for SolenoidField {
    fn evaluate(&self, _position: &Vector3<f64>, _t: f64) -> FieldSample {
        FieldSample::magnetic(Vector3::new(0.0, 0.0, self.bz))
    }
}

/// Toroidal field of a magnetised iron spoiler, `|B| = brho·field`.
#[derive(Debug, Clone, Copy)]
pub struct MuonSpoilerField {
    b: f64,
}

impl MuonSpoilerField {
    pub fn from_strength(strength: &StrengthTable, brho: f64) -> Self {
        MuonSpoilerField {
            b: brho * strength.get("field"),
        }
    }
}

impl FieldModel for MuonSpoilerField {
    fn evaluate(&self, position: &Vector3<f64>, _t: f64) -> FieldSample {
        let r = position.x.hypot(position.y);
        if r == 0.0 {
            return FieldSample::magnetic(Vector3::zeros());
        }
        FieldSample::magnetic(Vector3::new(
            position.y / r * self.b,
            -position.x / r * self.b,
            0.0,
        ))
    }
}

/// Longitudinal electric field `E_z = E0·cos(2π·f·t + φ)`, t in ns.
#[derive(Debug, Clone, Copy)]
pub struct RfSinusoidField {
    amplitude: f64,
    angular_frequency: f64,
    phase: f64,
}

impl RfSinusoidField {
    pub fn new(amplitude: f64, frequency_hz: f64, phase: f64) -> Self {
        RfSinusoidField {
            amplitude,
            angular_frequency: std::f64::consts::TAU * frequency_hz * 1e-9,
            phase,
        }
    }

    pub fn from_strength(strength: &StrengthTable) -> Self {
        RfSinusoidField::new(
            strength.get("efield"),
            strength.get("frequency"),
            strength.get("phase"),
        )
    }
}

impl FieldModel for RfSinusoidField {
    fn evaluate(&self, _position: &Vector3<f64>, t: f64) -> FieldSample {
        let ez = self.amplitude * (self.angular_frequency * t + self.phase).cos();
        FieldSample::inside(FieldVector::electric(Vector3::new(0.0, 0.0, ez)))
    }
}
