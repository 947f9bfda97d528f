// ─────────────────────────────────────────────────────────────────────
// SCPN Beam Core — Field Model Contract
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! The single evaluation contract shared by every field variant.
//!
//! Positions are in the model's own local frame, in host length units.
//! Time is in ns. Magnetic field is in T, electric field in V/m.

use nalgebra::Vector3;
use std::fmt;
use std::ops::{Add, AddAssign};

/// Magnetic and electric field at one point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldVector {
    pub magnetic: Vector3<f64>,
    pub electric: Vector3<f64>,
}

impl FieldVector {
    pub fn zero() -> Self {
        FieldVector {
            magnetic: Vector3::zeros(),
            electric: Vector3::zeros(),
        }
    }

    pub fn magnetic(b: Vector3<f64>) -> Self {
        FieldVector {
            magnetic: b,
            electric: Vector3::zeros(),
        }
    }

    pub fn electric(e: Vector3<f64>) -> Self {
        FieldVector {
            magnetic: Vector3::zeros(),
            electric: e,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.magnetic == Vector3::zeros() && self.electric == Vector3::zeros()
    }

    /// Apply the same linear map to both components.
    pub fn map<F>(&self, f: F) -> Self
    where
        F: Fn(&Vector3<f64>) -> Vector3<f64>,
    {
        FieldVector {
            magnetic: f(&self.magnetic),
            electric: f(&self.electric),
        }
    }
}

impl Add for FieldVector {
    type Output = FieldVector;

    fn add(self, rhs: FieldVector) -> FieldVector {
        FieldVector {
            magnetic: self.magnetic + rhs.magnetic,
            electric: self.electric + rhs.electric,
        }
    }
}

impl AddAssign for FieldVector {
    fn add_assign(&mut self, rhs: FieldVector) {
        self.magnetic += rhs.magnetic;
        self.electric += rhs.electric;
    }
}

/// Result of one evaluation. `outside` is set when the query fell outside
/// a field map's domain; the field is then zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldSample {
    pub field: FieldVector,
    pub outside: bool,
}

impl FieldSample {
    pub fn inside(field: FieldVector) -> Self {
        FieldSample {
            field,
            outside: false,
        }
    }

    pub fn outside() -> Self {
        FieldSample {
            field: FieldVector::zero(),
            outside: true,
        }
    }

    pub fn magnetic(b: Vector3<f64>) -> Self {
        FieldSample::inside(FieldVector::magnetic(b))
    }
}

/// A field that can be evaluated from many threads at once.
pub trait FieldModel: Send + Sync + fmt::Debug {
    fn evaluate(&self, position: &Vector3<f64>, t: f64) -> FieldSample;

    /// Smallest grid spacing of any underlying field map, in host units.
    fn smallest_spatial_step(&self) -> Option<f64> {
        None
    }
}

/// A field that is zero everywhere.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZeroField;

impl FieldModel for ZeroField {
    fn evaluate(&self, _position: &Vector3<f64>, _t: f64) -> FieldSample {
        FieldSample::inside(FieldVector::zero())
    }
}

/// Smaller of two optional step limits.
pub fn min_step(a: Option<f64>, b: Option<f64>) -> Option<f64> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, None) => a,
        (None, b) => b,
    }
}
