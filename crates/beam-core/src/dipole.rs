// ─────────────────────────────────────────────────────────────────────
// SCPN Beam Core — Dipole Steppers
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Two dipole steppers.
//!
//! [`DipoleRodriguesIntegrator`] follows the exact helix in the uniform
//! field found at the start of the step, rotating the direction about B̂
//! with Rodrigues' formula.
//!
//! [`DipoleMatrixIntegrator`] works in the curvilinear frame of the bend
//! and applies the linear sector-bend map
//!
//! ```text
//! x'' = -(h0·hp + K)·x + (h0 - hp)
//! y'' = K·y
//! ```
//!
//! where `h0` is the design curvature, `hp` the particle's own curvature
//! and `K` an optional quadrupole component.

use crate::equation::EquationOfMotion;
use crate::integrator::{Integrator, IntegratorType, StepMode, StepResult, StepperBase};
use beam_field::model::FieldModel;
use beam_math::transfer::ThickLens;
use beam_math::vector::{finite_or, longitudinal};
use beam_types::config::Units;
use beam_types::state::{Particle, PhaseState};
use beam_types::strength::StrengthTable;
use nalgebra::Vector3;
use std::f64::consts::FRAC_PI_2;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct DipoleRodriguesIntegrator {
    base: StepperBase,
    equation: Arc<EquationOfMotion>,
}

impl DipoleRodriguesIntegrator {
    pub fn new(base: StepperBase, equation: Arc<EquationOfMotion>) -> Self {
        DipoleRodriguesIntegrator { base, equation }
    }
}

/// Helix in uniform `b` for a unit direction `u`: position offset and new
/// direction after path `s`, with turning rate `omega` about `b̂`.
pub(crate) fn helix(u: &Vector3<f64>, b_hat: &Vector3<f64>, omega: f64, s: f64) -> (Vector3<f64>, Vector3<f64>) {
    let parallel = b_hat * u.dot(b_hat);
    let perp = u - parallel;
    let binormal = b_hat.cross(&perp);
    let (sin, cos) = (omega * s).sin_cos();
    let direction = parallel + perp * cos + binormal * sin;
    let offset = parallel * s + perp * (sin / omega) + binormal * ((1.0 - cos) / omega);
    (offset, direction)
}

impl Integrator for DipoleRodriguesIntegrator {
    fn step(&self, particle: &Particle, y: &PhaseState, dydx: &PhaseState, h: f64) -> StepResult {
        let fcof = self.base.units.fcof(particle.charge);
        let p = y.momentum_magnitude();
        let b = self.equation.field().evaluate(&y.position, y.time).field.magnetic;
        let b_mag = b.norm();
        if fcof == 0.0 || b_mag == 0.0 || p == 0.0 {
            return self.base.drift(particle, y, h);
        }
        let omega = -fcof * b_mag / p;
        let radius = 1.0 / omega.abs();
        if radius < self.base.settings.minimum_radius_of_curvature {
            return self.base.fall_back(particle, y, dydx, h, "radius below minimum");
        }
        let u = y.direction();
        let (offset, direction) = helix(&u, &(b / b_mag), omega, h);
        let state = PhaseState {
            position: y.position + offset,
            momentum: direction * p,
            time: self.base.advance_time(particle, y, h),
        };
        if !state.is_finite() {
            return self.base.fall_back(particle, y, dydx, h, "non-finite helix");
        }
        // curvature of the helix is |ω|·sin(pitch)
        let curvature = omega.abs() * u.cross(&(b / b_mag)).norm();
        let dist_chord = h * h * curvature / 8.0;
        StepResult::exact(state, dist_chord, StepMode::Analytic)
    }

    fn integrator_type(&self) -> IntegratorType {
        IntegratorType::DipoleRodrigues
    }
}

#[derive(Debug, Clone)]
pub struct DipoleMatrixIntegrator {
    base: StepperBase,
    /// Vertical field [T]
    field: f64,
    /// Quadrupole gradient [T per host length]
    gradient: f64,
    /// Reference rigidity [T·m]
    brho: f64,
}

impl DipoleMatrixIntegrator {
    pub fn new(base: StepperBase, field: f64, gradient: f64, brho: f64) -> Self {
        DipoleMatrixIntegrator {
            base,
            field,
            gradient,
            brho,
        }
    }

    pub fn from_strength(base: StepperBase, strength: &StrengthTable, brho: f64, units: &Units) -> Self {
        DipoleMatrixIntegrator::new(
            base,
            strength.get("field"),
            brho * strength.value_in_units("k1", units),
            brho,
        )
    }

    /// Magnet bending radius for the reference particle [host length].
    pub fn magnet_radius(&self) -> f64 {
        self.brho * self.base.units.metre / self.field
    }

    pub fn field(&self) -> f64 {
        self.field
    }

    pub fn base(&self) -> &StepperBase {
        &self.base
    }
}

impl Integrator for DipoleMatrixIntegrator {
    fn step(&self, particle: &Particle, y: &PhaseState, dydx: &PhaseState, h: f64) -> StepResult {
        let fcof = self.base.units.fcof(particle.charge);
        let p = y.momentum_magnitude();
        if fcof == 0.0 || (self.field == 0.0 && self.gradient == 0.0) || p == 0.0 {
            return self.base.drift(particle, y, h);
        }
        let Some(bend) = self.base.frame.bend() else {
            return self.base.fall_back(particle, y, dydx, h, "no design bend");
        };
        let h0 = bend.curvature();
        let hp = fcof * self.field / p;
        if h0 * hp < 0.0 {
            return self.base.fall_back(particle, y, dydx, h, "bends against the design orbit");
        }
        if hp != 0.0 && 1.0 / hp.abs() < self.base.settings.minimum_radius_of_curvature {
            return self.base.fall_back(particle, y, dydx, h, "radius below minimum");
        }

        let local = self.base.frame.to_local(&y.position, &y.momentum, h, true);
        let unit = local.momentum / p;
        if !self.base.is_paraxial(&unit) {
            return self.base.fall_back(particle, y, dydx, h, "non-paraxial");
        }
        let phi0 = bend.partial_angle(local.position.z);
        let phi1 = phi0 + h * h0;
        if phi1.abs() >= FRAC_PI_2 {
            return self.base.fall_back(particle, y, dydx, h, "step leaves the bend");
        }

        let k = fcof * self.gradient / p;
        let (x1, xp1) = ThickLens::new(h0 * hp + k, h).apply(local.position.x, unit.x, h0 - hp);
        let (y1, yp1) = ThickLens::new(-k, h).apply(local.position.y, unit.y, 0.0);
        let zp1 = longitudinal(xp1, yp1, unit.z);
        let z1 = finite_or(bend.chord_z(phi1), local.position.z + h * unit.z);

        let state = self.base.to_global(
            &local,
            Vector3::new(x1, y1, z1),
            Vector3::new(xp1, yp1, zp1),
            p,
            self.base.advance_time(particle, y, h),
        );
        let dist_chord = if hp != 0.0 { h * h * hp.abs() / 8.0 } else { 0.0 };
        StepResult::exact(state, dist_chord, StepMode::Analytic)
    }

    fn integrator_type(&self) -> IntegratorType {
        IntegratorType::DipoleMatrix
    }
}
