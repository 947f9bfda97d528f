// ─────────────────────────────────────────────────────────────────────
// SCPN Beam Core — Quadrupole Stepper
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Thick-lens transport through a normal quadrupole.
//!
//! In the element frame the paraxial motion decouples into
//! `x'' = -K x` and `y'' = +K y` with `K = fcof·g/|p|`. Particles off the
//! paraxial cone, or curving tighter than the minimum radius, go to the
//! fallback stepper.

use crate::integrator::{Integrator, IntegratorType, StepMode, StepResult, StepperBase};
use beam_math::transfer::ThickLens;
use beam_math::vector::longitudinal;
use beam_types::config::Units;
use beam_types::state::{Particle, PhaseState};
use beam_types::strength::StrengthTable;
use nalgebra::Vector3;

/// Below this inverse radius the particle is treated as on axis.
const MIN_CURVATURE: f64 = 1e-15;

#[derive(Debug, Clone)]
pub struct QuadrupoleIntegrator {
    base: StepperBase,
    /// Field gradient [T per host length]
    gradient: f64,
}

impl QuadrupoleIntegrator {
    pub fn new(base: StepperBase, gradient: f64) -> Self {
        QuadrupoleIntegrator { base, gradient }
    }

    pub fn from_strength(base: StepperBase, strength: &StrengthTable, brho: f64, units: &Units) -> Self {
        QuadrupoleIntegrator::new(base, brho * strength.value_in_units("k1", units))
    }

    pub fn gradient(&self) -> f64 {
        self.gradient
    }
}

impl Integrator for QuadrupoleIntegrator {
    fn step(&self, particle: &Particle, y: &PhaseState, dydx: &PhaseState, h: f64) -> StepResult {
        let fcof = self.base.units.fcof(particle.charge);
        let p = y.momentum_magnitude();
        if fcof == 0.0 || self.gradient == 0.0 || p == 0.0 {
            return self.base.drift(particle, y, h);
        }
        let kappa = fcof * self.gradient / p;

        let local = self.base.frame.to_local(&y.position, &y.momentum, h, false);
        let unit = local.momentum / p;
        let (x0, y0, z0) = (local.position.x, local.position.y, local.position.z);
        let (xp0, yp0, zp0) = (unit.x, unit.y, unit.z);

        let curvature = kappa.abs() * Vector3::new(zp0 * x0, zp0 * y0, x0 * xp0 - y0 * yp0).norm();
        if curvature < MIN_CURVATURE {
            return self.base.drift(particle, y, h);
        }
        let radius = 1.0 / curvature;
        if !self.base.is_paraxial(&unit) {
            return self.base.fall_back(particle, y, dydx, h, "non-paraxial");
        }
        if radius < self.base.settings.minimum_radius_of_curvature {
            return self.base.fall_back(particle, y, dydx, h, "radius below minimum");
        }

        let (x1, xp1) = ThickLens::new(kappa, h).apply(x0, xp0, 0.0);
        let (y1, yp1) = ThickLens::new(-kappa, h).apply(y0, yp0, 0.0);
        let zp1 = longitudinal(xp1, yp1, zp0);

        let (dx, dy) = (x1 - x0, y1 - y0);
        let mut dz = (h * h - dx * dx - dy * dy).sqrt();
        if !dz.is_finite() {
            dz = h * zp0;
        }

        let state = self.base.to_global(
            &local,
            Vector3::new(x1, y1, z0 + dz),
            Vector3::new(xp1, yp1, zp1),
            p,
            self.base.advance_time(particle, y, h),
        );
        StepResult::exact(state, h * h / (8.0 * radius), StepMode::Analytic)
    }

    fn integrator_type(&self) -> IntegratorType {
        IntegratorType::Quadrupole
    }
}
