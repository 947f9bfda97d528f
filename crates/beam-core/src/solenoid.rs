// ─────────────────────────────────────────────────────────────────────
// SCPN Beam Core — Solenoid Stepper
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Hard-edge solenoid map, coupling x and y through a rotation:
//!
//! ```text
//! ( C²       S2/2ω   S2/2    S²/ω  )
//! ( ωS2/2    C²     -ωS²     S2/2  )
//! ( -S2/2   -S²/ω    C²      S2/2ω )
//! ( ωS²     -S2/2   -ωS2/2   C²    )
//! ```
//!
//! with `C = cos ωL`, `S = sin ωL`, `S2 = sin 2ωL` and `ω = -fcof·B/(2|p|)`.

use crate::integrator::{Integrator, IntegratorType, StepMode, StepResult, StepperBase};
use beam_math::vector::longitudinal;
use beam_types::state::{Particle, PhaseState};
use beam_types::strength::StrengthTable;
use nalgebra::Vector3;

/// Below this |ω| the solenoid is treated as a drift.
const MIN_OMEGA: f64 = 1e-12;
const MIN_CURVATURE: f64 = 1e-15;

#[derive(Debug, Clone)]
pub struct SolenoidIntegrator {
    base: StepperBase,
    /// Longitudinal field [T]
    field: f64,
}

impl SolenoidIntegrator {
    pub fn new(base: StepperBase, field: f64) -> Self {
        SolenoidIntegrator { base, field }
    }

    pub fn from_strength(base: StepperBase, strength: &StrengthTable, brho: f64) -> Self {
        SolenoidIntegrator::new(base, brho * strength.get("ks"))
    }
}

impl Integrator for SolenoidIntegrator {
    fn step(&self, particle: &Particle, y: &PhaseState, dydx: &PhaseState, h: f64) -> StepResult {
        let fcof = self.base.units.fcof(particle.charge);
        let p = y.momentum_magnitude();
        if fcof == 0.0 || self.field == 0.0 || p == 0.0 {
            return self.base.drift(particle, y, h);
        }
        let omega = -0.5 * fcof * self.field / p;
        if omega.abs() < MIN_OMEGA {
            return self.base.drift(particle, y, h);
        }

        let local = self.base.frame.to_local(&y.position, &y.momentum, h, false);
        let unit = local.momentum / p;
        let (x0, y0, z0) = (local.position.x, local.position.y, local.position.z);
        let (xp0, yp0, zp0) = (unit.x, unit.y, unit.z);

        let curvature = omega.abs() * Vector3::new(-zp0 * x0, zp0 * y0, x0 * xp0 - y0 * yp0).norm();
        if curvature < MIN_CURVATURE {
            return self.base.drift(particle, y, h);
        }
        let dist_chord = h * h * curvature / 8.0;
        if !self.base.is_paraxial(&unit) {
            let mut result = self.base.fall_back(particle, y, dydx, h, "non-paraxial");
            result.dist_chord = result.dist_chord.max(dist_chord);
            return result;
        }

        let mut dz = h * zp0;
        let wl = omega * dz;
        let (sin, cos) = wl.sin_cos();
        let (cos_sq, sin_sq, sin2) = (cos * cos, sin * sin, (2.0 * wl).sin());

        let mut x1 = x0 * cos_sq + 0.5 * xp0 / omega * sin2 + 0.5 * y0 * sin2 + yp0 / omega * sin_sq;
        let xp1 = 0.5 * x0 * omega * sin2 + xp0 * cos_sq - omega * y0 * sin_sq + 0.5 * yp0 * sin2;
        let mut y1 = -0.5 * x0 * sin2 - xp0 / omega * sin_sq + y0 * cos_sq + 0.5 * yp0 / omega * sin2;
        let yp1 = x0 * omega * sin_sq - 0.5 * xp0 * sin2 - 0.5 * omega * y0 * sin2 + yp0 * cos_sq;
        let zp1 = longitudinal(xp1, yp1, zp0);

        // keep the chord no longer than the requested step
        let (mut dx, mut dy) = (x1 - x0, y1 - y0);
        let ratio = (dx * dx + dy * dy + dz * dz) / (h * h);
        if ratio > 1.0 + self.base.settings.solenoid_chord_tolerance {
            let scale = ratio.sqrt();
            dx /= scale;
            dy /= scale;
            dz /= scale;
            x1 = x0 + dx;
            y1 = y0 + dy;
        }

        let state = self.base.to_global(
            &local,
            Vector3::new(x1, y1, z0 + dz),
            Vector3::new(xp1, yp1, zp1),
            p,
            self.base.advance_time(particle, y, h),
        );
        StepResult::exact(state, dist_chord, StepMode::Analytic)
    }

    fn integrator_type(&self) -> IntegratorType {
        IntegratorType::Solenoid
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::integrator::DriftIntegrator;
    use crate::navigator::CoordinateTransform;
    use beam_types::config::{StepperSettings, Units};
    use std::sync::Arc;

    fn integrator(ks: f64) -> SolenoidIntegrator {
        let units = Units::default();
        let base = StepperBase::new(
            Arc::new(CoordinateTransform::identity()),
            StepperSettings::default(),
            units,
            Arc::new(DriftIntegrator::new(units)),
        );
        let table = StrengthTable::new().with("ks", ks).unwrap();
        SolenoidIntegrator::from_strength(base, &table, 4.333)
    }

    #[test]
    fn test_zero_field_is_drift() {
        let sol = integrator(0.0);
        let particle = Particle::proton();
        let y = PhaseState::new(Vector3::new(0.001, 0.0, 0.0), Vector3::new(0.0, 0.0, 1.0));
        let r = sol.step(&particle, &y, &PhaseState::zero(), 0.3);
        assert_eq!(r.mode, StepMode::Drift);
        assert!((r.state.position.z - 0.3).abs() < 1e-15);
    }

    #[test]
    fn test_parallel_beam_focuses() {
        let sol = integrator(0.2);
        let particle = Particle::proton();
        let p = particle.momentum_for_rigidity(4.333);
        let y = PhaseState::new(Vector3::new(0.002, -0.001, 0.0), Vector3::new(0.0, 0.0, p));
        let r = sol.step(&particle, &y, &PhaseState::zero(), 0.5);
        assert_eq!(r.mode, StepMode::Analytic);
        // a parallel beam shrinks by |cos ωL|, ω = -ks/2
        let r0 = y.position.xy().norm();
        let r1 = r.state.position.xy().norm();
        let expected = r0 * (0.1f64 * 0.5).cos();
        assert!((r1 - expected).abs() < 1e-9, "r1 = {r1}, expected = {expected}");
        assert!((r.state.momentum_magnitude() - p).abs() / p < 1e-9);
    }

    #[test]
    fn test_chord_never_exceeds_step() {
        let sol = integrator(5.0);
        let particle = Particle::proton();
        let y = PhaseState::new(Vector3::new(0.01, 0.0, 0.0), Vector3::new(0.02, 0.0, 1.0));
        let h = 0.05;
        let r = sol.step(&particle, &y, &PhaseState::zero(), h);
        let chord = (r.state.position - y.position).norm();
        assert!(chord <= h * (1.0 + 1e-6), "chord = {chord}");
    }
}
