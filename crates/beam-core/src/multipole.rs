// ─────────────────────────────────────────────────────────────────────
// SCPN Beam Core — Higher-Order Multipole Stepper
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Sextupole, octupole and decapole transport.
//!
//! The closed-form field of the element is integrated in its straight
//! local frame with a midpoint step, and the error comes from doubling.
//! The field polynomial holds for any transverse offset, so there is no
//! fallback branch. The momentum direction is renormalised after each
//! step.

use crate::integrator::{Integrator, IntegratorType, StepMode, StepResult, StepperBase};
use beam_field::model::FieldModel;
use beam_field::multipole::{DecapoleField, OctupoleField, SextupoleField};
use beam_math::rk::midpoint_doubling_step;
use beam_math::vector::unit_or_zero;
use beam_types::config::Units;
use beam_types::state::{Particle, PhaseState};
use beam_types::strength::StrengthTable;
use nalgebra::Vector3;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct MultipoleIntegrator {
    base: StepperBase,
    integrator_type: IntegratorType,
    /// Field in the element frame
    model: Arc<dyn FieldModel>,
    /// `brho·kN` in host units; zero means drift
    coefficient: f64,
}

impl MultipoleIntegrator {
    pub fn sextupole(base: StepperBase, strength: &StrengthTable, brho: f64, units: &Units) -> Self {
        MultipoleIntegrator {
            base,
            integrator_type: IntegratorType::Sextupole,
            model: Arc::new(SextupoleField::from_strength(strength, brho, units)),
            coefficient: brho * strength.value_in_units("k2", units),
        }
    }

    pub fn octupole(base: StepperBase, strength: &StrengthTable, brho: f64, units: &Units) -> Self {
        MultipoleIntegrator {
            base,
            integrator_type: IntegratorType::Octupole,
            model: Arc::new(OctupoleField::from_strength(strength, brho, units)),
            coefficient: brho * strength.value_in_units("k3", units),
        }
    }

    pub fn decapole(base: StepperBase, strength: &StrengthTable, brho: f64, units: &Units) -> Self {
        MultipoleIntegrator {
            base,
            integrator_type: IntegratorType::Decapole,
            model: Arc::new(DecapoleField::from_strength(strength, brho, units)),
            coefficient: brho * strength.value_in_units("k4", units),
        }
    }

    fn force(&self, fcof: f64, p: f64, position: &Vector3<f64>, momentum: &Vector3<f64>) -> Vector3<f64> {
        let b = self.model.evaluate(position, 0.0).field.magnetic;
        (momentum / p).cross(&b) * fcof
    }
}

impl Integrator for MultipoleIntegrator {
    fn step(&self, particle: &Particle, y: &PhaseState, _dydx: &PhaseState, h: f64) -> StepResult {
        let fcof = self.base.units.fcof(particle.charge);
        let p = y.momentum_magnitude();
        if fcof == 0.0 || self.coefficient == 0.0 || p == 0.0 {
            return self.base.drift(particle, y, h);
        }

        let local = self.base.frame.to_local(&y.position, &y.momentum, h, false);
        let system = |s: &[f64; 6]| -> [f64; 6] {
            let pos = Vector3::new(s[0], s[1], s[2]);
            let mom = Vector3::new(s[3], s[4], s[5]);
            let f = self.force(fcof, p, &pos, &mom);
            [mom.x / p, mom.y / p, mom.z / p, f.x, f.y, f.z]
        };
        let y0 = [
            local.position.x,
            local.position.y,
            local.position.z,
            local.momentum.x,
            local.momentum.y,
            local.momentum.z,
        ];
        let d0 = system(&y0);
        let (out, err) = midpoint_doubling_step(&system, &y0, &d0, h);

        let position = Vector3::new(out[0], out[1], out[2]);
        let direction = unit_or_zero(&Vector3::new(out[3], out[4], out[5]));
        if !position.iter().all(|v| v.is_finite()) || direction == Vector3::zeros() {
            return self.base.drift(particle, y, h);
        }
        let state = self.base.to_global(
            &local,
            position,
            direction,
            p,
            self.base.advance_time(particle, y, h),
        );
        let error = PhaseState {
            position: self.base.frame.axis_to_global(local.segment, &Vector3::new(err[0], err[1], err[2])),
            momentum: self.base.frame.axis_to_global(local.segment, &Vector3::new(err[3], err[4], err[5])),
            time: 0.0,
        };
        let curvature = self.force(fcof, p, &local.position, &local.momentum).norm() / p;
        StepResult {
            state,
            error,
            dist_chord: h * h * curvature / 8.0,
            mode: StepMode::Analytic,
        }
    }

    fn integrator_type(&self) -> IntegratorType {
        self.integrator_type
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::integrator::DriftIntegrator;
    use crate::navigator::CoordinateTransform;
    use beam_types::config::StepperSettings;

    const BRHO: f64 = 4.333;

    fn base() -> StepperBase {
        let units = Units::default();
        StepperBase::new(
            Arc::new(CoordinateTransform::identity()),
            StepperSettings::default(),
            units,
            Arc::new(DriftIntegrator::new(units)),
        )
    }

    fn sextupole(k2: f64) -> MultipoleIntegrator {
        let table = StrengthTable::new().with("k2", k2).unwrap();
        MultipoleIntegrator::sextupole(base(), &table, BRHO, &Units::default())
    }

    fn reference(x: f64, y: f64) -> (Particle, PhaseState) {
        let particle = Particle::proton();
        let p = particle.momentum_for_rigidity(BRHO);
        (particle, PhaseState::new(Vector3::new(x, y, 0.0), Vector3::new(0.0, 0.0, p)))
    }

    #[test]
    fn test_zero_strength_is_drift() {
        let (particle, y) = reference(0.01, 0.0);
        let r = sextupole(0.0).step(&particle, &y, &PhaseState::zero(), 0.4);
        assert_eq!(r.mode, StepMode::Drift);
        assert_eq!(r.error, PhaseState::zero());
        assert!((r.state.position.z - 0.4).abs() < 1e-15);
    }

    #[test]
    fn test_on_axis_particle_goes_straight() {
        let (particle, y) = reference(0.0, 0.0);
        let r = sextupole(10.0).step(&particle, &y, &PhaseState::zero(), 0.5);
        assert_eq!(r.mode, StepMode::Analytic);
        assert!(r.state.position.xy().norm() < 1e-15);
        assert!((r.state.position.z - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_short_step_matches_kick() {
        let (particle, y) = reference(0.01, 0.004);
        let h = 0.01;
        let r = sextupole(10.0).step(&particle, &y, &PhaseState::zero(), h);
        let u = r.state.direction();
        // Δx' = -(k2·h/2)(x² - y²), Δy' = (k2·h)·x·y
        let dxp = -0.5 * 10.0 * h * (0.01f64.powi(2) - 0.004f64.powi(2));
        let dyp = 10.0 * h * 0.01 * 0.004;
        assert!((u.x - dxp).abs() < 1e-9, "x' = {}", u.x);
        assert!((u.y - dyp).abs() < 1e-9, "y' = {}", u.y);
    }

    #[test]
    fn test_momentum_magnitude_preserved() {
        let table = StrengthTable::new().with("k3", 300.0).unwrap();
        let oct = MultipoleIntegrator::octupole(base(), &table, BRHO, &Units::default());
        let particle = Particle::proton();
        let y = PhaseState::new(Vector3::new(0.02, -0.01, 0.0), Vector3::new(0.02, 0.01, 1.3));
        let r = oct.step(&particle, &y, &PhaseState::zero(), 0.3);
        let p = y.momentum_magnitude();
        assert!((r.state.momentum_magnitude() - p).abs() / p < 1e-12);
        assert!(r.error.momentum.norm() > 0.0);
        assert!(r.error.momentum.norm() / p < 1e-6);
    }

    #[test]
    fn test_integrator_types() {
        let table = StrengthTable::new().with("k4", 1.0).unwrap();
        let deca = MultipoleIntegrator::decapole(base(), &table, BRHO, &Units::default());
        assert_eq!(deca.integrator_type(), IntegratorType::Decapole);
        assert_eq!(sextupole(1.0).integrator_type(), IntegratorType::Sextupole);
    }
}
