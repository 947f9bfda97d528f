// ─────────────────────────────────────────────────────────────────────
// SCPN Beam Core — Generic Steppers
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Runge–Kutta family over the full equation of motion. These handle any
//! field class and serve as the fallback of the analytic steppers.

use crate::equation::EquationOfMotion;
use crate::integrator::{Integrator, IntegratorType, StepMode, StepResult};
use beam_math::rk::{cash_karp_step, euler_step, rk4_doubling_step};
use beam_types::state::{Particle, PhaseState, PHASE_DIM};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenericKind {
    Euler,
    Rk4,
    CashKarp,
}

#[derive(Debug, Clone)]
pub struct GenericIntegrator {
    kind: GenericKind,
    equation: Arc<EquationOfMotion>,
}

impl GenericIntegrator {
    pub fn new(kind: GenericKind, equation: Arc<EquationOfMotion>) -> Self {
        GenericIntegrator { kind, equation }
    }

    pub fn rk4(equation: Arc<EquationOfMotion>) -> Self {
        GenericIntegrator::new(GenericKind::Rk4, equation)
    }

    pub fn equation(&self) -> &Arc<EquationOfMotion> {
        &self.equation
    }
}

/// Sagitta `h²·κ/8` from the curvature implied by the force term.
fn chord_distance(y: &PhaseState, dydx: &PhaseState, h: f64) -> f64 {
    let p = y.momentum_magnitude();
    if p == 0.0 {
        return 0.0;
    }
    let direction = y.direction();
    let transverse = dydx.momentum - direction * dydx.momentum.dot(&direction);
    h * h * transverse.norm() / (8.0 * p)
}

impl Integrator for GenericIntegrator {
    fn step(&self, particle: &Particle, y: &PhaseState, dydx: &PhaseState, h: f64) -> StepResult {
        let system = self.equation.bind(particle);
        let y0 = y.to_array();
        let d0 = dydx.to_array();
        let (out, err) = match self.kind {
            GenericKind::Euler => {
                // error from the change in slope over the step
                let out = euler_step(&y0, &d0, h);
                let d1 = self.equation.derivatives(particle, &out);
                let mut err = [0.0; PHASE_DIM];
                for i in 0..PHASE_DIM {
                    err[i] = 0.5 * h * (d1[i] - d0[i]);
                }
                (out, err)
            }
            GenericKind::Rk4 => rk4_doubling_step(&system, &y0, &d0, h),
            GenericKind::CashKarp => cash_karp_step(&system, &y0, &d0, h),
        };
        StepResult {
            state: PhaseState::from_array(&out),
            error: PhaseState::from_array(&err),
            dist_chord: chord_distance(y, dydx, h),
            mode: StepMode::Analytic,
        }
    }

    fn integrator_type(&self) -> IntegratorType {
        match self.kind {
            GenericKind::Euler => IntegratorType::Euler,
            GenericKind::Rk4 => IntegratorType::Rk4,
            GenericKind::CashKarp => IntegratorType::CashKarp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use beam_field::model::ZeroField;
    use beam_field::multipole::SolenoidField;
    use beam_field::types::FieldClass;
    use beam_types::config::Units;
    use nalgebra::Vector3;

    fn equation(field: Arc<dyn beam_field::model::FieldModel>) -> Arc<EquationOfMotion> {
        Arc::new(EquationOfMotion::new(field, FieldClass::Magnetic, Units::default()))
    }

    #[test]
    fn test_zero_field_is_straight_line() {
        let eq = equation(Arc::new(ZeroField));
        let particle = Particle::proton();
        let y = PhaseState::new(Vector3::zeros(), Vector3::new(0.0, 0.1, 1.0));
        let dydx = eq.derivative_state(&particle, &y);
        for kind in [GenericKind::Euler, GenericKind::Rk4, GenericKind::CashKarp] {
            let r = GenericIntegrator::new(kind, Arc::clone(&eq)).step(&particle, &y, &dydx, 0.5);
            let expected = y.position + 0.5 * y.direction();
            assert!((r.state.position - expected).norm() < 1e-12, "{kind:?}");
            assert!(r.error.position.norm() < 1e-12);
            assert_eq!(r.dist_chord, 0.0);
        }
    }

    #[test]
    fn test_rk4_keeps_momentum_in_solenoid() {
        let eq = equation(Arc::new(SolenoidField::new(2.0)));
        let particle = Particle::proton();
        let mut y = PhaseState::new(Vector3::zeros(), Vector3::new(0.05, 0.0, 1.0));
        let p0 = y.momentum_magnitude();
        let rk4 = GenericIntegrator::rk4(Arc::clone(&eq));
        for _ in 0..100 {
            let dydx = eq.derivative_state(&particle, &y);
            y = rk4.step(&particle, &y, &dydx, 0.01).state;
        }
        assert!((y.momentum_magnitude() - p0).abs() / p0 < 1e-9);
        // uniform Bz leaves pz untouched
        assert!((y.momentum.z - 1.0).abs() < 1e-12);
    }
}
