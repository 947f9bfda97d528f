// ─────────────────────────────────────────────────────────────────────
// SCPN Beam Core — Property-Based Tests (proptest) for beam-core
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Property-based tests for beam-core using proptest.
//!
//! Covers: frame round trips, drift limits, momentum conservation of the
//! analytic steppers, quadrupole step splitting.

use beam_core::integrator::{DriftIntegrator, Integrator, StepMode, StepperBase};
use beam_core::multipole::MultipoleIntegrator;
use beam_core::navigator::CoordinateTransform;
use beam_core::quadrupole::QuadrupoleIntegrator;
use beam_core::solenoid::SolenoidIntegrator;
use beam_core::thin::MultipoleThinIntegrator;
use beam_types::config::{StepperSettings, Units};
use beam_types::state::{Particle, PhaseState};
use beam_types::strength::StrengthTable;
use nalgebra::{Isometry3, Vector3};
use proptest::prelude::*;
use std::sync::Arc;

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

fn quadrupole(k1: f64) -> QuadrupoleIntegrator {
    let table = StrengthTable::new().with("k1", k1).unwrap();
    QuadrupoleIntegrator::from_strength(base(), &table, BRHO, &Units::default())
}

/// Reference proton with transverse offset and slopes.
fn proton(x: f64, y: f64, xp: f64, yp: f64) -> (Particle, PhaseState) {
    let particle = Particle::proton();
    let p = particle.momentum_for_rigidity(BRHO);
    let zp = (1.0 - xp * xp - yp * yp).sqrt();
    (particle, PhaseState::new(Vector3::new(x, y, 0.0), Vector3::new(xp, yp, zp) * p))
}

fn analytic_steppers() -> Vec<Box<dyn Integrator>> {
    let units = Units::default();
    let table = StrengthTable::from_pairs([("k1", 0.34), ("k2", 2.0), ("ks", 0.2)]).unwrap();
    vec![
        Box::new(quadrupole(0.34)),
        Box::new(SolenoidIntegrator::from_strength(base(), &table, BRHO)),
        Box::new(MultipoleIntegrator::sextupole(base(), &table, BRHO, &units)),
        Box::new(MultipoleThinIntegrator::from_strength(base(), &table, BRHO, &units)),
    ]
}

// ── Coordinate Transform Properties ──────────────────────────────────

proptest! {
    /// Local coordinates of a straight element map back exactly.
    #[test]
    fn straight_round_trip(x in -0.1f64..0.1, y in -0.1f64..0.1, z in -0.9f64..0.9,
                           px in -0.3f64..0.3, py in -0.3f64..0.3,
                           shift in -2.0f64..2.0, yaw in -0.5f64..0.5, h in 1e-4f64..10.0) {
        let reference = Isometry3::new(Vector3::new(0.0, 0.0, shift), Vector3::new(0.0, yaw, 0.0));
        let frame = CoordinateTransform::straight(reference, 2.0);
        let position = reference * nalgebra::Point3::new(x, y, z);
        let momentum = Vector3::new(px, py, 1.0);
        let local = frame.to_local(&position.coords, &momentum, h, false);
        let (p2, m2) = frame.to_global(&local);
        prop_assert!((p2 - position.coords).norm() < 1e-12);
        prop_assert!((m2 - momentum).norm() < 1e-12);
    }

    /// Curvilinear coordinates of a bend map back exactly.
    #[test]
    fn curved_round_trip(x in -0.05f64..0.05, y in -0.05f64..0.05, zf in -0.45f64..0.45,
                         angle in -0.3f64..0.3, h in 1e-4f64..10.0) {
        prop_assume!(angle.abs() > 1e-3);
        let frame = CoordinateTransform::bent(Isometry3::identity(), angle, 1.0);
        let position = Vector3::new(x, y, zf);
        let momentum = Vector3::new(0.01, -0.02, 1.0);
        let local = frame.to_local(&position, &momentum, h, true);
        let (p2, m2) = frame.to_global(&local);
        prop_assert!((p2 - position).norm() < 1e-12, "{p2:?} vs {position:?}");
        prop_assert!((m2 - momentum).norm() < 1e-12);
    }
}

// ── Stepper Properties ───────────────────────────────────────────────

proptest! {
    /// Without a field a quadrupole step is a straight line with no error.
    #[test]
    fn zero_strength_is_drift(x in -0.01f64..0.01, y in -0.01f64..0.01,
                              xp in -0.05f64..0.05, yp in -0.05f64..0.05, h in 1e-3f64..2.0) {
        let (particle, state) = proton(x, y, xp, yp);
        let r = quadrupole(0.0).step(&particle, &state, &PhaseState::zero(), h);
        prop_assert_eq!(r.mode, StepMode::Drift);
        prop_assert_eq!(r.error, PhaseState::zero());
        let expected = state.position + state.direction() * h;
        prop_assert!((r.state.position - expected).norm() < 1e-12);
        prop_assert_eq!(r.state.momentum, state.momentum);
    }

    /// Static magnetic fields do no work: |p| is kept by every analytic stepper.
    #[test]
    fn momentum_magnitude_conserved(x in -0.01f64..0.01, y in -0.01f64..0.01,
                                    xp in -0.05f64..0.05, yp in -0.05f64..0.05, h in 1e-3f64..0.5) {
        let (particle, state) = proton(x, y, xp, yp);
        let p = state.momentum_magnitude();
        for stepper in analytic_steppers() {
            let r = stepper.step(&particle, &state, &PhaseState::zero(), h);
            let rel = (r.state.momentum_magnitude() - p).abs() / p;
            prop_assert!(rel < 1e-10, "{:?}: relative |p| change {rel}", stepper.integrator_type());
        }
    }

    /// N quadrupole sub-steps transport the transverse coordinates like one step.
    #[test]
    fn quadrupole_steps_compose(x in 1e-4f64..0.01, y in -0.01f64..0.01,
                                xp in -0.01f64..0.01, yp in -0.01f64..0.01,
                                h in 0.01f64..1.0, n in 2usize..10) {
        let quad = quadrupole(0.34);
        let (particle, state) = proton(x, y, xp, yp);
        let whole = quad.step(&particle, &state, &PhaseState::zero(), h).state;
        let mut split = state;
        for _ in 0..n {
            split = quad.step(&particle, &split, &PhaseState::zero(), h / n as f64).state;
        }
        prop_assert!((whole.position.x - split.position.x).abs() < 1e-9);
        prop_assert!((whole.position.y - split.position.y).abs() < 1e-9);
        prop_assert!((whole.direction() - split.direction()).norm() < 1e-9);
    }
}
