// ─────────────────────────────────────────────────────────────────────
// SCPN Beam Core — Dipole Fringe Stepper
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Dipole edge: the bulk bend followed by a poleface-rotation kick.
//!
//! ```text
//! x' += f · tan(e)      · hp · x
//! y' -= f · tan(e - fc) · hp · y
//! ```
//!
//! with `e` the poleface angle, `fc` the fringe-field correction, `hp`
//! the particle curvature in the magnet and `f = min(h / thin, 1)`.
//! The kick is only applied when the step is the thin edge element
//! itself. Longer steps, e.g. the host sampling the field, get the bulk
//! bend alone.

use crate::dipole::DipoleMatrixIntegrator;
use crate::integrator::{Integrator, IntegratorType, StepResult};
use crate::navigator::LocalStep;
use beam_math::vector::{longitudinal, unit_or_zero};
use beam_types::state::{Particle, PhaseState};
use beam_types::strength::StrengthTable;
use nalgebra::Vector3;

#[derive(Debug, Clone)]
pub struct DipoleFringeIntegrator {
    bulk: DipoleMatrixIntegrator,
    /// [rad]
    poleface_angle: f64,
    /// [rad]
    fringe_correction: f64,
}

impl DipoleFringeIntegrator {
    pub fn new(bulk: DipoleMatrixIntegrator, poleface_angle: f64, fringe_correction: f64) -> Self {
        DipoleFringeIntegrator {
            bulk,
            poleface_angle,
            fringe_correction,
        }
    }

    pub fn from_strength(bulk: DipoleMatrixIntegrator, strength: &StrengthTable) -> Self {
        DipoleFringeIntegrator::new(bulk, strength.get("polefaceangle"), strength.get("fringecorr"))
    }

    /// Whether a step of length `h` is the edge element rather than a sub-step or a field probe.
    pub fn is_edge_step(&self, h: f64) -> bool {
        let settings = &self.bulk.base().settings;
        let thin = settings.thin_element_length;
        h <= settings.field_sampling_step && (h - thin).abs() <= settings.edge_kick_tolerance * thin
    }
}

impl Integrator for DipoleFringeIntegrator {
    fn step(&self, particle: &Particle, y: &PhaseState, dydx: &PhaseState, h: f64) -> StepResult {
        let bulk = self.bulk.step(particle, y, dydx, h);
        if !self.is_edge_step(h) {
            return bulk;
        }
        let base = self.bulk.base();
        let fcof = base.units.fcof(particle.charge);
        let p = bulk.state.momentum_magnitude();
        if fcof == 0.0 || self.bulk.field() == 0.0 || p == 0.0 {
            return bulk;
        }

        let local = base.frame.to_local(&bulk.state.position, &bulk.state.momentum, h, true);
        let unit = local.momentum / p;
        if !base.is_paraxial(&unit) {
            return bulk;
        }
        let fraction = (h / base.settings.thin_element_length).min(1.0);
        let hp = fcof * self.bulk.field() / p;
        let xp1 = unit.x + fraction * self.poleface_angle.tan() * hp * local.position.x;
        let yp1 = unit.y - fraction * (self.poleface_angle - self.fringe_correction).tan() * hp * local.position.y;
        let zp1 = longitudinal(xp1, yp1, unit.z);
        let direction = unit_or_zero(&Vector3::new(xp1, yp1, zp1));

        let (_, momentum) = base.frame.to_global(&LocalStep {
            momentum: direction * p,
            ..local
        });
        let mut result = bulk;
        result.state.momentum = momentum;
        result
    }

    fn integrator_type(&self) -> IntegratorType {
        IntegratorType::DipoleFringe
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::integrator::{DriftIntegrator, StepperBase};
    use crate::navigator::CoordinateTransform;
    use beam_types::config::{StepperSettings, Units};
    use nalgebra::Isometry3;
    use std::sync::Arc;

    const BRHO: f64 = 4.333;
    const FIELD: f64 = 1.2;
    const LENGTH: f64 = 0.361;
    const THIN: f64 = 1e-6;

    fn frame() -> CoordinateTransform {
        CoordinateTransform::bent(Isometry3::identity(), FIELD / BRHO * LENGTH, LENGTH)
    }

    fn bulk() -> DipoleMatrixIntegrator {
        let units = Units::default();
        let base = StepperBase::new(
            Arc::new(frame()),
            StepperSettings::default(),
            units,
            Arc::new(DriftIntegrator::new(units)),
        );
        let table = StrengthTable::new().with("field", FIELD).unwrap();
        DipoleMatrixIntegrator::from_strength(base, &table, BRHO, &units)
    }

    fn fringe(e: f64, fc: f64) -> DipoleFringeIntegrator {
        let table = StrengthTable::new()
            .with("polefaceangle", e)
            .unwrap()
            .with("fringecorr", fc)
            .unwrap();
        DipoleFringeIntegrator::from_strength(bulk(), &table)
    }

    /// Reference particle at the entrance, displaced transversely in the curvilinear frame.
    fn entrance(x: f64, y: f64) -> (Particle, PhaseState) {
        let particle = Particle::proton();
        let p = particle.momentum_for_rigidity(BRHO);
        let f = frame();
        let half_chord = 0.5 * f.bend().unwrap().chord_length();
        let axis = f.to_local(&Vector3::new(0.0, 0.0, -half_chord), &Vector3::new(0.0, 0.0, 1.0), 0.0, true);
        let local = LocalStep {
            position: Vector3::new(x, y, -half_chord),
            momentum: Vector3::new(0.0, 0.0, p),
            ..axis
        };
        let (position, momentum) = f.to_global(&local);
        (particle, PhaseState::new(position, momentum))
    }

    fn local_direction(state: &PhaseState) -> (Vector3<f64>, Vector3<f64>) {
        let local = frame().to_local(&state.position, &state.momentum, THIN, true);
        (local.position, local.momentum / state.momentum_magnitude())
    }

    #[test]
    fn test_zero_poleface_is_bulk_only() {
        let (particle, y) = entrance(0.01, -0.004);
        let edge = fringe(0.0, 0.0).step(&particle, &y, &PhaseState::zero(), THIN);
        let bend = bulk().step(&particle, &y, &PhaseState::zero(), THIN);
        assert_eq!(edge.state.position, bend.state.position);
        let p = bend.state.momentum_magnitude();
        assert!((edge.state.momentum - bend.state.momentum).norm() / p < 1e-12);
        assert_eq!(edge.mode, bend.mode);
    }

    #[test]
    fn test_poleface_kick_on_edge_step() {
        let e = 0.1;
        let fc = 0.02;
        let (particle, y) = entrance(0.01, -0.004);
        let edge = fringe(e, fc).step(&particle, &y, &PhaseState::zero(), THIN);
        let bend = bulk().step(&particle, &y, &PhaseState::zero(), THIN);
        let (pos, u_bend) = local_direction(&bend.state);
        let (_, u_edge) = local_direction(&edge.state);
        let hp = FIELD / BRHO;
        let dxp = e.tan() * hp * pos.x;
        let dyp = -(e - fc).tan() * hp * pos.y;
        assert!((u_edge.x - u_bend.x - dxp).abs() < 1e-12, "dx' = {}", u_edge.x - u_bend.x);
        assert!((u_edge.y - u_bend.y - dyp).abs() < 1e-12, "dy' = {}", u_edge.y - u_bend.y);
        let p = y.momentum_magnitude();
        assert!((edge.state.momentum_magnitude() - p).abs() / p < 1e-12);
    }

    #[test]
    fn test_long_step_gets_no_edge_kick() {
        let (particle, y) = entrance(0.01, -0.004);
        let edge = fringe(0.1, 0.0);
        assert!(!edge.is_edge_step(0.05));
        let r = edge.step(&particle, &y, &PhaseState::zero(), 0.05);
        let bend = bulk().step(&particle, &y, &PhaseState::zero(), 0.05);
        assert_eq!(r.state, bend.state);
    }

    #[test]
    fn test_edge_step_calibration_window() {
        // calibration value: edge_kick_tolerance = 0.5 of the thin element length
        let edge = fringe(0.1, 0.0);
        assert!(edge.is_edge_step(THIN));
        assert!(edge.is_edge_step(1.4 * THIN));
        assert!(edge.is_edge_step(0.6 * THIN));
        assert!(!edge.is_edge_step(1.6 * THIN));
        assert!(!edge.is_edge_step(0.4 * THIN));
    }
}
