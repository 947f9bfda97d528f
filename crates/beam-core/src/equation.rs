// ─────────────────────────────────────────────────────────────────────
// SCPN Beam Core — Equation of Motion
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Lorentz-force equation of motion with respect to path length.
//!
//! For `y = (x, y, z, px, py, pz, t)`:
//!
//! ```text
//! dx/ds = p̂
//! dp/ds = fcof · p̂ × B + q · E · 1e-9 / (β · metre)
//! dt/ds = 1 / (β · c)
//! ```

use crate::navigator::CoordinateTransform;
use beam_field::model::{FieldModel, FieldSample};
use beam_field::types::FieldClass;
use beam_math::rk::OdeSystem;
use beam_types::config::Units;
use beam_types::constants::GEV_PER_VOLT;
use beam_types::state::{Particle, PhaseState, PHASE_DIM};
use nalgebra::Vector3;
use std::sync::Arc;

/// A local field model seen from the global frame.
#[derive(Debug, Clone)]
pub struct GlobalField {
    local: Arc<dyn FieldModel>,
    frame: Arc<CoordinateTransform>,
}

impl GlobalField {
    pub fn new(local: Arc<dyn FieldModel>, frame: Arc<CoordinateTransform>) -> Self {
        GlobalField { local, frame }
    }

    pub fn local_model(&self) -> &Arc<dyn FieldModel> {
        &self.local
    }

    pub fn frame(&self) -> &Arc<CoordinateTransform> {
        &self.frame
    }
}

impl FieldModel for GlobalField {
    fn evaluate(&self, position: &Vector3<f64>, t: f64) -> FieldSample {
        let local = self.frame.to_local(position, &Vector3::zeros(), 0.0, false);
        let mut sample = self.local.evaluate(&local.position, t);
        sample.field = sample
            .field
            .map(|v| self.frame.axis_to_global(local.segment, v));
        sample
    }

    fn smallest_spatial_step(&self) -> Option<f64> {
        self.local.smallest_spatial_step()
    }
}

#[derive(Debug, Clone)]
pub struct EquationOfMotion {
    field: Arc<dyn FieldModel>,
    class: FieldClass,
    units: Units,
}

impl EquationOfMotion {
    /// `field` must be evaluated in global coordinates.
    pub fn new(field: Arc<dyn FieldModel>, class: FieldClass, units: Units) -> Self {
        EquationOfMotion { field, class, units }
    }

    pub fn class(&self) -> FieldClass {
        self.class
    }

    pub fn units(&self) -> &Units {
        &self.units
    }

    pub fn field(&self) -> &Arc<dyn FieldModel> {
        &self.field
    }

    /// Momentum change in GeV/c per host length per tesla for this particle.
    pub fn fcof(&self, particle: &Particle) -> f64 {
        self.units.fcof(particle.charge)
    }

    /// Derivative of `y` with respect to path length.
    pub fn derivatives(&self, particle: &Particle, y: &[f64; PHASE_DIM]) -> [f64; PHASE_DIM] {
        let position = Vector3::new(y[0], y[1], y[2]);
        let momentum = Vector3::new(y[3], y[4], y[5]);
        let p = momentum.norm();
        if p == 0.0 {
            return [0.0; PHASE_DIM];
        }
        let direction = momentum / p;
        let beta = particle.beta(p);
        let field = self.field.evaluate(&position, y[6]).field;

        let mut force = Vector3::zeros();
        if self.class != FieldClass::Electric {
            force += self.fcof(particle) * direction.cross(&field.magnetic);
        }
        if self.class != FieldClass::Magnetic && beta > 0.0 {
            force += particle.charge * GEV_PER_VOLT * field.electric / (beta * self.units.metre);
        }
        let dt_ds = if beta > 0.0 { 1.0 / (beta * self.units.c_light()) } else { 0.0 };
        [
            direction.x,
            direction.y,
            direction.z,
            force.x,
            force.y,
            force.z,
            dt_ds,
        ]
    }

    pub fn derivative_state(&self, particle: &Particle, state: &PhaseState) -> PhaseState {
        PhaseState::from_array(&self.derivatives(particle, &state.to_array()))
    }

    /// Bind the equation to one particle species for the Runge–Kutta kernels.
    pub fn bind<'a>(&'a self, particle: &'a Particle) -> BoundEquation<'a> {
        BoundEquation {
            equation: self,
            particle,
        }
    }
}

pub struct BoundEquation<'a> {
    equation: &'a EquationOfMotion,
    particle: &'a Particle,
}

impl OdeSystem<PHASE_DIM> for BoundEquation<'_> {
    fn rhs(&self, y: &[f64; PHASE_DIM]) -> [f64; PHASE_DIM] {
        self.equation.derivatives(self.particle, y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use beam_field::multipole::{DipoleField, QuadrupoleField};
    use nalgebra::{Isometry3, Translation3, UnitQuaternion};

    #[test]
    fn test_dipole_force_bends_towards_negative_x() {
        let eq = EquationOfMotion::new(
            Arc::new(DipoleField::new(1.0)),
            FieldClass::Magnetic,
            Units::default(),
        );
        let state = PhaseState::new(Vector3::zeros(), Vector3::new(0.0, 0.0, 1.0));
        let d = eq.derivative_state(&Particle::proton(), &state);
        assert!(d.momentum.x < 0.0);
        assert!((d.momentum.x + 0.299_792_458).abs() < 1e-12);
        assert_eq!(d.position, Vector3::z());
        assert!(d.time > 0.0);
    }

    #[test]
    fn test_magnetic_class_ignores_electric_part() {
        let eq = EquationOfMotion::new(
            Arc::new(beam_field::multipole::RfSinusoidField::new(1.0e6, 0.0, 0.0)),
            FieldClass::Magnetic,
            Units::default(),
        );
        let state = PhaseState::new(Vector3::zeros(), Vector3::new(0.0, 0.0, 1.0));
        let d = eq.derivative_state(&Particle::proton(), &state);
        assert_eq!(d.momentum, Vector3::zeros());
    }

    #[test]
    fn test_electric_field_accelerates() {
        let eq = EquationOfMotion::new(
            Arc::new(beam_field::multipole::RfSinusoidField::new(1.0e6, 0.0, 0.0)),
            FieldClass::Electric,
            Units::default(),
        );
        let particle = Particle::proton();
        let state = PhaseState::new(Vector3::zeros(), Vector3::new(0.0, 0.0, 1.0));
        let d = eq.derivative_state(&particle, &state);
        let beta = particle.beta(1.0);
        assert!((d.momentum.z - 1.0e6 * 1.0e-9 / beta).abs() < 1e-12);
    }

    #[test]
    fn test_global_field_rotates_with_frame() {
        let rotation = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), std::f64::consts::FRAC_PI_2);
        let iso = Isometry3::from_parts(Translation3::new(0.0, 0.0, 5.0), rotation);
        let frame = Arc::new(CoordinateTransform::straight(iso, 2.0));
        let field = GlobalField::new(Arc::new(QuadrupoleField::new(2.0)), frame);
        // local (0.01, 0, 0) sits at global (0, 0.01, 5)
        let b = field.evaluate(&Vector3::new(0.0, 0.01, 5.0), 0.0).field.magnetic;
        // local B = (0, 0.02, 0), rotated by +90° about z
        assert!((b.x + 0.02).abs() < 1e-12, "b = {b:?}");
        assert!(b.y.abs() < 1e-12);
    }
}
