// ─────────────────────────────────────────────────────────────────────
// SCPN Beam Core — Integrator Contract
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Stepping contract shared by every integrator, plus the pieces the
//! analytic steppers have in common: drift, fallback delegation and
//! local/global conversion.

use crate::navigator::{CoordinateTransform, LocalStep};
use beam_field::types::{FieldClass, FieldType};
use beam_types::config::{StepperSettings, Units};
use beam_types::error::{BeamError, BeamResult};
use beam_types::state::{Particle, PhaseState};
use nalgebra::Vector3;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::trace;

/// Branch a step actually took.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepMode {
    Drift,
    Analytic,
    Fallback,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepResult {
    pub state: PhaseState,
    /// Per-component error estimate, zero for exact transport
    pub error: PhaseState,
    /// Sagitta of the step, used by the host to judge chord accuracy
    pub dist_chord: f64,
    pub mode: StepMode,
}

impl StepResult {
    pub fn exact(state: PhaseState, dist_chord: f64, mode: StepMode) -> Self {
        StepResult {
            state,
            error: PhaseState::zero(),
            dist_chord,
            mode,
        }
    }
}

/// Advances one track by one step of path length `h`.
///
/// `y` and the returned state are global. `dydx` is the derivative at `y`
/// as computed by the equation of motion; analytic steppers ignore it.
pub trait Integrator: Send + Sync + fmt::Debug {
    fn step(&self, particle: &Particle, y: &PhaseState, dydx: &PhaseState, h: f64) -> StepResult;

    fn integrator_type(&self) -> IntegratorType;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntegratorType {
    Drift,
    Solenoid,
    DipoleRodrigues,
    DipoleMatrix,
    Quadrupole,
    Sextupole,
    Octupole,
    Decapole,
    MultipoleThin,
    DipoleFringe,
    KickerThin,
    Euler,
    Rk4,
    CashKarp,
}

const INTEGRATOR_NAMES: [(&str, IntegratorType); 14] = [
    ("drift", IntegratorType::Drift),
    ("solenoid", IntegratorType::Solenoid),
    ("dipolerodrigues", IntegratorType::DipoleRodrigues),
    ("dipolematrix", IntegratorType::DipoleMatrix),
    ("quadrupole", IntegratorType::Quadrupole),
    ("sextupole", IntegratorType::Sextupole),
    ("octupole", IntegratorType::Octupole),
    ("decapole", IntegratorType::Decapole),
    ("multipolethin", IntegratorType::MultipoleThin),
    ("dipolefringe", IntegratorType::DipoleFringe),
    ("kickerthin", IntegratorType::KickerThin),
    ("euler", IntegratorType::Euler),
    ("rk4", IntegratorType::Rk4),
    ("cashkarp", IntegratorType::CashKarp),
];

impl IntegratorType {
    /// Numerical steppers that integrate the full equation of motion.
    pub fn is_generic(&self) -> bool {
        matches!(
            self,
            IntegratorType::Euler | IntegratorType::Rk4 | IntegratorType::CashKarp
        )
    }

    /// Whether this integrator can transport particles through a field of `class`.
    pub fn supports(&self, class: FieldClass) -> bool {
        class == FieldClass::Magnetic || self.is_generic()
    }
}

impl FromStr for IntegratorType {
    type Err = BeamError;

    fn from_str(s: &str) -> BeamResult<Self> {
        let key = s.trim().to_ascii_lowercase();
        INTEGRATOR_NAMES
            .iter()
            .find(|(name, _)| *name == key)
            .map(|(_, t)| *t)
            .ok_or_else(|| BeamError::UnknownIntegratorType(s.to_string()))
    }
}

impl fmt::Display for IntegratorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = INTEGRATOR_NAMES
            .iter()
            .find(|(_, t)| t == self)
            .map(|(name, _)| *name)
            .unwrap_or("unknown");
        f.write_str(name)
    }
}

/// Default integrator per field type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntegratorSet {
    /// Generic Runge–Kutta for everything
    Geant4,
    /// Analytic steppers, dipoles by exact helix
    BdsimOne,
    /// Analytic steppers, dipoles by curvilinear matrix
    BdsimTwo,
}

impl IntegratorSet {
    pub fn default_for(&self, field_type: FieldType) -> IntegratorType {
        use FieldType as F;
        if field_type.class() != FieldClass::Magnetic || field_type.is_map() {
            return IntegratorType::CashKarp;
        }
        if *self == IntegratorSet::Geant4 {
            return match field_type {
                F::None | F::Zero => IntegratorType::Drift,
                _ => IntegratorType::Rk4,
            };
        }
        match field_type {
            F::None | F::Zero => IntegratorType::Drift,
            F::Dipole if *self == IntegratorSet::BdsimOne => IntegratorType::DipoleRodrigues,
            F::Dipole => IntegratorType::DipoleMatrix,
            F::Quadrupole => IntegratorType::Quadrupole,
            F::Sextupole => IntegratorType::Sextupole,
            F::Octupole => IntegratorType::Octupole,
            F::Decapole => IntegratorType::Decapole,
            F::Solenoid => IntegratorType::Solenoid,
            _ => IntegratorType::Rk4,
        }
    }
}

impl FromStr for IntegratorSet {
    type Err = BeamError;

    fn from_str(s: &str) -> BeamResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "geant4" => Ok(IntegratorSet::Geant4),
            "bdsim" | "bdsimone" => Ok(IntegratorSet::BdsimOne),
            "bdsimtwo" => Ok(IntegratorSet::BdsimTwo),
            _ => Err(BeamError::ConfigError(format!(
                "unknown integrator set '{s}', expected geant4, bdsimone or bdsimtwo"
            ))),
        }
    }
}

/// Straight-line advance: position moves by `h` along the momentum,
/// momentum is unchanged and the error is zero.
pub fn drift(particle: &Particle, units: &Units, y: &PhaseState, h: f64) -> StepResult {
    let direction = y.direction();
    let beta = particle.beta(y.momentum_magnitude());
    let dt = if beta > 0.0 { h / (beta * units.c_light()) } else { 0.0 };
    let state = PhaseState {
        position: y.position + h * direction,
        momentum: y.momentum,
        time: y.time + dt,
    };
    StepResult::exact(state, 0.0, StepMode::Drift)
}

#[derive(Debug, Clone, Copy)]
pub struct DriftIntegrator {
    units: Units,
}

impl DriftIntegrator {
    pub fn new(units: Units) -> Self {
        DriftIntegrator { units }
    }
}

impl Integrator for DriftIntegrator {
    fn step(&self, particle: &Particle, y: &PhaseState, _dydx: &PhaseState, h: f64) -> StepResult {
        drift(particle, &self.units, y, h)
    }

    fn integrator_type(&self) -> IntegratorType {
        IntegratorType::Drift
    }
}

/// State shared by the analytic steppers.
#[derive(Debug, Clone)]
pub struct StepperBase {
    pub frame: Arc<CoordinateTransform>,
    /// Thresholds in host units
    pub settings: StepperSettings,
    pub units: Units,
    pub fallback: Arc<dyn Integrator>,
}

impl StepperBase {
    pub fn new(
        frame: Arc<CoordinateTransform>,
        settings: StepperSettings,
        units: Units,
        fallback: Arc<dyn Integrator>,
    ) -> Self {
        StepperBase {
            frame,
            settings,
            units,
            fallback,
        }
    }

    pub fn drift(&self, particle: &Particle, y: &PhaseState, h: f64) -> StepResult {
        drift(particle, &self.units, y, h)
    }

    /// Hand the whole step to the generic stepper.
    pub fn fall_back(
        &self,
        particle: &Particle,
        y: &PhaseState,
        dydx: &PhaseState,
        h: f64,
        reason: &'static str,
    ) -> StepResult {
        trace!(reason, h, "analytic step not applicable, using fallback stepper");
        let mut result = self.fallback.step(particle, y, dydx, h);
        result.mode = StepMode::Fallback;
        result
    }

    pub fn is_paraxial(&self, unit_momentum: &Vector3<f64>) -> bool {
        unit_momentum.z >= self.settings.paraxial_threshold
    }

    /// Local result back to a global state. `unit` is the local unit momentum.
    pub fn to_global(
        &self,
        local: &LocalStep,
        position: Vector3<f64>,
        unit: Vector3<f64>,
        momentum_magnitude: f64,
        time: f64,
    ) -> PhaseState {
        let out = LocalStep {
            position,
            momentum: unit * momentum_magnitude,
            ..*local
        };
        let (position, momentum) = self.frame.to_global(&out);
        PhaseState {
            position,
            momentum,
            time,
        }
    }

    /// Laboratory time after a path of length `h`.
    pub fn advance_time(&self, particle: &Particle, y: &PhaseState, h: f64) -> f64 {
        let beta = particle.beta(y.momentum_magnitude());
        if beta > 0.0 {
            y.time + h / (beta * self.units.c_light())
        } else {
            y.time
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integrator_names_roundtrip() {
        for (name, t) in INTEGRATOR_NAMES {
            assert_eq!(name.parse::<IntegratorType>().unwrap(), t);
            assert_eq!(t.to_string(), name);
        }
        assert_eq!("RK4".parse::<IntegratorType>().unwrap(), IntegratorType::Rk4);
        assert!(matches!(
            "leapfrog".parse::<IntegratorType>(),
            Err(BeamError::UnknownIntegratorType(_))
        ));
    }

    #[test]
    fn test_integrator_sets() {
        let one: IntegratorSet = "bdsim".parse().unwrap();
        let two: IntegratorSet = "bdsimtwo".parse().unwrap();
        let g4: IntegratorSet = "Geant4".parse().unwrap();
        assert_eq!(one.default_for(FieldType::Dipole), IntegratorType::DipoleRodrigues);
        assert_eq!(two.default_for(FieldType::Dipole), IntegratorType::DipoleMatrix);
        assert_eq!(two.default_for(FieldType::Quadrupole), IntegratorType::Quadrupole);
        assert_eq!(g4.default_for(FieldType::Quadrupole), IntegratorType::Rk4);
        assert_eq!(two.default_for(FieldType::ElectroMagneticMap(3)), IntegratorType::CashKarp);
        assert!("bdsimthree".parse::<IntegratorSet>().is_err());
    }

    #[test]
    fn test_electric_fields_need_generic_steppers() {
        assert!(IntegratorType::Rk4.supports(FieldClass::ElectroMagnetic));
        assert!(!IntegratorType::Quadrupole.supports(FieldClass::Electric));
        assert!(IntegratorType::Quadrupole.supports(FieldClass::Magnetic));
    }

    #[test]
    fn test_drift_moves_along_momentum() {
        let units = Units::default();
        let particle = Particle::proton();
        let y = PhaseState::new(Vector3::new(0.0, 0.0, 1.0), Vector3::new(0.3, 0.0, 0.4));
        let r = drift(&particle, &units, &y, 2.0);
        assert!((r.state.position - Vector3::new(1.2, 0.0, 2.6)).norm() < 1e-12);
        assert_eq!(r.state.momentum, y.momentum);
        assert_eq!(r.error, PhaseState::zero());
        assert_eq!(r.mode, StepMode::Drift);
        assert!(r.state.time > 0.0);
    }
}
