// ─────────────────────────────────────────────────────────────────────
// SCPN Beam Core — Thin Kick Steppers
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Zero-length elements applied as a single momentum kick.
//!
//! The position advances by `h` along the local z axis, the transverse
//! unit momentum receives the kick and the longitudinal component is
//! recomputed so |p| is unchanged. Particles that are not paraxial are
//! drifted, never kicked. The error estimate is always zero: splitting a
//! kick into halves would apply it twice.

use crate::integrator::{Integrator, IntegratorType, StepMode, StepResult, StepperBase};
use beam_field::model::FieldModel;
use beam_field::multipole::MultipoleField;
use beam_math::vector::{longitudinal, unit_or_zero};
use beam_types::config::Units;
use beam_types::state::{Particle, PhaseState};
use beam_types::strength::StrengthTable;
use nalgebra::Vector3;

/// Kick strength relative to the reference particle: `fcof·brho/|p|`,
/// 1 for the design particle and its sign for the opposite charge.
fn rigidity_ratio(base: &StepperBase, particle: &Particle, brho: f64, p: f64) -> f64 {
    base.units.fcof(particle.charge) * base.units.metre * brho / p
}

/// Apply `(dxp, dyp)` to the local unit momentum and advance by `h`.
fn kick(base: &StepperBase, particle: &Particle, y: &PhaseState, h: f64, dxp: f64, dyp: f64) -> StepResult {
    let p = y.momentum_magnitude();
    let local = base.frame.to_local(&y.position, &y.momentum, h, false);
    let unit = local.momentum / p;
    let xp1 = unit.x + dxp;
    let yp1 = unit.y + dyp;
    let zp1 = longitudinal(xp1, yp1, unit.z);
    let direction = unit_or_zero(&Vector3::new(xp1, yp1, zp1));
    let position = local.position + Vector3::new(0.0, 0.0, h);
    let state = base.to_global(&local, position, direction, p, base.advance_time(particle, y, h));
    StepResult::exact(state, 0.0, StepMode::Analytic)
}

/// Thin multipole: `Δx' + iΔy'` from `Σ (b_n + i a_n)(x + iy)^n / n!` over
/// the integrated normal and skew strengths `k1`…`k12`, `k1s`…`k12s`.
#[derive(Debug, Clone)]
pub struct MultipoleThinIntegrator {
    base: StepperBase,
    /// Integrated strengths in host units, evaluated as a field per unit rigidity
    kick_series: MultipoleField,
    brho: f64,
}

impl MultipoleThinIntegrator {
    pub fn from_strength(base: StepperBase, strength: &StrengthTable, brho: f64, units: &Units) -> Self {
        MultipoleThinIntegrator {
            base,
            kick_series: MultipoleField::from_strength(strength, 1.0, units),
            brho,
        }
    }
}

impl Integrator for MultipoleThinIntegrator {
    fn step(&self, particle: &Particle, y: &PhaseState, _dydx: &PhaseState, h: f64) -> StepResult {
        let p = y.momentum_magnitude();
        if particle.charge == 0.0 || self.kick_series.is_empty() || p == 0.0 {
            return self.base.drift(particle, y, h);
        }
        let local = self.base.frame.to_local(&y.position, &y.momentum, h, false);
        if !self.base.is_paraxial(&(local.momentum / p)) {
            return self.base.drift(particle, y, h);
        }
        // the series is a field per unit rigidity; F = q v × B turns (Bx, By) into (-By, Bx)
        let b = self
            .kick_series
            .evaluate(&Vector3::new(local.position.x, local.position.y, 0.0), y.time)
            .field
            .magnetic;
        let ratio = rigidity_ratio(&self.base, particle, self.brho, p);
        kick(&self.base, particle, y, h, -ratio * b.y, ratio * b.x)
    }

    fn integrator_type(&self) -> IntegratorType {
        IntegratorType::MultipoleThin
    }
}

/// Thin kicker: fixed angular kicks `hkick` and `vkick` [rad] for the
/// reference particle.
#[derive(Debug, Clone)]
pub struct KickerThinIntegrator {
    base: StepperBase,
    hkick: f64,
    vkick: f64,
    brho: f64,
}

impl KickerThinIntegrator {
    pub fn new(base: StepperBase, hkick: f64, vkick: f64, brho: f64) -> Self {
        KickerThinIntegrator {
            base,
            hkick,
            vkick,
            brho,
        }
    }

    pub fn from_strength(base: StepperBase, strength: &StrengthTable, brho: f64) -> Self {
        KickerThinIntegrator::new(base, strength.get("hkick"), strength.get("vkick"), brho)
    }
}

impl Integrator for KickerThinIntegrator {
    fn step(&self, particle: &Particle, y: &PhaseState, _dydx: &PhaseState, h: f64) -> StepResult {
        let p = y.momentum_magnitude();
        if particle.charge == 0.0 || (self.hkick == 0.0 && self.vkick == 0.0) || p == 0.0 {
            return self.base.drift(particle, y, h);
        }
        let local = self.base.frame.to_local(&y.position, &y.momentum, h, false);
        if !self.base.is_paraxial(&(local.momentum / p)) {
            return self.base.drift(particle, y, h);
        }
        let ratio = rigidity_ratio(&self.base, particle, self.brho, p);
        kick(&self.base, particle, y, h, ratio * self.hkick, ratio * self.vkick)
    }

    fn integrator_type(&self) -> IntegratorType {
        IntegratorType::KickerThin
    }
}
