// ─────────────────────────────────────────────────────────────────────
// SCPN Beam Core — Phase State
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
use crate::constants::{ELECTRON_MASS_GEV, GEV_PER_TESLA_METRE, MIN_MOMENTUM_GEV, PROTON_MASS_GEV};
use nalgebra::Vector3;

/// Number of scalar slots in a flattened phase state: x, y, z, px, py, pz, t.
pub const PHASE_DIM: usize = 7;

/// Position, momentum and laboratory time of one track.
///
/// Position is in host length units, momentum in GeV/c, time in ns.
/// The same type carries derivatives with respect to path length
/// (`position` = unit direction, `momentum` = force term, `time` = dt/ds).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhaseState {
    pub position: Vector3<f64>,
    pub momentum: Vector3<f64>,
    pub time: f64,
}

impl PhaseState {
    pub fn new(position: Vector3<f64>, momentum: Vector3<f64>) -> Self {
        PhaseState {
            position,
            momentum,
            time: 0.0,
        }
    }

    pub fn zero() -> Self {
        PhaseState::new(Vector3::zeros(), Vector3::zeros())
    }

    pub fn with_time(mut self, time: f64) -> Self {
        self.time = time;
        self
    }

    pub fn momentum_magnitude(&self) -> f64 {
        self.momentum.norm()
    }

    /// Unit vector along the momentum; zero for a particle at rest.
    pub fn direction(&self) -> Vector3<f64> {
        let p = self.momentum.norm();
        if p < MIN_MOMENTUM_GEV {
            Vector3::zeros()
        } else {
            self.momentum / p
        }
    }

    pub fn is_finite(&self) -> bool {
        self.position.iter().all(|v| v.is_finite())
            && self.momentum.iter().all(|v| v.is_finite())
            && self.time.is_finite()
    }

    pub fn to_array(&self) -> [f64; PHASE_DIM] {
        [
            self.position.x,
            self.position.y,
            self.position.z,
            self.momentum.x,
            self.momentum.y,
            self.momentum.z,
            self.time,
        ]
    }

    pub fn from_array(y: &[f64; PHASE_DIM]) -> Self {
        PhaseState {
            position: Vector3::new(y[0], y[1], y[2]),
            momentum: Vector3::new(y[3], y[4], y[5]),
            time: y[6],
        }
    }

    /// Component-wise difference `self - other`, used for error estimates.
    pub fn difference(&self, other: &PhaseState) -> PhaseState {
        PhaseState {
            position: self.position - other.position,
            momentum: self.momentum - other.momentum,
            time: self.time - other.time,
        }
    }
}

/// Charge [e] and rest mass [GeV/c²] of the tracked species.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    pub charge: f64,
    pub mass: f64,
}

impl Particle {
    pub fn new(charge: f64, mass: f64) -> Self {
        Particle { charge, mass }
    }

    pub fn proton() -> Self {
        Particle::new(1.0, PROTON_MASS_GEV)
    }

    pub fn electron() -> Self {
        Particle::new(-1.0, ELECTRON_MASS_GEV)
    }

    pub fn positron() -> Self {
        Particle::new(1.0, ELECTRON_MASS_GEV)
    }

    /// Velocity as a fraction of c for momentum `p` [GeV/c].
    pub fn beta(&self, p: f64) -> f64 {
        if self.mass <= 0.0 {
            return 1.0;
        }
        p / (p * p + self.mass * self.mass).sqrt()
    }

    /// Magnetic rigidity [T·m] at momentum `p`. Infinite for a neutral particle.
    pub fn rigidity(&self, p: f64) -> f64 {
        if self.charge == 0.0 {
            return f64::INFINITY;
        }
        p / (self.charge.abs() * GEV_PER_TESLA_METRE)
    }

    /// Momentum [GeV/c] at which this particle has rigidity `brho` [T·m].
    pub fn momentum_for_rigidity(&self, brho: f64) -> f64 {
        brho * self.charge.abs() * GEV_PER_TESLA_METRE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_array_roundtrip_keeps_time() {
        let s = PhaseState::new(Vector3::new(1.0, 2.0, 3.0), Vector3::new(0.1, 0.2, 0.3))
            .with_time(4.5);
        let back = PhaseState::from_array(&s.to_array());
        assert_eq!(s, back);
    }

    #[test]
    fn test_direction_of_particle_at_rest_is_zero() {
        let s = PhaseState::zero();
        assert_eq!(s.direction(), Vector3::zeros());
    }

    #[test]
    fn test_rigidity_and_momentum_are_inverse() {
        let p = Particle::proton();
        let brho = 4.333;
        let mom = p.momentum_for_rigidity(brho);
        assert!((p.rigidity(mom) - brho).abs() < 1e-12);
    }

    #[test]
    fn test_beta_limits() {
        let e = Particle::electron();
        assert!(e.beta(100.0) > 0.999_999);
        let photon = Particle::new(0.0, 0.0);
        assert_eq!(photon.beta(1.0), 1.0);
        assert!(photon.rigidity(1.0).is_infinite());
    }
}
