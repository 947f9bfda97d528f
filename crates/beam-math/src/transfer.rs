// ─────────────────────────────────────────────────────────────────────
// SCPN Beam Core — Thick-Lens Transfer Matrices
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Closed-form solutions of `u'' = -k·u + F` over a path length `l`.
//!
//! `k > 0` focuses (cos/sin), `k < 0` defocuses (cosh/sinh), `k ≈ 0`
//! reduces to a drift. The constant forcing term `F` carries the
//! dispersive part of a combined-function bend.

/// Below this |k·l²| the lens is treated as a drift.
const DRIFT_LIMIT: f64 = 1e-12;

/// 2×2 transfer matrix plus the response to unit forcing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThickLens {
    pub m11: f64,
    pub m12: f64,
    pub m21: f64,
    pub m22: f64,
    /// Position response to F = 1
    pub d1: f64,
    /// Slope response to F = 1
    pub d2: f64,
}

impl ThickLens {
    pub fn new(k: f64, l: f64) -> Self {
        if (k * l * l).abs() < DRIFT_LIMIT {
            return ThickLens::drift(l);
        }
        if k > 0.0 {
            let w = k.sqrt();
            let (s, c) = (w * l).sin_cos();
            ThickLens {
                m11: c,
                m12: s / w,
                m21: -w * s,
                m22: c,
                d1: (1.0 - c) / k,
                d2: s / w,
            }
        } else {
            let w = (-k).sqrt();
            let c = (w * l).cosh();
            let s = (w * l).sinh();
            ThickLens {
                m11: c,
                m12: s / w,
                m21: w * s,
                m22: c,
                d1: (1.0 - c) / k,
                d2: s / w,
            }
        }
    }

    pub fn drift(l: f64) -> Self {
        ThickLens {
            m11: 1.0,
            m12: l,
            m21: 0.0,
            m22: 1.0,
            d1: 0.5 * l * l,
            d2: l,
        }
    }

    /// Transport `(u, u')` with constant forcing `f`.
    #[inline]
    pub fn apply(&self, u: f64, up: f64, f: f64) -> (f64, f64) {
        (
            self.m11 * u + self.m12 * up + self.d1 * f,
            self.m21 * u + self.m22 * up + self.d2 * f,
        )
    }

    pub fn determinant(&self) -> f64 {
        self.m11 * self.m22 - self.m12 * self.m21
    }
}
