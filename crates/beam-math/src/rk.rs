// ─────────────────────────────────────────────────────────────────────
// SCPN Beam Core — Runge-Kutta Steppers
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Explicit Runge-Kutta steps for autonomous first-order systems.
//!
//! Every step takes the derivative at the start point (`dydx`) from the
//! caller, since the external track driver has usually computed it already.

/// Autonomous system `dy/ds = f(y)`.
pub trait OdeSystem<const N: usize> {
    fn rhs(&self, y: &[f64; N]) -> [f64; N];
}

impl<F, const N: usize> OdeSystem<N> for F
where
    F: Fn(&[f64; N]) -> [f64; N],
{
    fn rhs(&self, y: &[f64; N]) -> [f64; N] {
        self(y)
    }
}

#[inline]
fn offset<const N: usize>(y: &[f64; N], terms: &[(f64, &[f64; N])]) -> [f64; N] {
    let mut out = *y;
    for (w, k) in terms {
        for i in 0..N {
            out[i] += w * k[i];
        }
    }
    out
}

fn sub<const N: usize>(a: &[f64; N], b: &[f64; N]) -> [f64; N] {
    let mut out = [0.0; N];
    for i in 0..N {
        out[i] = a[i] - b[i];
    }
    out
}

/// First-order Euler step.
pub fn euler_step<const N: usize>(y: &[f64; N], dydx: &[f64; N], h: f64) -> [f64; N] {
    offset(y, &[(h, dydx)])
}

/// Second-order midpoint step.
pub fn midpoint_step<S: OdeSystem<N>, const N: usize>(
    system: &S,
    y: &[f64; N],
    dydx: &[f64; N],
    h: f64,
) -> [f64; N] {
    let y_mid = offset(y, &[(0.5 * h, dydx)]);
    let k2 = system.rhs(&y_mid);
    offset(y, &[(h, &k2)])
}

/// Classical fourth-order step.
pub fn rk4_step<S: OdeSystem<N>, const N: usize>(
    system: &S,
    y: &[f64; N],
    dydx: &[f64; N],
    h: f64,
) -> [f64; N] {
    let k1 = dydx;
    let k2 = system.rhs(&offset(y, &[(0.5 * h, k1)]));
    let k3 = system.rhs(&offset(y, &[(0.5 * h, &k2)]));
    let k4 = system.rhs(&offset(y, &[(h, &k3)]));
    offset(
        y,
        &[(h / 6.0, k1), (h / 3.0, &k2), (h / 3.0, &k3), (h / 6.0, &k4)],
    )
}

/// RK4 with a step-doubling error estimate.
///
/// Returns the two-half-step result and `two_half - full`.
pub fn rk4_doubling_step<S: OdeSystem<N>, const N: usize>(
    system: &S,
    y: &[f64; N],
    dydx: &[f64; N],
    h: f64,
) -> ([f64; N], [f64; N]) {
    let full = rk4_step(system, y, dydx, h);
    let half = rk4_step(system, y, dydx, 0.5 * h);
    let dydx_half = system.rhs(&half);
    let two_half = rk4_step(system, &half, &dydx_half, 0.5 * h);
    let err = sub(&two_half, &full);
    (two_half, err)
}

/// Midpoint step with a step-doubling error estimate.
pub fn midpoint_doubling_step<S: OdeSystem<N>, const N: usize>(
    system: &S,
    y: &[f64; N],
    dydx: &[f64; N],
    h: f64,
) -> ([f64; N], [f64; N]) {
    let full = midpoint_step(system, y, dydx, h);
    let half = midpoint_step(system, y, dydx, 0.5 * h);
    let dydx_half = system.rhs(&half);
    let two_half = midpoint_step(system, &half, &dydx_half, 0.5 * h);
    let err = sub(&two_half, &full);
    (two_half, err)
}

// Cash-Karp embedded 4(5) tableau
const B21: f64 = 1.0 / 5.0;
const B31: f64 = 3.0 / 40.0;
const B32: f64 = 9.0 / 40.0;
const B41: f64 = 3.0 / 10.0;
const B42: f64 = -9.0 / 10.0;
const B43: f64 = 6.0 / 5.0;
const B51: f64 = -11.0 / 54.0;
const B52: f64 = 5.0 / 2.0;
const B53: f64 = -70.0 / 27.0;
const B54: f64 = 35.0 / 27.0;
const B61: f64 = 1631.0 / 55296.0;
const B62: f64 = 175.0 / 512.0;
const B63: f64 = 575.0 / 13824.0;
const B64: f64 = 44275.0 / 110592.0;
const B65: f64 = 253.0 / 4096.0;
const C1: f64 = 37.0 / 378.0;
const C3: f64 = 250.0 / 621.0;
const C4: f64 = 125.0 / 594.0;
const C6: f64 = 512.0 / 1771.0;
const DC1: f64 = C1 - 2825.0 / 27648.0;
const DC3: f64 = C3 - 18575.0 / 48384.0;
const DC4: f64 = C4 - 13525.0 / 55296.0;
const DC5: f64 = -277.0 / 14336.0;
const DC6: f64 = C6 - 0.25;

/// Cash-Karp step: fifth-order result and embedded error estimate.
pub fn cash_karp_step<S: OdeSystem<N>, const N: usize>(
    system: &S,
    y: &[f64; N],
    dydx: &[f64; N],
    h: f64,
) -> ([f64; N], [f64; N]) {
    let k1 = dydx;
    let k2 = system.rhs(&offset(y, &[(h * B21, k1)]));
    let k3 = system.rhs(&offset(y, &[(h * B31, k1), (h * B32, &k2)]));
    let k4 = system.rhs(&offset(y, &[(h * B41, k1), (h * B42, &k2), (h * B43, &k3)]));
    let k5 = system.rhs(&offset(
        y,
        &[(h * B51, k1), (h * B52, &k2), (h * B53, &k3), (h * B54, &k4)],
    ));
    let k6 = system.rhs(&offset(
        y,
        &[
            (h * B61, k1),
            (h * B62, &k2),
            (h * B63, &k3),
            (h * B64, &k4),
            (h * B65, &k5),
        ],
    ));
    let y_out = offset(y, &[(h * C1, k1), (h * C3, &k3), (h * C4, &k4), (h * C6, &k6)]);
    let zero = [0.0; N];
    let err = offset(
        &zero,
        &[
            (h * DC1, k1),
            (h * DC3, &k3),
            (h * DC4, &k4),
            (h * DC5, &k5),
            (h * DC6, &k6),
        ],
    );
    (y_out, err)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Harmonic oscillator u'' = -u as a first-order system.
    fn oscillator(y: &[f64; 2]) -> [f64; 2] {
        [y[1], -y[0]]
    }

    fn integrate<F>(step: F, h: f64, n: usize) -> [f64; 2]
    where
        F: Fn(&[f64; 2], &[f64; 2], f64) -> [f64; 2],
    {
        let mut y = [1.0, 0.0];
        for _ in 0..n {
            let d = oscillator(&y);
            y = step(&y, &d, h);
        }
        y
    }

    #[test]
    fn test_rk4_quarter_period() {
        let n = 200;
        let h = std::f64::consts::FRAC_PI_2 / n as f64;
        let y = integrate(|y, d, h| rk4_step(&oscillator, y, d, h), h, n);
        assert!(y[0].abs() < 1e-9, "cos(pi/2) ≈ 0, got {}", y[0]);
        assert!((y[1] + 1.0).abs() < 1e-9, "-sin(pi/2) ≈ -1, got {}", y[1]);
    }

    #[test]
    fn test_rk4_is_fourth_order() {
        let err = |n: usize| {
            let h = 1.0 / n as f64;
            let y = integrate(|y, d, h| rk4_step(&oscillator, y, d, h), h, n);
            (y[0] - 1.0f64.cos()).abs()
        };
        let ratio = err(20) / err(40);
        assert!(ratio > 12.0 && ratio < 20.0, "error ratio {ratio} should be ≈ 16");
    }

    #[test]
    fn test_cash_karp_error_estimate_is_small_for_smooth_system() {
        let y = [1.0, 0.0];
        let d = oscillator(&y);
        let (out, err) = cash_karp_step(&oscillator, &y, &d, 0.1);
        assert!((out[0] - 0.1f64.cos()).abs() < 1e-8);
        assert!(err.iter().all(|e| e.abs() < 1e-6));
    }

    #[test]
    fn test_doubling_error_shrinks_with_step() {
        let y = [1.0, 0.0];
        let d = oscillator(&y);
        let (_, e1) = rk4_doubling_step(&oscillator, &y, &d, 0.4);
        let (_, e2) = rk4_doubling_step(&oscillator, &y, &d, 0.2);
        assert!(e2[0].abs() < e1[0].abs());
    }

    #[test]
    fn test_midpoint_and_euler_consistent_for_linear_drift() {
        let drift = |_: &[f64; 2]| [1.0, 0.0];
        let y = [0.0, 0.0];
        let d = drift(&y);
        assert_eq!(euler_step(&y, &d, 0.5), [0.5, 0.0]);
        assert_eq!(midpoint_step(&drift, &y, &d, 0.5), [0.5, 0.0]);
        let (_, err) = midpoint_doubling_step(&drift, &y, &d, 0.5);
        assert_eq!(err, [0.0, 0.0]);
    }
}
