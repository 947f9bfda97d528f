// ─────────────────────────────────────────────────────────────────────
// SCPN Beam Core — Property-Based Tests (proptest) for beam-math
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Property-based tests for beam-math using proptest.
//!
//! Covers: thick-lens matrices, separable grid interpolation, complex
//! multipole series.

use beam_math::interp::{interpolate, CellPosition, Kernel};
use beam_math::series::power_series;
use beam_math::transfer::ThickLens;
use num_complex::Complex64;
use proptest::prelude::*;

// ── Thick Lens Properties ────────────────────────────────────────────

proptest! {
    /// Transfer matrices of a conservative lens are symplectic (det = 1).
    #[test]
    fn thick_lens_is_symplectic(k in -5.0f64..5.0, l in 1e-4f64..3.0) {
        let det = ThickLens::new(k, l).determinant();
        prop_assert!((det - 1.0).abs() < 1e-9, "k={k} l={l} det={det}");
    }

    /// Splitting a lens into N equal pieces reproduces the whole lens.
    #[test]
    fn thick_lens_subdivides(k in -2.0f64..2.0, l in 0.01f64..2.0, n in 2usize..20,
                             u0 in -0.01f64..0.01, up0 in -0.01f64..0.01) {
        let whole = ThickLens::new(k, l).apply(u0, up0, 0.0);
        let piece = ThickLens::new(k, l / n as f64);
        let (mut u, mut up) = (u0, up0);
        for _ in 0..n {
            let next = piece.apply(u, up, 0.0);
            u = next.0;
            up = next.1;
        }
        prop_assert!((u - whole.0).abs() < 1e-12);
        prop_assert!((up - whole.1).abs() < 1e-12);
    }
}

// ── Interpolation Properties ─────────────────────────────────────────

proptest! {
    /// Linear and cubic kernels are exact for affine data away from edges.
    #[test]
    fn kernels_exact_for_affine_data(a in -3.0f64..3.0, b in -3.0f64..3.0, c in -3.0f64..3.0,
                                     x in 1.0f64..2.0, y in 1.0f64..2.0) {
        let sample = |idx: &[usize]| a * idx[0] as f64 + b * idx[1] as f64 + c;
        let cells = [CellPosition::new(x, 0.0, 1.0, 5), CellPosition::new(y, 0.0, 1.0, 5)];
        let expected = a * x + b * y + c;
        for kernel in [Kernel::Linear, Kernel::Cubic] {
            let v: f64 = interpolate(kernel, &cells, &sample);
            prop_assert!((v - expected).abs() < 1e-10, "{kernel:?}: {v} vs {expected}");
        }
    }

    /// Interpolated values stay inside the sample range for the linear kernel.
    #[test]
    fn linear_is_bounded(values in proptest::collection::vec(-10.0f64..10.0, 4), x in 0.0f64..3.0) {
        let sample = |idx: &[usize]| values[idx[0]];
        let v: f64 = interpolate(Kernel::Linear, &[CellPosition::new(x, 0.0, 1.0, 4)], &sample);
        let lo = values.iter().cloned().fold(f64::INFINITY, f64::min);
        let hi = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        prop_assert!(v >= lo - 1e-12 && v <= hi + 1e-12);
    }
}

// ── Multipole Series Properties ──────────────────────────────────────

proptest! {
    /// The series is linear in its coefficients.
    #[test]
    fn power_series_is_linear(x in -0.1f64..0.1, y in -0.1f64..0.1,
                              a in -5.0f64..5.0, b in -5.0f64..5.0) {
        let z = Complex64::new(x, y);
        let both = power_series(z, [(1, Complex64::new(a, 0.0)), (2, Complex64::new(b, 0.0))]);
        let first = power_series(z, [(1, Complex64::new(a, 0.0))]);
        let second = power_series(z, [(2, Complex64::new(b, 0.0))]);
        prop_assert!((both - first - second).norm() < 1e-14);
    }
}
