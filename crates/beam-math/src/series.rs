//! Factorial table and complex multipole series.
//!
//! The transverse field of a normal multipole of order n + 1 is
//! `B_y + i B_x = b_n (x + i y)^n / n!`, so both the field models and the
//! thin-kick stepper evaluate the same complex power series.

use num_complex::Complex64;

const FACTORIAL_TABLE_LEN: usize = 13;

const FACTORIALS: [f64; FACTORIAL_TABLE_LEN] = [
    1.0,
    1.0,
    2.0,
    6.0,
    24.0,
    120.0,
    720.0,
    5040.0,
    40320.0,
    362880.0,
    3628800.0,
    39916800.0,
    479001600.0,
];

/// n! from the table, computed for n beyond it.
pub fn factorial(n: usize) -> f64 {
    if n < FACTORIAL_TABLE_LEN {
        FACTORIALS[n]
    } else {
        (FACTORIAL_TABLE_LEN..=n).fold(FACTORIALS[FACTORIAL_TABLE_LEN - 1], |acc, k| {
            acc * k as f64
        })
    }
}

/// Σ c_n z^n / n! over `(n, c_n)` terms.
pub fn power_series<I>(z: Complex64, terms: I) -> Complex64
where
    I: IntoIterator<Item = (usize, Complex64)>,
{
    terms
        .into_iter()
        .filter(|(_, c)| c.re != 0.0 || c.im != 0.0)
        .map(|(n, c)| c * z.powu(n as u32) / factorial(n))
        .sum()
}

/// Fixed skew rotation for multipole order `order` (2 = quadrupole): π / (2·order).
pub fn skew_angle(order: usize) -> f64 {
    std::f64::consts::PI / (2.0 * order as f64)
}
