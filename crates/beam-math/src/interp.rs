// ─────────────────────────────────────────────────────────────────────
// SCPN Beam Core — Grid Interpolation Kernels
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Nearest, linear and cubic interpolation on regular N-D grids (N ≤ 4).
//!
//! The kernels are separable: an N-D interpolation is a 1-D interpolation
//! along the first axis of (N-1)-D interpolations. Indices outside the
//! grid are clamped to the edge sample.

use std::ops::{Add, Mul, Sub};

/// Maximum number of grid axes.
pub const MAX_AXES: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kernel {
    Nearest,
    Linear,
    Cubic,
}

/// Location of a query point along one regular axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellPosition {
    /// Index of the sample at or below the query
    pub index: isize,
    /// Fraction of a cell past `index`, in [0, 1)
    pub fraction: f64,
    /// Number of samples on this axis
    pub len: usize,
}

impl CellPosition {
    pub fn new(value: f64, min: f64, step: f64, len: usize) -> Self {
        if len < 2 || step == 0.0 {
            return CellPosition {
                index: 0,
                fraction: 0.0,
                len: len.max(1),
            };
        }
        let f = (value - min) / step;
        let index = f.floor();
        CellPosition {
            index: index as isize,
            fraction: f - index,
            len,
        }
    }

    #[inline]
    fn clamped(&self, offset: isize) -> usize {
        (self.index + offset).clamp(0, self.len as isize - 1) as usize
    }
}

/// One-dimensional Catmull-Rom style cubic through p0..p3 at `x` ∈ [0, 1]
/// between p1 and p2.
pub fn cubic_1d<T>(p: [T; 4], x: f64) -> T
where
    T: Copy + Add<Output = T> + Sub<Output = T> + Mul<f64, Output = T>,
{
    let a = p[0] * 2.0 - p[1] * 5.0 + p[2] * 4.0 - p[3];
    let b = (p[1] - p[2]) * 3.0 + p[3] - p[0];
    p[1] + (p[2] - p[0] + (a + b * x) * x) * (0.5 * x)
}

pub fn linear_1d<T>(p0: T, p1: T, x: f64) -> T
where
    T: Copy + Add<Output = T> + Mul<f64, Output = T>,
{
    p0 * (1.0 - x) + p1 * x
}

/// Interpolate at `cells` using `sample(indices)` for grid values.
pub fn interpolate<T, F>(kernel: Kernel, cells: &[CellPosition], sample: &F) -> T
where
    T: Copy + Add<Output = T> + Sub<Output = T> + Mul<f64, Output = T>,
    F: Fn(&[usize]) -> T,
{
    debug_assert!(!cells.is_empty() && cells.len() <= MAX_AXES);
    let mut indices = [0usize; MAX_AXES];
    recurse(kernel, cells, 0, &mut indices, sample)
}

fn recurse<T, F>(
    kernel: Kernel,
    cells: &[CellPosition],
    axis: usize,
    indices: &mut [usize; MAX_AXES],
    sample: &F,
) -> T
where
    T: Copy + Add<Output = T> + Sub<Output = T> + Mul<f64, Output = T>,
    F: Fn(&[usize]) -> T,
{
    if axis == cells.len() {
        return sample(&indices[..cells.len()]);
    }
    let cell = cells[axis];
    let mut at = |offset: isize| {
        indices[axis] = cell.clamped(offset);
        recurse(kernel, cells, axis + 1, indices, sample)
    };
    match kernel {
        Kernel::Nearest => at(if cell.fraction < 0.5 { 0 } else { 1 }),
        Kernel::Linear => {
            let v0 = at(0);
            let v1 = at(1);
            linear_1d(v0, v1, cell.fraction)
        }
        Kernel::Cubic => {
            let p = [at(-1), at(0), at(1), at(2)];
            cubic_1d(p, cell.fraction)
        }
    }
}
