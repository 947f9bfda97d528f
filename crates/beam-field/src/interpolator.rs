// ─────────────────────────────────────────────────────────────────────
// SCPN Beam Core — Field Map Interpolators
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
use crate::array::FieldArray;
use beam_math::interp::{interpolate, CellPosition, Kernel, MAX_AXES};
use beam_types::error::{BeamError, BeamResult};
use nalgebra::Vector3;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Interpolation kernel plus the array dimensionality it is written for.
/// `dimensions == None` is the "auto" kind, resolved against the array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InterpolatorType {
    pub kernel: Kernel,
    pub dimensions: Option<usize>,
}

impl InterpolatorType {
    pub fn auto(kernel: Kernel) -> Self {
        InterpolatorType {
            kernel,
            dimensions: None,
        }
    }

    pub fn fixed(kernel: Kernel, dimensions: usize) -> Self {
        InterpolatorType {
            kernel,
            dimensions: Some(dimensions),
        }
    }

    pub fn is_auto(&self) -> bool {
        self.dimensions.is_none()
    }

    /// Concrete kind for an array of `ndim` dimensions.
    pub fn resolve(&self, ndim: usize) -> BeamResult<InterpolatorType> {
        match self.dimensions {
            None => Ok(InterpolatorType::fixed(self.kernel, ndim)),
            Some(d) if d == ndim => Ok(*self),
            Some(d) => Err(BeamError::InterpolatorMismatch {
                interpolator: self.to_string(),
                expected: d,
                found: ndim,
            }),
        }
    }
}

impl Default for InterpolatorType {
    fn default() -> Self {
        InterpolatorType::auto(Kernel::Cubic)
    }
}

fn kernel_name(kernel: Kernel) -> &'static str {
    match kernel {
        Kernel::Nearest => "nearest",
        Kernel::Linear => "linear",
        Kernel::Cubic => "cubic",
    }
}

impl fmt::Display for InterpolatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.dimensions {
            Some(d) => write!(f, "{}{d}d", kernel_name(self.kernel)),
            None => f.write_str(kernel_name(self.kernel)),
        }
    }
}

impl FromStr for InterpolatorType {
    type Err = BeamError;

    fn from_str(s: &str) -> BeamResult<Self> {
        let key = s.trim().to_ascii_lowercase();
        for kernel in [Kernel::Nearest, Kernel::Linear, Kernel::Cubic] {
            let Some(rest) = key.strip_prefix(kernel_name(kernel)) else {
                continue;
            };
            if rest.is_empty() || rest == "auto" {
                return Ok(InterpolatorType::auto(kernel));
            }
            if let Some(d) = rest.strip_suffix('d').and_then(|n| n.parse::<usize>().ok()) {
                if (1..=MAX_AXES).contains(&d) {
                    return Ok(InterpolatorType::fixed(kernel, d));
                }
            }
        }
        Err(BeamError::UnknownInterpolatorType(s.to_string()))
    }
}

/// An interpolator bound to one shared field array.
#[derive(Debug, Clone)]
pub struct Interpolator {
    array: Arc<FieldArray>,
    kind: InterpolatorType,
}

impl Interpolator {
    pub fn new(array: Arc<FieldArray>, requested: InterpolatorType) -> BeamResult<Self> {
        let kind = requested.resolve(array.ndim())?;
        Ok(Interpolator { array, kind })
    }

    /// The resolved (never auto) kind.
    pub fn kind(&self) -> InterpolatorType {
        self.kind
    }

    pub fn array(&self) -> &Arc<FieldArray> {
        &self.array
    }

    /// Field at `coords` (one per array axis, in axis order), or `None`
    /// outside the array domain.
    pub fn value(&self, coords: &[f64]) -> Option<Vector3<f64>> {
        let axes = self.array.axes();
        if coords.len() != axes.len() {
            return None;
        }
        let mut cells = [CellPosition::new(0.0, 0.0, 0.0, 1); MAX_AXES];
        for (i, (axis, &c)) in axes.iter().zip(coords).enumerate() {
            if !axis.contains(c) {
                return None;
            }
            cells[i] = axis.cell(c);
        }
        let array = &self.array;
        let sample = |idx: &[usize]| array.value(idx);
        Some(interpolate(self.kind.kernel, &cells[..axes.len()], &sample))
    }
}
