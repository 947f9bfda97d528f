// ─────────────────────────────────────────────────────────────────────
// SCPN Beam Core — Field Map Arrays
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Regular N-D grids (N = 1..4) of field-vector samples.
//!
//! Each grid axis is bound to one of x, y, z or t. Samples are stored in
//! an `ndarray::ArrayD` whose axis order matches `axes`.

use beam_math::interp::CellPosition;
use beam_types::error::{BeamError, BeamResult};
use nalgebra::Vector3;
use ndarray::Dimension as _;
use ndarray::{ArrayD, IxDyn};
use std::fmt;
use std::str::FromStr;

/// Relative tolerance for treating a coordinate as lying on an axis edge.
const EDGE_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Dimension {
    X,
    Y,
    Z,
    T,
}

impl Dimension {
    pub const ALL: [Dimension; 4] = [Dimension::X, Dimension::Y, Dimension::Z, Dimension::T];

    pub fn label(&self) -> &'static str {
        match self {
            Dimension::X => "x",
            Dimension::Y => "y",
            Dimension::Z => "z",
            Dimension::T => "t",
        }
    }

    /// Index of the field component aligned with this axis.
    fn component(&self) -> Option<usize> {
        match self {
            Dimension::X => Some(0),
            Dimension::Y => Some(1),
            Dimension::Z => Some(2),
            Dimension::T => None,
        }
    }
}

/// One regular axis: `len` samples from `min` to `max` inclusive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Axis {
    pub dimension: Dimension,
    pub min: f64,
    pub max: f64,
    pub len: usize,
}

impl Axis {
    pub fn new(dimension: Dimension, min: f64, max: f64, len: usize) -> Self {
        Axis {
            dimension,
            min,
            max,
            len,
        }
    }

    pub fn step(&self) -> f64 {
        if self.len < 2 {
            0.0
        } else {
            (self.max - self.min) / (self.len - 1) as f64
        }
    }

    pub fn coordinate(&self, index: usize) -> f64 {
        self.min + self.step() * index as f64
    }

    pub fn contains(&self, value: f64) -> bool {
        let tol = EDGE_TOLERANCE * (self.max - self.min).abs().max(1.0);
        value >= self.min - tol && value <= self.max + tol
    }

    pub fn cell(&self, value: f64) -> CellPosition {
        CellPosition::new(value, self.min, self.step(), self.len)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldArray {
    axes: Vec<Axis>,
    values: ArrayD<Vector3<f64>>,
}

impl FieldArray {
    pub fn new(axes: Vec<Axis>, values: ArrayD<Vector3<f64>>) -> BeamResult<Self> {
        if axes.is_empty() || axes.len() > 4 {
            return Err(BeamError::DimensionMismatch {
                name: "field array".to_string(),
                expected: 4,
                found: axes.len(),
            });
        }
        let shape: Vec<usize> = axes.iter().map(|a| a.len).collect();
        if values.shape() != shape.as_slice() {
            return Err(BeamError::DimensionMismatch {
                name: "field array shape".to_string(),
                expected: shape.iter().product(),
                found: values.len(),
            });
        }
        Ok(FieldArray { axes, values })
    }

    /// Build an array by sampling `f` at every grid point.
    pub fn from_fn<F>(axes: Vec<Axis>, f: F) -> BeamResult<Self>
    where
        F: Fn(&[f64]) -> Vector3<f64>,
    {
        let shape: Vec<usize> = axes.iter().map(|a| a.len).collect();
        let values = ArrayD::from_shape_fn(IxDyn(&shape), |idx| {
            let coords: Vec<f64> = axes
                .iter()
                .enumerate()
                .map(|(i, a)| a.coordinate(idx[i]))
                .collect();
            f(&coords)
        });
        FieldArray::new(axes, values)
    }

    pub fn ndim(&self) -> usize {
        self.axes.len()
    }

    pub fn axes(&self) -> &[Axis] {
        &self.axes
    }

    pub fn shape(&self) -> &[usize] {
        self.values.shape()
    }

    pub fn value(&self, indices: &[usize]) -> Vector3<f64> {
        self.values[IxDyn(indices)]
    }

    /// Smallest spacing over the spatial axes.
    pub fn smallest_spatial_step(&self) -> Option<f64> {
        self.axes
            .iter()
            .filter(|a| a.dimension != Dimension::T && a.len > 1)
            .map(|a| a.step().abs())
            .fold(None, |acc: Option<f64>, s| Some(acc.map_or(s, |m| m.min(s))))
    }

    fn axis_index(&self, dimension: Dimension) -> BeamResult<usize> {
        self.axes
            .iter()
            .position(|a| a.dimension == dimension)
            .ok_or_else(|| {
                BeamError::ConfigError(format!(
                    "reflection along {} requested for an array without that axis",
                    dimension.label()
                ))
            })
    }

    /// Negate the coordinates of one axis; sample values are unchanged.
    pub fn flip(&self, dimension: Dimension) -> BeamResult<FieldArray> {
        let k = self.axis_index(dimension)?;
        let mut axes = self.axes.clone();
        let a = axes[k];
        axes[k] = Axis::new(a.dimension, -a.max, -a.min, a.len);
        let mut values = self.values.clone();
        values.invert_axis(ndarray::Axis(k));
        FieldArray::new(axes, values)
    }

    /// Mirror a half-space array (axis starting at zero) into the
    /// full domain. Mirrored samples are multiplied component-wise by `signs`.
    pub fn mirror(&self, dimension: Dimension, signs: [f64; 3]) -> BeamResult<FieldArray> {
        let k = self.axis_index(dimension)?;
        let a = self.axes[k];
        let tol = EDGE_TOLERANCE * (a.max - a.min).abs().max(1.0);
        if a.min.abs() > tol || a.len < 2 {
            return Err(BeamError::ConfigError(format!(
                "reflection along {} needs an axis starting at zero with at least two samples, got [{}, {}]",
                dimension.label(),
                a.min,
                a.max
            )));
        }
        // the sample on zero is shared, not duplicated
        let extra = a.len - 1;
        let new_len = a.len + extra;
        let new_min = -a.max;
        let mut axes = self.axes.clone();
        axes[k] = Axis::new(a.dimension, new_min, a.max, new_len);

        let mut shape = self.values.shape().to_vec();
        shape[k] = new_len;
        let sign = Vector3::new(signs[0], signs[1], signs[2]);
        let values = ArrayD::from_shape_fn(IxDyn(&shape), |idx| {
            let mut src: Vec<usize> = idx.slice().to_vec();
            let i = idx[k];
            if i < extra {
                // mirrored half, walking outwards from the axis maximum
                src[k] = a.len - 1 - i;
                self.values[IxDyn(&src)].component_mul(&sign)
            } else {
                src[k] = i - extra;
                self.values[IxDyn(&src)]
            }
        });
        FieldArray::new(axes, values)
    }

    /// Apply reflections in order.
    pub fn reflect(&self, reflections: &[Reflection]) -> BeamResult<FieldArray> {
        let mut out = self.clone();
        for r in reflections {
            out = r.apply(&out)?;
        }
        Ok(out)
    }

    /// Swap two axes of equal extent, for diagonal symmetry. Samples are
    /// taken from the transposed position with the two named field
    /// components exchanged, wherever the second coordinate exceeds the first.
    pub fn diagonal_reflect(&self, first: Dimension, second: Dimension) -> BeamResult<FieldArray> {
        let i = self.axis_index(first)?;
        let j = self.axis_index(second)?;
        let (a, b) = (self.axes[i], self.axes[j]);
        let tol = EDGE_TOLERANCE * (a.max - a.min).abs().max(1.0);
        if a.len != b.len || (a.min - b.min).abs() > tol || (a.max - b.max).abs() > tol {
            return Err(BeamError::ConfigError(format!(
                "diagonal reflection needs matching {} and {} axes",
                first.label(),
                second.label()
            )));
        }
        let (ci, cj) = match (first.component(), second.component()) {
            (Some(ci), Some(cj)) => (ci, cj),
            _ => {
                return Err(BeamError::ConfigError(
                    "diagonal reflection is only defined for spatial axes".to_string(),
                ))
            }
        };
        let values = ArrayD::from_shape_fn(self.values.raw_dim(), |idx| {
            if idx[j] > idx[i] {
                let mut src: Vec<usize> = idx.slice().to_vec();
                src.swap(i, j);
                let mut v = self.values[IxDyn(&src)];
                v.swap_rows(ci, cj);
                v
            } else {
                self.values[idx]
            }
        });
        FieldArray::new(self.axes.clone(), values)
    }
}

impl fmt::Display for FieldArray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dims: Vec<String> = self
            .axes
            .iter()
            .map(|a| format!("{}[{}..{}; {}]", a.dimension.label(), a.min, a.max, a.len))
            .collect();
        write!(f, "{}D field array {}", self.ndim(), dims.join(" "))
    }
}

/// Symmetry expansion applied once at load time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Reflection {
    /// Negate one coordinate axis
    Flip(Dimension),
    /// Mirror one axis with unchanged field values
    Reflect(Dimension),
    ReflectXYDipole,
    ReflectXZDipole,
    ReflectYZDipole,
    ReflectXYQuadrupole,
}

// Field parity of a dipole (vertical field) under each mirror
const DIPOLE_X: [f64; 3] = [-1.0, 1.0, 1.0];
const DIPOLE_Y: [f64; 3] = [-1.0, 1.0, -1.0];
const DIPOLE_Z: [f64; 3] = [1.0, 1.0, -1.0];
// Field parity of a normal quadrupole, B = g (y, x, 0)
const QUAD_X: [f64; 3] = [1.0, -1.0, -1.0];
const QUAD_Y: [f64; 3] = [-1.0, 1.0, -1.0];

impl Reflection {
    pub fn apply(&self, array: &FieldArray) -> BeamResult<FieldArray> {
        let same = [1.0, 1.0, 1.0];
        match self {
            Reflection::Flip(d) => array.flip(*d),
            Reflection::Reflect(d) => array.mirror(*d, same),
            Reflection::ReflectXYDipole => array
                .mirror(Dimension::X, DIPOLE_X)?
                .mirror(Dimension::Y, DIPOLE_Y),
            Reflection::ReflectXZDipole => array
                .mirror(Dimension::X, DIPOLE_X)?
                .mirror(Dimension::Z, DIPOLE_Z),
            Reflection::ReflectYZDipole => array
                .mirror(Dimension::Y, DIPOLE_Y)?
                .mirror(Dimension::Z, DIPOLE_Z),
            Reflection::ReflectXYQuadrupole => array
                .mirror(Dimension::X, QUAD_X)?
                .mirror(Dimension::Y, QUAD_Y),
        }
    }

    /// Parse a whitespace-separated list such as `"flipx reflectxydipole"`.
    pub fn parse_list(text: &str) -> BeamResult<Vec<Reflection>> {
        text.split_whitespace().map(str::parse).collect()
    }
}

impl FromStr for Reflection {
    type Err = BeamError;

    fn from_str(s: &str) -> BeamResult<Self> {
        let key = s.trim().to_ascii_lowercase();
        let axis = |c: &str| match c {
            "x" => Some(Dimension::X),
            "y" => Some(Dimension::Y),
            "z" => Some(Dimension::Z),
            "t" => Some(Dimension::T),
            _ => None,
        };
        let parsed = match key.as_str() {
            "reflectxydipole" => Some(Reflection::ReflectXYDipole),
            "reflectxzdipole" => Some(Reflection::ReflectXZDipole),
            "reflectyzdipole" => Some(Reflection::ReflectYZDipole),
            "reflectxyquadrupole" => Some(Reflection::ReflectXYQuadrupole),
            other => {
                if let Some(d) = other.strip_prefix("flip").and_then(axis) {
                    Some(Reflection::Flip(d))
                } else {
                    other
                        .strip_prefix("reflect")
                        .and_then(axis)
                        .map(Reflection::Reflect)
                }
            }
        };
        parsed.ok_or_else(|| BeamError::UnknownReflectionType(s.to_string()))
    }
}
