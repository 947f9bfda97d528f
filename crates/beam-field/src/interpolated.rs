// ─────────────────────────────────────────────────────────────────────
// SCPN Beam Core — Map-Backed Fields
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
use crate::array::Dimension;
use crate::interpolator::Interpolator;
use crate::model::{FieldModel, FieldSample, FieldVector};
use crate::types::FieldClass;
use nalgebra::Vector3;

/// A magnetic or electric field read from a shared field map.
///
/// Queries outside the map domain return a zero field flagged `outside`.
#[derive(Debug, Clone)]
pub struct InterpolatedField {
    interpolator: Interpolator,
    dimensions: Vec<Dimension>,
    scaling: f64,
    electric: bool,
}

impl InterpolatedField {
    pub fn magnetic(interpolator: Interpolator, scaling: f64) -> Self {
        InterpolatedField::new(interpolator, scaling, false)
    }

    pub fn electric(interpolator: Interpolator, scaling: f64) -> Self {
        InterpolatedField::new(interpolator, scaling, true)
    }

    fn new(interpolator: Interpolator, scaling: f64, electric: bool) -> Self {
        let dimensions = interpolator
            .array()
            .axes()
            .iter()
            .map(|a| a.dimension)
            .collect();
        InterpolatedField {
            interpolator,
            dimensions,
            scaling,
            electric,
        }
    }

    pub fn class(&self) -> FieldClass {
        if self.electric {
            FieldClass::Electric
        } else {
            FieldClass::Magnetic
        }
    }

    pub fn interpolator(&self) -> &Interpolator {
        &self.interpolator
    }
}

impl FieldModel for InterpolatedField {
    fn evaluate(&self, position: &Vector3<f64>, t: f64) -> FieldSample {
        let mut coords = [0.0; 4];
        for (slot, dim) in coords.iter_mut().zip(&self.dimensions) {
            *slot = match dim {
                Dimension::X => position.x,
                Dimension::Y => position.y,
                Dimension::Z => position.z,
                Dimension::T => t,
            };
        }
        match self.interpolator.value(&coords[..self.dimensions.len()]) {
            None => FieldSample::outside(),
            Some(v) => {
                let v = v * self.scaling;
                if self.electric {
                    FieldSample::inside(FieldVector::electric(v))
                } else {
                    FieldSample::inside(FieldVector::magnetic(v))
                }
            }
        }
    }

    fn smallest_spatial_step(&self) -> Option<f64> {
        self.interpolator.array().smallest_spatial_step()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::array::{Axis, FieldArray};
    use crate::interpolator::InterpolatorType;
    use std::sync::Arc;

    fn xz_map() -> Arc<FieldArray> {
        let axes = vec![
            Axis::new(Dimension::X, -0.1, 0.1, 11),
            Axis::new(Dimension::Z, 0.0, 1.0, 11),
        ];
        Arc::new(FieldArray::from_fn(axes, |c| Vector3::new(0.0, 2.0 * c[0] + c[1], 0.0)).unwrap())
    }

    #[test]
    fn test_2d_map_uses_bound_axes() {
        let interp = Interpolator::new(xz_map(), InterpolatorType::default()).unwrap();
        let field = InterpolatedField::magnetic(interp, 0.5);
        // y is not a map axis, so it does not matter
        let s = field.evaluate(&Vector3::new(0.05, 123.0, 0.5), 0.0);
        assert!(!s.outside);
        assert!((s.field.magnetic.y - 0.5 * (0.1 + 0.5)).abs() < 1e-12);
        assert_eq!(s.field.electric, Vector3::zeros());
    }

    #[test]
    fn test_outside_flag() {
        let interp = Interpolator::new(xz_map(), InterpolatorType::default()).unwrap();
        let field = InterpolatedField::electric(interp, 1.0);
        let s = field.evaluate(&Vector3::new(0.0, 0.0, 1.5), 0.0);
        assert!(s.outside);
        assert!(s.field.is_zero());
        assert_eq!(field.class(), FieldClass::Electric);
    }

    #[test]
    fn test_smallest_step() {
        let interp = Interpolator::new(xz_map(), InterpolatorType::default()).unwrap();
        let field = InterpolatedField::magnetic(interp, 1.0);
        let step = field.smallest_spatial_step().unwrap();
        assert!((step - 0.02).abs() < 1e-12);
    }
}
