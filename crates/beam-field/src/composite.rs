// ─────────────────────────────────────────────────────────────────────
// SCPN Beam Core — Composite Fields
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Fields built from other fields: rotated, displaced, summed, layered.

use crate::model::{min_step, FieldModel, FieldSample};
use beam_math::vector::rotate_z;
use nalgebra::{Isometry3, Vector3};
use std::sync::Arc;

/// A field rotated by a fixed angle about the local z axis.
#[derive(Debug, Clone)]
pub struct SkewedField {
    inner: Arc<dyn FieldModel>,
    angle: f64,
}

impl SkewedField {
    pub fn new(inner: Arc<dyn FieldModel>, angle: f64) -> Self {
        SkewedField { inner, angle }
    }
}

impl FieldModel for SkewedField {
    fn evaluate(&self, position: &Vector3<f64>, t: f64) -> FieldSample {
        let rotated = rotate_z(position, self.angle);
        let mut sample = self.inner.evaluate(&rotated, t);
        sample.field = sample.field.map(|v| rotate_z(v, -self.angle));
        sample
    }

    fn smallest_spatial_step(&self) -> Option<f64> {
        self.inner.smallest_spatial_step()
    }
}

/// A field placed by a rigid transform and delayed by a time offset.
///
/// `transform` maps the field's own frame into the frame the caller
/// evaluates in.
#[derive(Debug, Clone)]
pub struct TransformedField {
    inner: Arc<dyn FieldModel>,
    transform: Isometry3<f64>,
    time_offset: f64,
}

impl TransformedField {
    pub fn new(inner: Arc<dyn FieldModel>, transform: Isometry3<f64>, time_offset: f64) -> Self {
        TransformedField {
            inner,
            transform,
            time_offset,
        }
    }

    pub fn is_identity(&self) -> bool {
        self.transform == Isometry3::identity() && self.time_offset == 0.0
    }
}

impl FieldModel for TransformedField {
    fn evaluate(&self, position: &Vector3<f64>, t: f64) -> FieldSample {
        let local = self
            .transform
            .inverse_transform_point(&(*position).into())
            .coords;
        let mut sample = self.inner.evaluate(&local, t - self.time_offset);
        let rotation = self.transform.rotation;
        sample.field = sample.field.map(|v| rotation * v);
        sample
    }

    fn smallest_spatial_step(&self) -> Option<f64> {
        self.inner.smallest_spatial_step()
    }
}

/// One displaced contribution to a [`VectorSumField`].
#[derive(Debug, Clone)]
pub struct SumComponent {
    pub field: Arc<dyn FieldModel>,
    /// Origin of the component in the parent frame
    pub offset: Vector3<f64>,
    pub time_offset: f64,
    /// The component contributes only where |local z| <= half_length
    pub half_length: f64,
}

/// Superposition of displaced, possibly overlapping field regions.
#[derive(Debug, Clone, Default)]
pub struct VectorSumField {
    components: Vec<SumComponent>,
}

impl VectorSumField {
    pub fn new(components: Vec<SumComponent>) -> Self {
        VectorSumField { components }
    }

    pub fn push(&mut self, component: SumComponent) {
        self.components.push(component);
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}

impl FieldModel for VectorSumField {
    fn evaluate(&self, position: &Vector3<f64>, t: f64) -> FieldSample {
        let mut total = FieldSample::inside(crate::model::FieldVector::zero());
        let mut any_inside = self.components.is_empty();
        for c in &self.components {
            let local = position - c.offset;
            if local.z.abs() > c.half_length {
                continue;
            }
            let sample = c.field.evaluate(&local, t - c.time_offset);
            any_inside |= !sample.outside;
            total.field += sample.field;
        }
        total.outside = !any_inside;
        total
    }

    fn smallest_spatial_step(&self) -> Option<f64> {
        self.components
            .iter()
            .fold(None, |acc, c| min_step(acc, c.field.smallest_spatial_step()))
    }
}

/// A main field and a sub-field evaluated at the same point and summed.
/// Each layer carries its own placement, so the two may be offset.
#[derive(Debug, Clone)]
pub struct LayeredField {
    main: Arc<dyn FieldModel>,
    sub: Arc<dyn FieldModel>,
}

impl LayeredField {
    pub fn new(main: Arc<dyn FieldModel>, sub: Arc<dyn FieldModel>) -> Self {
        LayeredField { main, sub }
    }
}

impl FieldModel for LayeredField {
    fn evaluate(&self, position: &Vector3<f64>, t: f64) -> FieldSample {
        let a = self.main.evaluate(position, t);
        let b = self.sub.evaluate(position, t);
        FieldSample {
            field: a.field + b.field,
            outside: a.outside && b.outside,
        }
    }

    fn smallest_spatial_step(&self) -> Option<f64> {
        min_step(
            self.main.smallest_spatial_step(),
            self.sub.smallest_spatial_step(),
        )
    }
}
