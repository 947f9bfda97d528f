// ─────────────────────────────────────────────────────────────────────
// SCPN Beam Core — Yoke Field Approximation
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Field outside the aperture of a multipole magnet.
//!
//! The coils of a 2n-pole magnet are replaced by 2n infinite line
//! currents of alternating sign at the pole-tip radius, placed midway
//! between the poles. The superposition is scaled so that its magnitude
//! at the pole tip equals the inner field there.

use crate::model::{FieldModel, FieldSample};
use nalgebra::{Vector2, Vector3};
use std::f64::consts::PI;

#[derive(Debug, Clone)]
pub struct MultipoleOuterField {
    order: usize,
    /// Line-current positions and signed unit currents
    currents: Vec<(Vector2<f64>, f64)>,
    normalisation: f64,
    pole_tip_field: f64,
    spatial_limit: f64,
}

impl MultipoleOuterField {
    /// `order` 1 = dipole, 2 = quadrupole, ... `positive` selects the
    /// polarity: a dipole is positive when its field is negative, every
    /// other order when its normal strength is positive.
    pub fn new(
        order: usize,
        pole_tip_radius: f64,
        inner: &dyn FieldModel,
        positive: bool,
        spatial_limit: f64,
    ) -> Self {
        let order = order.max(1);
        let segment = PI / order as f64;
        let positions: Vec<Vector2<f64>> = (0..2 * order)
            .map(|k| {
                let angle = k as f64 * segment;
                Vector2::new(pole_tip_radius * angle.cos(), pole_tip_radius * angle.sin())
            })
            .collect();

        let pole_angle = 0.5 * segment;
        let pole = Vector2::new(
            pole_tip_radius * pole_angle.cos(),
            pole_tip_radius * pole_angle.sin(),
        );
        let unit: Vec<(Vector2<f64>, f64)> = positions
            .iter()
            .enumerate()
            .map(|(k, c)| (*c, if k % 2 == 0 { 1.0 } else { -1.0 }))
            .collect();
        let raw_pole = line_current_sum(&unit, &pole, 0.0).0;

        // direction of a positive-convention inner field at the pole tip
        let reference = if order == 1 {
            Vector2::new(0.0, -1.0)
        } else {
            let phase = (order - 1) as f64 * pole_angle;
            Vector2::new(phase.sin(), phase.cos())
        };
        let orientation = if raw_pole.dot(&reference) < 0.0 { -1.0 } else { 1.0 };
        let polarity = if positive { orientation } else { -orientation };
        let currents = unit.into_iter().map(|(c, s)| (c, s * polarity)).collect();

        let inner_pole = inner
            .evaluate(&Vector3::new(pole.x, pole.y, 0.0), 0.0)
            .field
            .magnetic;
        let inner_transverse = Vector2::new(inner_pole.x, inner_pole.y).norm();
        let raw_norm = raw_pole.norm();
        let normalisation = if raw_norm > 0.0 { inner_transverse / raw_norm } else { 0.0 };

        MultipoleOuterField {
            order,
            currents,
            normalisation,
            pole_tip_field: inner_transverse,
            spatial_limit,
        }
    }

    pub fn order(&self) -> usize {
        self.order
    }
}

/// Sum of `ẑ × d / |d|²` over the currents, and whether any lies within `limit`.
fn line_current_sum(currents: &[(Vector2<f64>, f64)], p: &Vector2<f64>, limit: f64) -> (Vector2<f64>, bool) {
    let mut near = false;
    let mut sum = Vector2::zeros();
    for (c, sign) in currents {
        let d = p - c;
        let r2 = d.norm_squared();
        if r2 < limit * limit {
            near = true;
        }
        if r2 > 0.0 {
            sum += Vector2::new(-d.y, d.x) * (sign / r2);
        }
    }
    (sum, near)
}

impl FieldModel for MultipoleOuterField {
    fn evaluate(&self, position: &Vector3<f64>, _t: f64) -> FieldSample {
        let p = Vector2::new(position.x, position.y);
        let (raw, near) = line_current_sum(&self.currents, &p, self.spatial_limit);
        let mut b = raw * self.normalisation;
        if near {
            let mag = b.norm();
            b = if mag > 0.0 {
                b * (self.pole_tip_field / mag)
            } else {
                Vector2::zeros()
            };
        }
        FieldSample::magnetic(Vector3::new(b.x, b.y, 0.0))
    }
}
