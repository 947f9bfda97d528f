// ─────────────────────────────────────────────────────────────────────
// SCPN Beam Core — Coordinate Transform
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Conversion between the global frame and the local frame of an element.
//!
//! Each element is described by one or more [`Segment`]s. A segment's
//! `reference` isometry maps the straight chord frame of the design path
//! (origin at the chord centre, z along the chord) into the global frame.
//! `offset` places the physical element inside that reference frame
//! (misalignment, tilt). Bent segments additionally resolve a point's
//! partial angle along the arc, which turns the chord frame into a locally
//! straight curvilinear frame:
//!
//! ```text
//! ρ   = L / α              (signed)
//! ρ_c = ρ · cos(α/2)       (distance from the centre of curvature to the chord)
//! φ   = atan(Z / ρ_c)
//! x_cl = X − ρ·(cos φ − cos(α/2))
//! p_cl = R_y(φ) · p
//! ```
//!
//! A positive angle bends the design path towards −x. `Z` is left
//! unchanged, so the inverse is exact.

use beam_math::vector::rotate_y;
use nalgebra::{Isometry3, Point3, Vector3};

/// Circular arc of the design path inside a segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bend {
    /// [rad]
    pub angle: f64,
    pub arc_length: f64,
}

impl Bend {
    pub fn radius(&self) -> f64 {
        self.arc_length / self.angle
    }

    pub fn radius_at_chord(&self) -> f64 {
        self.radius() * (0.5 * self.angle).cos()
    }

    pub fn chord_length(&self) -> f64 {
        2.0 * self.radius() * (0.5 * self.angle).sin()
    }

    /// Curvature of the design path, positive when bending towards −x.
    pub fn curvature(&self) -> f64 {
        self.angle / self.arc_length
    }

    /// Partial angle of chord-frame coordinate `z`, in `[-α/2, α/2]` inside the segment.
    pub fn partial_angle(&self, z: f64) -> f64 {
        (z / self.radius_at_chord()).atan()
    }

    /// Chord-frame z of partial angle `phi`.
    pub fn chord_z(&self, phi: f64) -> f64 {
        self.radius_at_chord() * phi.tan()
    }

    /// Offset of the arc from the chord at partial angle `phi`.
    fn sagitta(&self, phi: f64) -> f64 {
        self.radius() * (phi.cos() - (0.5 * self.angle).cos())
    }

    fn is_curved(&self) -> bool {
        self.angle.is_finite() && self.angle != 0.0 && self.arc_length > 0.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub reference: Isometry3<f64>,
    pub offset: Isometry3<f64>,
    /// Half the chord length
    pub half_length: f64,
    pub bend: Option<Bend>,
}

impl Segment {
    pub fn straight(reference: Isometry3<f64>, length: f64) -> Self {
        Segment {
            reference,
            offset: Isometry3::identity(),
            half_length: 0.5 * length,
            bend: None,
        }
    }

    /// `angle` [rad] over `arc_length`. A zero or non-finite angle gives a
    /// straight segment of that length.
    pub fn bent(reference: Isometry3<f64>, angle: f64, arc_length: f64) -> Self {
        let bend = Bend { angle, arc_length };
        if !bend.is_curved() {
            return Segment::straight(reference, arc_length);
        }
        Segment {
            reference,
            offset: Isometry3::identity(),
            half_length: 0.5 * bend.chord_length().abs(),
            bend: Some(bend),
        }
    }

    pub fn with_offset(mut self, offset: Isometry3<f64>) -> Self {
        self.offset = offset;
        self
    }

    fn frame(&self, curved: bool) -> Isometry3<f64> {
        if curved {
            self.reference
        } else {
            self.reference * self.offset
        }
    }

    fn curved_bend(&self, curved: bool) -> Option<&Bend> {
        self.bend.as_ref().filter(|b| curved && b.is_curved())
    }
}

/// Position and momentum in one segment's local frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalStep {
    pub position: Vector3<f64>,
    pub momentum: Vector3<f64>,
    /// Segment the conversion used; the inverse must use the same one
    pub segment: usize,
    pub curved: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CoordinateTransform {
    segments: Vec<Segment>,
}

impl Default for CoordinateTransform {
    fn default() -> Self {
        CoordinateTransform::identity()
    }
}

impl CoordinateTransform {
    /// Global frame equals local frame everywhere.
    pub fn identity() -> Self {
        CoordinateTransform {
            segments: vec![Segment::straight(Isometry3::identity(), f64::INFINITY)],
        }
    }

    pub fn straight(reference: Isometry3<f64>, length: f64) -> Self {
        CoordinateTransform {
            segments: vec![Segment::straight(reference, length)],
        }
    }

    pub fn bent(reference: Isometry3<f64>, angle: f64, arc_length: f64) -> Self {
        CoordinateTransform {
            segments: vec![Segment::bent(reference, angle, arc_length)],
        }
    }

    /// An element made of several segments. An empty list gives the identity.
    pub fn from_segments(segments: Vec<Segment>) -> Self {
        if segments.is_empty() {
            return CoordinateTransform::identity();
        }
        CoordinateTransform { segments }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Bend of the first segment, if any.
    pub fn bend(&self) -> Option<Bend> {
        self.segments.first().and_then(|s| s.bend)
    }

    /// Pick the segment that contains the midpoint of the coming step,
    /// or the nearest one when the probe lies outside them all.
    fn locate(&self, position: &Vector3<f64>, direction: &Vector3<f64>, h: f64) -> usize {
        let probe = Point3::from(position + 0.5 * h * direction);
        let mut best = (0, f64::INFINITY);
        for (i, segment) in self.segments.iter().enumerate() {
            let z = segment.reference.inverse_transform_point(&probe).z;
            let excess = z.abs() - segment.half_length;
            if excess <= 0.0 {
                return i;
            }
            if excess < best.1 {
                best = (i, excess);
            }
        }
        best.0
    }

    /// Global position and momentum into the local frame.
    ///
    /// With `curved` the reference frame is used and a bent segment is
    /// further unrolled into curvilinear coordinates; without it the
    /// element's own (offset) straight frame is used.
    pub fn to_local(
        &self,
        position: &Vector3<f64>,
        momentum: &Vector3<f64>,
        h: f64,
        curved: bool,
    ) -> LocalStep {
        let norm = momentum.norm();
        let direction = if norm > 0.0 { momentum / norm } else { Vector3::zeros() };
        let index = self.locate(position, &direction, h);
        let segment = &self.segments[index];
        let frame = segment.frame(curved);
        let mut local_pos = frame.inverse_transform_point(&Point3::from(*position)).coords;
        let mut local_mom = frame.inverse_transform_vector(momentum);

        if let Some(bend) = segment.curved_bend(curved) {
            let phi = bend.partial_angle(local_pos.z);
            local_pos.x -= bend.sagitta(phi);
            local_mom = rotate_y(&local_mom, phi);
        }
        LocalStep {
            position: local_pos,
            momentum: local_mom,
            segment: index,
            curved,
        }
    }

    /// Exact inverse of [`CoordinateTransform::to_local`].
    pub fn to_global(&self, local: &LocalStep) -> (Vector3<f64>, Vector3<f64>) {
        let segment = &self.segments[local.segment.min(self.segments.len() - 1)];
        let mut pos = local.position;
        let mut mom = local.momentum;
        if let Some(bend) = segment.curved_bend(local.curved) {
            let phi = bend.partial_angle(pos.z);
            pos.x += bend.sagitta(phi);
            mom = rotate_y(&mom, -phi);
        }
        let frame = segment.frame(local.curved);
        (
            frame.transform_point(&Point3::from(pos)).coords,
            frame.transform_vector(&mom),
        )
    }

    /// Local field vector back into the global frame (straight element frame).
    pub fn axis_to_global(&self, segment: usize, v: &Vector3<f64>) -> Vector3<f64> {
        let segment = &self.segments[segment.min(self.segments.len() - 1)];
        segment.frame(false).transform_vector(v)
    }
}
