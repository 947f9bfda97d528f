// ─────────────────────────────────────────────────────────────────────
// SCPN Beam Core — Field Query
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Field lookup at a global point, for diagnostics and export tooling.

use beam_field::model::{FieldModel, FieldVector};
use beam_field::types::FieldType;
use nalgebra::Vector3;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldQuery {
    pub field: FieldVector,
    pub field_type: FieldType,
    /// The point lies outside a field map; `field` is zero
    pub outside: bool,
}

impl FieldQuery {
    pub fn sample(model: &dyn FieldModel, field_type: FieldType, position: &Vector3<f64>, t: f64) -> Self {
        let sample = model.evaluate(position, t);
        FieldQuery {
            field: sample.field,
            field_type,
            outside: sample.outside,
        }
    }
}

impl fmt::Display for FieldQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b = &self.field.magnetic;
        let e = &self.field.electric;
        write!(
            f,
            "{}: B = ({:.6e}, {:.6e}, {:.6e}) T, E = ({:.6e}, {:.6e}, {:.6e}) V/m",
            self.field_type, b.x, b.y, b.z, e.x, e.y, e.z
        )?;
        if self.outside {
            f.write_str(" [outside]")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use beam_field::model::ZeroField;
    use beam_field::multipole::QuadrupoleField;

    #[test]
    fn test_sample_reports_type_and_field() {
        let quad = QuadrupoleField::new(2.0);
        let q = FieldQuery::sample(&quad, FieldType::Quadrupole, &Vector3::new(0.01, 0.02, 0.0), 0.0);
        assert_eq!(q.field_type, FieldType::Quadrupole);
        assert!((q.field.magnetic - Vector3::new(0.04, 0.02, 0.0)).norm() < 1e-15);
        assert!(!q.outside);
    }

    #[test]
    fn test_display() {
        let q = FieldQuery::sample(&ZeroField, FieldType::Zero, &Vector3::zeros(), 0.0);
        let text = q.to_string();
        assert!(text.starts_with("zero: B = ("), "{text}");
        assert!(!text.contains("outside"));
    }
}
