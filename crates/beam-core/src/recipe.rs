// ─────────────────────────────────────────────────────────────────────
// SCPN Beam Core — Field Recipes
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Validated, unit-converted description of one field, built from a
//! [`FieldDefinition`]. Everything the factory needs is parsed here, so
//! a bad tag fails at configuration time with the offending name.

use crate::integrator::IntegratorType;
use beam_field::array::Reflection;
use beam_field::interpolator::InterpolatorType;
use beam_field::loader::{parse_file_spec, FieldFormat};
use beam_field::types::FieldType;
use beam_types::config::{FieldDefinition, PlacementDefinition, Units};
use beam_types::error::{BeamError, BeamResult};
use beam_types::strength::StrengthTable;
use nalgebra::{Isometry3, Rotation3, Translation3, Unit, UnitQuaternion, Vector3};
use std::path::PathBuf;
use std::sync::Arc;

/// One field map reference: where it is, how to read it and how to sample it.
#[derive(Debug, Clone, PartialEq)]
pub struct MapSpec {
    pub format: FieldFormat,
    pub path: PathBuf,
    pub interpolator: InterpolatorType,
    pub reflections: Vec<Reflection>,
    pub scaling: f64,
}

impl MapSpec {
    pub fn new(format: FieldFormat, path: impl Into<PathBuf>) -> Self {
        MapSpec {
            format,
            path: path.into(),
            interpolator: InterpolatorType::default(),
            reflections: Vec::new(),
            scaling: 1.0,
        }
    }

    /// From the `"format:path"`, interpolator and reflection strings of a definition.
    pub fn parse(
        file: &str,
        interpolator: Option<&str>,
        reflection: Option<&str>,
        scaling: f64,
    ) -> BeamResult<Self> {
        let (format, path) = parse_file_spec(file)?;
        let interpolator = match interpolator {
            Some(name) if !name.trim().is_empty() => name.parse()?,
            _ => InterpolatorType::default(),
        };
        let reflections = match reflection {
            Some(text) => Reflection::parse_list(text)?,
            None => Vec::new(),
        };
        Ok(MapSpec {
            format,
            path,
            interpolator,
            reflections,
            scaling,
        })
    }
}

#[derive(Debug, Clone)]
pub struct FieldRecipe {
    pub name: String,
    pub field_type: FieldType,
    /// Explicit integrator; `None` takes the integrator set's default
    pub integrator: Option<IntegratorType>,
    /// Reference rigidity [T·m]
    pub brho: f64,
    pub strength: Arc<StrengthTable>,
    pub magnetic_map: Option<MapSpec>,
    pub electric_map: Option<MapSpec>,
    /// Placement of the field inside the element frame, host units
    pub transform: Isometry3<f64>,
    /// [ns]
    pub time_offset: f64,
    pub magnetic_sub_field: Option<String>,
    pub electric_sub_field: Option<String>,
    /// Host units
    pub maximum_step_length: Option<f64>,
    /// Host units
    pub pole_tip_radius: Option<f64>,
}

impl FieldRecipe {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        FieldRecipe {
            name: name.into(),
            field_type,
            integrator: None,
            brho: 0.0,
            strength: Arc::new(StrengthTable::new()),
            magnetic_map: None,
            electric_map: None,
            transform: Isometry3::identity(),
            time_offset: 0.0,
            magnetic_sub_field: None,
            electric_sub_field: None,
            maximum_step_length: None,
            pole_tip_radius: None,
        }
    }

    pub fn with_strength(mut self, strength: StrengthTable) -> Self {
        self.strength = Arc::new(strength);
        self
    }

    pub fn with_brho(mut self, brho: f64) -> Self {
        self.brho = brho;
        self
    }

    pub fn with_integrator(mut self, integrator: IntegratorType) -> Self {
        self.integrator = Some(integrator);
        self
    }

    pub fn with_magnetic_map(mut self, map: MapSpec) -> Self {
        self.magnetic_map = Some(map);
        self
    }

    pub fn with_electric_map(mut self, map: MapSpec) -> Self {
        self.electric_map = Some(map);
        self
    }

    pub fn with_magnetic_sub_field(mut self, name: impl Into<String>) -> Self {
        self.magnetic_sub_field = Some(name.into());
        self
    }

    pub fn with_transform(mut self, transform: Isometry3<f64>) -> Self {
        self.transform = transform;
        self
    }

    pub fn from_definition(def: &FieldDefinition, units: &Units) -> BeamResult<Self> {
        let field_type: FieldType = def.field_type.parse()?;
        let integrator = match def.integrator.as_deref() {
            Some(name) if !name.trim().is_empty() => Some(name.parse()?),
            _ => None,
        };

        let mut strength = def.strength.clone();
        if let Some(cavity) = &def.cavity {
            strength.set("efield", cavity.efield)?;
            strength.set("frequency", cavity.frequency)?;
            strength.set("phase", cavity.phase)?;
        }

        let magnetic_map = def
            .magnetic_file
            .as_deref()
            .map(|file| {
                MapSpec::parse(
                    file,
                    def.magnetic_interpolator.as_deref(),
                    def.magnetic_reflection.as_deref(),
                    def.b_scaling,
                )
            })
            .transpose()?;
        let electric_map = def
            .electric_file
            .as_deref()
            .map(|file| {
                MapSpec::parse(
                    file,
                    def.electric_interpolator.as_deref(),
                    def.electric_reflection.as_deref(),
                    def.e_scaling,
                )
            })
            .transpose()?;

        Ok(FieldRecipe {
            name: def.name.clone(),
            field_type,
            integrator,
            brho: def.brho.unwrap_or(0.0),
            strength: Arc::new(strength),
            magnetic_map,
            electric_map,
            transform: placement(&def.placement, units)?,
            time_offset: def.time_offset,
            magnetic_sub_field: non_empty(&def.magnetic_sub_field),
            electric_sub_field: non_empty(&def.electric_sub_field),
            maximum_step_length: def.maximum_step_length.map(|l| l * units.metre),
            pole_tip_radius: def.pole_tip_radius.map(|r| r * units.metre),
        })
    }

    /// Sub-field names in build order, magnetic first.
    pub fn sub_fields(&self) -> Vec<&str> {
        [&self.magnetic_sub_field, &self.electric_sub_field]
            .into_iter()
            .flatten()
            .map(String::as_str)
            .collect()
    }

    /// Copy with the sub-field references removed.
    pub fn without_sub_fields(&self) -> FieldRecipe {
        FieldRecipe {
            magnetic_sub_field: None,
            electric_sub_field: None,
            ..self.clone()
        }
    }
}

fn non_empty(name: &Option<String>) -> Option<String> {
    name.as_ref()
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
}

/// Rigid placement: Euler angles `Rz(phi)·Rx(theta)·Rz(psi)`, or an axis and
/// angle when `axis_angle` is set. Translation is given in metres.
pub fn placement(def: &PlacementDefinition, units: &Units) -> BeamResult<Isometry3<f64>> {
    let rotation = if def.axis_angle {
        let axis = Vector3::new(def.axis_x, def.axis_y, def.axis_z);
        if def.angle == 0.0 {
            UnitQuaternion::identity()
        } else {
            let axis = Unit::try_new(axis, 1e-12).ok_or_else(|| {
                BeamError::ConfigError(format!(
                    "rotation axis ({}, {}, {}) has zero length",
                    def.axis_x, def.axis_y, def.axis_z
                ))
            })?;
            UnitQuaternion::from_axis_angle(&axis, def.angle)
        }
    } else {
        let r = Rotation3::from_axis_angle(&Vector3::z_axis(), def.phi)
            * Rotation3::from_axis_angle(&Vector3::x_axis(), def.theta)
            * Rotation3::from_axis_angle(&Vector3::z_axis(), def.psi);
        UnitQuaternion::from_rotation_matrix(&r)
    };
    let translation = Translation3::from(Vector3::new(def.x, def.y, def.z) * units.metre);
    Ok(Isometry3::from_parts(translation, rotation))
}
