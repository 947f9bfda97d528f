// ─────────────────────────────────────────────────────────────────────
// SCPN Beam Core — Config
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
use crate::constants::*;
use crate::error::{BeamError, BeamResult};
use crate::strength::StrengthTable;
use serde::{Deserialize, Serialize};

/// Top-level field configuration, loaded once during setup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BeamConfig {
    #[serde(default)]
    pub units: Units,
    #[serde(default)]
    pub stepper: StepperSettings,
    /// Integrator set used when a definition names no integrator:
    /// "geant4", "bdsimone" (alias "bdsim") or "bdsimtwo".
    #[serde(default = "default_integrator_set")]
    pub integrator_set: String,
    #[serde(default)]
    pub fields: Vec<FieldDefinition>,
}

/// Host unit system. Only length is configurable; momentum is GeV/c,
/// magnetic field T, electric field V/m and time ns.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Units {
    /// Host length units per metre (1.0 = metres, 1000.0 = millimetres)
    #[serde(default = "default_metre")]
    pub metre: f64,
}

impl Default for Units {
    fn default() -> Self {
        Units {
            metre: default_metre(),
        }
    }
}

impl Units {
    pub fn millimetres() -> Self {
        Units { metre: 1000.0 }
    }

    /// Field-map centimetres to host length.
    pub fn cm(&self) -> f64 {
        METRES_PER_CM * self.metre
    }

    /// Charge-normalised Lorentz factor: GeV/c per host length per tesla.
    pub fn fcof(&self, charge: f64) -> f64 {
        charge * GEV_PER_TESLA_METRE / self.metre
    }

    /// Speed of light in host lengths per ns.
    pub fn c_light(&self) -> f64 {
        C_LIGHT_M_PER_NS * self.metre
    }
}

/// Thresholds handed to every integrator at construction.
///
/// Lengths are in metres here; [`StepperSettings::in_units`] converts them
/// to host lengths.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StepperSettings {
    /// Calibration: minimum z of the local unit momentum for analytic transport (0.9)
    #[serde(default = "default_paraxial_threshold")]
    pub paraxial_threshold: f64,
    #[serde(default = "default_min_radius")]
    pub minimum_radius_of_curvature: f64,
    #[serde(default = "default_thin_element_length")]
    pub thin_element_length: f64,
    /// Calibration: fraction of the thin element length accepted as an edge step (0.5)
    #[serde(default = "default_edge_kick_tolerance")]
    pub edge_kick_tolerance: f64,
    #[serde(default = "default_field_sampling_step")]
    pub field_sampling_step: f64,
    #[serde(default = "default_solenoid_chord_tolerance")]
    pub solenoid_chord_tolerance: f64,
    #[serde(default = "default_outer_spatial_limit")]
    pub outer_spatial_limit: f64,
}

fn default_metre() -> f64 {
    1.0
}
fn default_integrator_set() -> String {
    "bdsimtwo".to_string()
}
fn default_paraxial_threshold() -> f64 {
    DEFAULT_PARAXIAL_THRESHOLD
}
fn default_min_radius() -> f64 {
    DEFAULT_MIN_RADIUS_OF_CURVATURE_M
}
fn default_thin_element_length() -> f64 {
    DEFAULT_THIN_ELEMENT_LENGTH_M
}
fn default_edge_kick_tolerance() -> f64 {
    DEFAULT_EDGE_KICK_TOLERANCE
}
fn default_field_sampling_step() -> f64 {
    DEFAULT_FIELD_SAMPLING_STEP_M
}
fn default_solenoid_chord_tolerance() -> f64 {
    DEFAULT_SOLENOID_CHORD_TOLERANCE
}
fn default_outer_spatial_limit() -> f64 {
    DEFAULT_OUTER_SPATIAL_LIMIT_M
}
fn default_scaling() -> f64 {
    1.0
}

impl Default for StepperSettings {
    fn default() -> Self {
        StepperSettings {
            paraxial_threshold: default_paraxial_threshold(),
            minimum_radius_of_curvature: default_min_radius(),
            thin_element_length: default_thin_element_length(),
            edge_kick_tolerance: default_edge_kick_tolerance(),
            field_sampling_step: default_field_sampling_step(),
            solenoid_chord_tolerance: default_solenoid_chord_tolerance(),
            outer_spatial_limit: default_outer_spatial_limit(),
        }
    }
}

impl StepperSettings {
    /// Copy with every length expressed in host units.
    pub fn in_units(&self, units: &Units) -> StepperSettings {
        StepperSettings {
            minimum_radius_of_curvature: self.minimum_radius_of_curvature * units.metre,
            thin_element_length: self.thin_element_length * units.metre,
            field_sampling_step: self.field_sampling_step * units.metre,
            outer_spatial_limit: self.outer_spatial_limit * units.metre,
            ..*self
        }
    }

    pub fn validate(&self) -> BeamResult<()> {
        if !(self.paraxial_threshold > 0.0 && self.paraxial_threshold <= 1.0) {
            return Err(BeamError::ConfigError(format!(
                "paraxial_threshold must be in (0, 1], got {}",
                self.paraxial_threshold
            )));
        }
        let lengths = [
            ("minimum_radius_of_curvature", self.minimum_radius_of_curvature),
            ("thin_element_length", self.thin_element_length),
            ("field_sampling_step", self.field_sampling_step),
            ("outer_spatial_limit", self.outer_spatial_limit),
        ];
        for (label, value) in lengths {
            if !value.is_finite() || value <= 0.0 {
                return Err(BeamError::ConfigError(format!(
                    "{label} must be finite and > 0, got {value}"
                )));
            }
        }
        if !(self.edge_kick_tolerance > 0.0 && self.edge_kick_tolerance < 1.0) {
            return Err(BeamError::ConfigError(format!(
                "edge_kick_tolerance must be in (0, 1), got {}",
                self.edge_kick_tolerance
            )));
        }
        Ok(())
    }
}

/// One named field as written in the configuration file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDefinition {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub integrator: Option<String>,
    /// Reference rigidity [T·m]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brho: Option<f64>,
    #[serde(default)]
    pub strength: StrengthTable,
    /// Magnetic map as "format:path", e.g. "bdsim3d:maps/quad.dat.gz"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub magnetic_file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub magnetic_interpolator: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub magnetic_reflection: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub electric_file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub electric_interpolator: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub electric_reflection: Option<String>,
    #[serde(default = "default_scaling")]
    pub b_scaling: f64,
    #[serde(default = "default_scaling")]
    pub e_scaling: f64,
    /// [ns]
    #[serde(default)]
    pub time_offset: f64,
    #[serde(flatten)]
    pub placement: PlacementDefinition,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub magnetic_sub_field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub electric_sub_field: Option<String>,
    /// [m]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum_step_length: Option<f64>,
    /// Pole-tip radius for yoke field models [m]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pole_tip_radius: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cavity: Option<CavityDefinition>,
}

/// Rigid field offset: translation [m] plus either Euler angles
/// (phi, theta, psi) or an axis-angle rotation [rad].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacementDefinition {
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default)]
    pub z: f64,
    #[serde(default)]
    pub phi: f64,
    #[serde(default)]
    pub theta: f64,
    #[serde(default)]
    pub psi: f64,
    #[serde(default)]
    pub axis_angle: bool,
    #[serde(default)]
    pub axis_x: f64,
    #[serde(default)]
    pub axis_y: f64,
    #[serde(default)]
    pub axis_z: f64,
    #[serde(default)]
    pub angle: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CavityDefinition {
    /// [Hz]
    pub frequency: f64,
    /// [rad]
    #[serde(default)]
    pub phase: f64,
    /// Peak electric field [V/m]
    #[serde(default)]
    pub efield: f64,
}

impl BeamConfig {
    pub fn from_file(path: &str) -> BeamResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    pub fn from_json_str(contents: &str) -> BeamResult<Self> {
        let config: Self = serde_json::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> BeamResult<()> {
        if !self.units.metre.is_finite() || self.units.metre <= 0.0 {
            return Err(BeamError::ConfigError(format!(
                "units.metre must be finite and > 0, got {}",
                self.units.metre
            )));
        }
        self.stepper.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    /// CARGO_MANIFEST_DIR is crates/beam-types/, the workspace root is two levels up.
    fn config_path(relative: &str) -> String {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("..")
            .join("..")
            .join(relative)
            .to_string_lossy()
            .to_string()
    }

    #[test]
    fn test_load_demo_config() {
        let cfg = BeamConfig::from_file(&config_path("configs/demo_fields.json")).unwrap();
        assert_eq!(cfg.integrator_set, "bdsimtwo");
        assert!(cfg.fields.len() >= 4);
        let quad = cfg.fields.iter().find(|f| f.name == "qf1").unwrap();
        assert_eq!(quad.field_type, "quadrupole");
        assert!((quad.strength.get("k1") - 0.34).abs() < 1e-12);
        assert!((quad.brho.unwrap() - 4.333).abs() < 1e-12);
    }

    #[test]
    fn test_defaults_fill_missing_sections() {
        let cfg = BeamConfig::from_json_str(r#"{"fields": []}"#).unwrap();
        assert_eq!(cfg.units.metre, 1.0);
        assert_eq!(cfg.stepper, StepperSettings::default());
        assert!((cfg.stepper.paraxial_threshold - 0.9).abs() < 1e-15);
    }

    #[test]
    fn test_definition_defaults() {
        let def: FieldDefinition =
            serde_json::from_str(r#"{"name": "d1", "type": "dipole", "x": 0.01}"#).unwrap();
        assert_eq!(def.b_scaling, 1.0);
        assert_eq!(def.e_scaling, 1.0);
        assert!(def.integrator.is_none());
        assert!((def.placement.x - 0.01).abs() < 1e-15);
        assert!(def.strength.is_zero());
    }

    #[test]
    fn test_rejects_bad_paraxial_threshold() {
        let result = BeamConfig::from_json_str(r#"{"stepper": {"paraxial_threshold": 1.5}}"#);
        match result {
            Err(BeamError::ConfigError(msg)) => assert!(msg.contains("paraxial_threshold")),
            other => panic!("Unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_settings_in_millimetres() {
        let s = StepperSettings::default().in_units(&Units::millimetres());
        assert!((s.minimum_radius_of_curvature - 100.0).abs() < 1e-9);
        assert!((s.field_sampling_step - 10.0).abs() < 1e-9);
        assert!((s.paraxial_threshold - 0.9).abs() < 1e-15);
    }

    #[test]
    fn test_roundtrip_serialization() {
        let cfg = BeamConfig::from_file(&config_path("configs/demo_fields.json")).unwrap();
        let json = serde_json::to_string(&cfg).unwrap();
        let back = BeamConfig::from_json_str(&json).unwrap();
        assert_eq!(back.fields.len(), cfg.fields.len());
        assert_eq!(back.fields[0].name, cfg.fields[0].name);
    }

    #[test]
    fn test_from_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.json");
        assert!(matches!(
            BeamConfig::from_file(missing.to_str().unwrap()),
            Err(BeamError::Io(_))
        ));

        let broken = dir.path().join("broken.json");
        std::fs::write(&broken, "{ \"units\": { \"metre\": ").unwrap();
        assert!(matches!(
            BeamConfig::from_file(broken.to_str().unwrap()),
            Err(BeamError::Json(_))
        ));

        let bad_units = dir.path().join("units.json");
        std::fs::write(&bad_units, r#"{ "units": { "metre": -1.0 } }"#).unwrap();
        assert!(matches!(
            BeamConfig::from_file(bad_units.to_str().unwrap()),
            Err(BeamError::ConfigError(_))
        ));
    }
}
