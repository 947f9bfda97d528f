// ─────────────────────────────────────────────────────────────────────
// SCPN Beam Core — Constants
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
/// Speed of light in m/ns
pub const C_LIGHT_M_PER_NS: f64 = 0.299_792_458;

/// Momentum change in GeV/c per metre of path per tesla for a unit charge
pub const GEV_PER_TESLA_METRE: f64 = 0.299_792_458;

/// Energy gain in GeV per volt for a unit charge
pub const GEV_PER_VOLT: f64 = 1.0e-9;

/// Proton rest mass in GeV/c²
pub const PROTON_MASS_GEV: f64 = 0.938_272_088_16;

/// Electron rest mass in GeV/c²
pub const ELECTRON_MASS_GEV: f64 = 0.000_510_998_950;

/// Field-map files store spatial coordinates in centimetres
pub const METRES_PER_CM: f64 = 0.01;

/// Poisson Superfish stores magnetic field in gauss
pub const TESLA_PER_GAUSS: f64 = 1.0e-4;

/// Highest multipole order carried in a strength table (k1..k12)
pub const MAX_MULTIPOLE_ORDER: usize = 12;

/// Momentum magnitudes below this are treated as a stopped particle
pub const MIN_MOMENTUM_GEV: f64 = 1.0e-15;

// Default stepper thresholds (all overridable through StepperSettings)

/// Minimum z-component of the local unit momentum for matrix transport
pub const DEFAULT_PARAXIAL_THRESHOLD: f64 = 0.9;

/// Minimum radius of curvature for analytic transport [m]
pub const DEFAULT_MIN_RADIUS_OF_CURVATURE_M: f64 = 0.1;

/// Length of the thin slab carrying a pole-face kick [m]
pub const DEFAULT_THIN_ELEMENT_LENGTH_M: f64 = 1.0e-6;

/// A step counts as the edge kick when |h - thin| <= tolerance * thin
pub const DEFAULT_EDGE_KICK_TOLERANCE: f64 = 0.5;

/// Steps longer than this are field sampling, never an edge kick [m]
pub const DEFAULT_FIELD_SAMPLING_STEP_M: f64 = 0.01;

/// Relative step-length deviation that triggers solenoid step rescaling
pub const DEFAULT_SOLENOID_CHORD_TOLERANCE: f64 = 1.0e-7;

/// Radius around each line current of the yoke model inside which the field is clamped [m]
pub const DEFAULT_OUTER_SPATIAL_LIMIT_M: f64 = 6.0e-3;
