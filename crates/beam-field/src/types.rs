// ─────────────────────────────────────────────────────────────────────
// SCPN Beam Core — Field Types
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Field-family tags as written in configuration.

use beam_types::error::{BeamError, BeamResult};
use std::fmt;
use std::str::FromStr;

/// Which force terms a field contributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldClass {
    Magnetic,
    Electric,
    ElectroMagnetic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldType {
    None,
    Zero,
    Dipole,
    Quadrupole,
    Sextupole,
    Octupole,
    Decapole,
    Multipole,
    Solenoid,
    MuonSpoiler,
    RfSinusoid,
    SkewQuadrupole,
    SkewSextupole,
    SkewOctupole,
    SkewDecapole,
    MultipoleOuterDipole,
    MultipoleOuterQuadrupole,
    MultipoleOuterSextupole,
    MultipoleOuterOctupole,
    MultipoleOuterDecapole,
    SkewMultipoleOuterQuadrupole,
    SkewMultipoleOuterSextupole,
    SkewMultipoleOuterOctupole,
    SkewMultipoleOuterDecapole,
    /// Magnetic map of 1 to 4 dimensions
    MagneticMap(usize),
    ElectricMap(usize),
    ElectroMagneticMap(usize),
}

const NAMED: [(&str, FieldType); 24] = [
    ("none", FieldType::None),
    ("zero", FieldType::Zero),
    ("dipole", FieldType::Dipole),
    ("quadrupole", FieldType::Quadrupole),
    ("sextupole", FieldType::Sextupole),
    ("octupole", FieldType::Octupole),
    ("decapole", FieldType::Decapole),
    ("multipole", FieldType::Multipole),
    ("solenoid", FieldType::Solenoid),
    ("muonspoiler", FieldType::MuonSpoiler),
    ("rfsinusoid", FieldType::RfSinusoid),
    ("skewquadrupole", FieldType::SkewQuadrupole),
    ("skewsextupole", FieldType::SkewSextupole),
    ("skewoctupole", FieldType::SkewOctupole),
    ("skewdecapole", FieldType::SkewDecapole),
    ("multipoleouterdipole", FieldType::MultipoleOuterDipole),
    ("multipoleouterquadrupole", FieldType::MultipoleOuterQuadrupole),
    ("multipoleoutersextupole", FieldType::MultipoleOuterSextupole),
    ("multipoleouteroctupole", FieldType::MultipoleOuterOctupole),
    ("multipoleouterdecapole", FieldType::MultipoleOuterDecapole),
    ("skewmultipoleouterquadrupole", FieldType::SkewMultipoleOuterQuadrupole),
    ("skewmultipoleoutersextupole", FieldType::SkewMultipoleOuterSextupole),
    ("skewmultipoleouteroctupole", FieldType::SkewMultipoleOuterOctupole),
    ("skewmultipoleouterdecapole", FieldType::SkewMultipoleOuterDecapole),
];

impl FieldType {
    pub fn class(&self) -> FieldClass {
        match self {
            FieldType::RfSinusoid | FieldType::ElectricMap(_) => FieldClass::Electric,
            FieldType::ElectroMagneticMap(_) => FieldClass::ElectroMagnetic,
            _ => FieldClass::Magnetic,
        }
    }

    /// Dimensionality of a map-backed type.
    pub fn map_dimensions(&self) -> Option<usize> {
        match self {
            FieldType::MagneticMap(d) | FieldType::ElectricMap(d) | FieldType::ElectroMagneticMap(d) => {
                Some(*d)
            }
            _ => None,
        }
    }

    pub fn is_map(&self) -> bool {
        self.map_dimensions().is_some()
    }

    /// Multipole order of a yoke (outer) field type, 1 = dipole.
    pub fn outer_order(&self) -> Option<usize> {
        match self {
            FieldType::MultipoleOuterDipole => Some(1),
            FieldType::MultipoleOuterQuadrupole | FieldType::SkewMultipoleOuterQuadrupole => Some(2),
            FieldType::MultipoleOuterSextupole | FieldType::SkewMultipoleOuterSextupole => Some(3),
            FieldType::MultipoleOuterOctupole | FieldType::SkewMultipoleOuterOctupole => Some(4),
            FieldType::MultipoleOuterDecapole | FieldType::SkewMultipoleOuterDecapole => Some(5),
            _ => None,
        }
    }

    pub fn is_skew(&self) -> bool {
        matches!(
            self,
            FieldType::SkewQuadrupole
                | FieldType::SkewSextupole
                | FieldType::SkewOctupole
                | FieldType::SkewDecapole
                | FieldType::SkewMultipoleOuterQuadrupole
                | FieldType::SkewMultipoleOuterSextupole
                | FieldType::SkewMultipoleOuterOctupole
                | FieldType::SkewMultipoleOuterDecapole
        )
    }
}

impl FromStr for FieldType {
    type Err = BeamError;

    fn from_str(s: &str) -> BeamResult<Self> {
        let key = s.trim().to_ascii_lowercase();
        if let Some((_, t)) = NAMED.iter().find(|(name, _)| *name == key) {
            return Ok(*t);
        }
        let maps: [(&str, fn(usize) -> FieldType); 3] = [
            ("ebmap", FieldType::ElectroMagneticMap),
            ("bmap", FieldType::MagneticMap),
            ("emap", FieldType::ElectricMap),
        ];
        for (prefix, make) in maps {
            if let Some(rest) = key.strip_prefix(prefix) {
                if let Some(d) = rest.strip_suffix('d').and_then(|n| n.parse::<usize>().ok()) {
                    if (1..=4).contains(&d) {
                        return Ok(make(d));
                    }
                }
            }
        }
        Err(BeamError::UnknownFieldType(s.to_string()))
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::MagneticMap(d) => write!(f, "bmap{d}d"),
            FieldType::ElectricMap(d) => write!(f, "emap{d}d"),
            FieldType::ElectroMagneticMap(d) => write!(f, "ebmap{d}d"),
            other => {
                let name = NAMED
                    .iter()
                    .find(|(_, t)| t == other)
                    .map(|(name, _)| *name)
                    .unwrap_or("unknown");
                f.write_str(name)
            }
        }
    }
}
