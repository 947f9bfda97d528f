// ─────────────────────────────────────────────────────────────────────
// SCPN Beam Core — Strength Table
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Sparse named magnet strengths.
//!
//! A `StrengthTable` is filled once per element and then shared behind an
//! `Arc` by the field model and the integrator built for that element.
//! Absent keys read as exactly 0.0.

use crate::config::Units;
use crate::error::{BeamError, BeamResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const NORMAL_KEYS: [&str; 12] = [
    "k1", "k2", "k3", "k4", "k5", "k6", "k7", "k8", "k9", "k10", "k11", "k12",
];

const SKEW_KEYS: [&str; 12] = [
    "k1s", "k2s", "k3s", "k4s", "k5s", "k6s", "k7s", "k8s", "k9s", "k10s", "k11s", "k12s",
];

const SCALAR_KEYS: [&str; 18] = [
    "field",
    "angle",
    "length",
    "tilt",
    "ks",
    "hkick",
    "vkick",
    "e1",
    "e2",
    "fint",
    "fintx",
    "hgap",
    "polefaceangle",
    "fringecorr",
    "efield",
    "frequency",
    "phase",
    "scaling",
];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<String, f64>", into = "BTreeMap<String, f64>")]
pub struct StrengthTable {
    values: BTreeMap<&'static str, f64>,
}

impl StrengthTable {
    pub fn new() -> Self {
        StrengthTable::default()
    }

    pub fn from_pairs<I, K>(pairs: I) -> BeamResult<Self>
    where
        I: IntoIterator<Item = (K, f64)>,
        K: AsRef<str>,
    {
        let mut table = StrengthTable::new();
        for (key, value) in pairs {
            table.set(key.as_ref(), value)?;
        }
        Ok(table)
    }

    /// Value stored under `key`, or 0.0 when absent or unrecognised.
    pub fn get(&self, key: &str) -> f64 {
        self.values.get(key).copied().unwrap_or(0.0)
    }

    pub fn set(&mut self, key: &str, value: f64) -> BeamResult<()> {
        let canonical = canonical_key(key).ok_or_else(|| BeamError::InvalidKey(key.to_string()))?;
        self.values.insert(canonical, value);
        Ok(())
    }

    /// Builder form of [`set`](Self::set).
    pub fn with(mut self, key: &str, value: f64) -> BeamResult<Self> {
        self.set(key, value)?;
        Ok(self)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, f64)> + '_ {
        self.values.iter().map(|(k, v)| (*k, *v))
    }

    /// True when every stored value is exactly zero.
    pub fn is_zero(&self) -> bool {
        self.values.values().all(|v| *v == 0.0)
    }

    pub fn normal_keys() -> &'static [&'static str] {
        &NORMAL_KEYS
    }

    pub fn skew_keys() -> &'static [&'static str] {
        &SKEW_KEYS
    }

    pub fn is_valid_key(key: &str) -> bool {
        canonical_key(key).is_some()
    }

    /// Multipole order of `kN` / `kNs`, 1 for every other key.
    pub fn order_of(key: &str) -> i32 {
        NORMAL_KEYS
            .iter()
            .position(|k| *k == key)
            .or_else(|| SKEW_KEYS.iter().position(|k| *k == key))
            .map(|i| i as i32 + 1)
            .unwrap_or(1)
    }

    /// Value converted to host length units: divided by `metre^order`.
    pub fn value_in_units(&self, key: &str, units: &Units) -> f64 {
        self.get(key) / units.metre.powi(Self::order_of(key))
    }
}

fn canonical_key(key: &str) -> Option<&'static str> {
    NORMAL_KEYS
        .iter()
        .chain(SKEW_KEYS.iter())
        .chain(SCALAR_KEYS.iter())
        .find(|k| **k == key)
        .copied()
}

impl TryFrom<BTreeMap<String, f64>> for StrengthTable {
    type Error = BeamError;

    fn try_from(map: BTreeMap<String, f64>) -> BeamResult<Self> {
        StrengthTable::from_pairs(map)
    }
}

impl From<StrengthTable> for BTreeMap<String, f64> {
    fn from(table: StrengthTable) -> Self {
        table
            .values
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect()
    }
}
