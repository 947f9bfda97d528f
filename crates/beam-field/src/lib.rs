// ─────────────────────────────────────────────────────────────────────
// SCPN Beam Core — Beam Field
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Electromagnetic field models and field-map handling.

pub mod array;
pub mod cache;
pub mod composite;
pub mod interpolated;
pub mod interpolator;
pub mod loader;
pub mod model;
pub mod multipole;
pub mod outer;
pub mod types;
