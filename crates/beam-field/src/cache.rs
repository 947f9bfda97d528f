// ─────────────────────────────────────────────────────────────────────
// SCPN Beam Core — Field Map Cache
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Process-wide store of parsed field maps.
//!
//! A file is parsed once per (path, format, reflections) key; every element
//! that names the same map shares the resulting [`FieldArray`].

use crate::array::{FieldArray, Reflection};
use crate::interpolator::{Interpolator, InterpolatorType};
use crate::loader::{self, FieldFormat};
use beam_types::config::Units;
use beam_types::error::{BeamError, BeamResult};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    path: PathBuf,
    format: FieldFormat,
    reflections: Vec<Reflection>,
}

#[derive(Debug)]
pub struct FieldMapCache {
    units: Units,
    arrays: Mutex<HashMap<CacheKey, Arc<FieldArray>>>,
}

impl FieldMapCache {
    pub fn new(units: Units) -> Self {
        FieldMapCache {
            units,
            arrays: Mutex::new(HashMap::new()),
        }
    }

    pub fn units(&self) -> &Units {
        &self.units
    }

    /// Return the array for `path`, parsing and reflecting it on first use.
    ///
    /// The lock is held while parsing so concurrent callers asking for the
    /// same key never parse it twice.
    pub fn load(
        &self,
        path: &Path,
        format: FieldFormat,
        reflections: &[Reflection],
    ) -> BeamResult<Arc<FieldArray>> {
        if !path.is_file() {
            return Err(BeamError::MissingFile(path.display().to_string()));
        }
        let key = CacheKey {
            path: path.canonicalize()?,
            format,
            reflections: reflections.to_vec(),
        };
        let mut arrays = self.arrays.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(array) = arrays.get(&key) {
            debug!(path = %key.path.display(), %format, "field map cache hit");
            return Ok(Arc::clone(array));
        }
        let parsed = loader::load(&key.path, format, &self.units)?;
        let array = Arc::new(parsed.reflect(reflections)?);
        info!(
            path = %key.path.display(),
            %format,
            reflections = reflections.len(),
            array = %array,
            "loaded field map"
        );
        arrays.insert(key, Arc::clone(&array));
        Ok(array)
    }

    /// Load a map and check it has the axis count the field type expects.
    pub fn load_checked(
        &self,
        path: &Path,
        format: FieldFormat,
        reflections: &[Reflection],
        expected_dimensions: usize,
    ) -> BeamResult<Arc<FieldArray>> {
        if format.dimensions() != expected_dimensions {
            return Err(BeamError::DimensionMismatch {
                name: path.display().to_string(),
                expected: expected_dimensions,
                found: format.dimensions(),
            });
        }
        self.load(path, format, reflections)
    }

    /// Bind an interpolator to a cached array.
    pub fn build_interpolator(
        &self,
        array: Arc<FieldArray>,
        kind: InterpolatorType,
    ) -> BeamResult<Interpolator> {
        Interpolator::new(array, kind)
    }

    pub fn len(&self) -> usize {
        self.arrays.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.arrays.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }
}
