// ─────────────────────────────────────────────────────────────────────
// SCPN Beam Core — Field Map Loader
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Readers for the supported field-map file formats.
//!
//! First-party ASCII (`bdsim1d` .. `bdsim4d`):
//!
//! ```text
//! # comment
//! nx> 3
//! xmin> -1.0
//! xmax> 1.0
//! nz> 2
//! zmin> 0.0
//! zmax> 10.0
//! loopOrder> xyzt
//! ! X Z Fx Fy Fz
//! -1.0 0.0 0.0 1.2 0.0
//! ...
//! ```
//!
//! Spatial coordinates are in cm, time in ns, field values in T (magnetic)
//! or V/m (electric). `loopOrder` lists the loops from outermost to
//! innermost: `xyzt` (default) means the last present axis varies
//! fastest, `tzyx` means x varies fastest.
//!
//! Poisson Superfish 2D output (`poisson2d`, `poisson2dquad`,
//! `poisson2ddipole`) carries `(Xmin,Ymin)`, `(Xmax,Ymax)` and
//! `X and Y increments` header lines followed by `x y Bx By ...` rows in
//! cm and gauss. Files ending in `.gz` are read through gzip.

use crate::array::{Axis, Dimension, FieldArray, Reflection};
use beam_types::config::Units;
use beam_types::constants::TESLA_PER_GAUSS;
use beam_types::error::{BeamError, BeamResult};
use flate2::read::GzDecoder;
use nalgebra::Vector3;
use ndarray::{ArrayD, IxDyn, ShapeBuilder};
use std::collections::HashMap;
use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, warn};

/// Relative tolerance when checking the first data row against the header.
const COORDINATE_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PoissonSymmetry {
    None,
    Quadrupole,
    Dipole,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldFormat {
    /// First-party ASCII with 1..4 axes
    Bdsim(usize),
    Poisson(PoissonSymmetry),
}

impl FieldFormat {
    pub fn dimensions(&self) -> usize {
        match self {
            FieldFormat::Bdsim(d) => *d,
            FieldFormat::Poisson(_) => 2,
        }
    }
}

impl FromStr for FieldFormat {
    type Err = BeamError;

    fn from_str(s: &str) -> BeamResult<Self> {
        let key = s.trim().to_ascii_lowercase();
        match key.as_str() {
            "bdsim1d" => Ok(FieldFormat::Bdsim(1)),
            "bdsim2d" => Ok(FieldFormat::Bdsim(2)),
            "bdsim3d" => Ok(FieldFormat::Bdsim(3)),
            "bdsim4d" => Ok(FieldFormat::Bdsim(4)),
            "poisson2d" => Ok(FieldFormat::Poisson(PoissonSymmetry::None)),
            "poisson2dquad" => Ok(FieldFormat::Poisson(PoissonSymmetry::Quadrupole)),
            "poisson2ddipole" => Ok(FieldFormat::Poisson(PoissonSymmetry::Dipole)),
            _ => Err(BeamError::UnknownFieldFormat(s.to_string())),
        }
    }
}

impl fmt::Display for FieldFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldFormat::Bdsim(d) => write!(f, "bdsim{d}d"),
            FieldFormat::Poisson(PoissonSymmetry::None) => f.write_str("poisson2d"),
            FieldFormat::Poisson(PoissonSymmetry::Quadrupole) => f.write_str("poisson2dquad"),
            FieldFormat::Poisson(PoissonSymmetry::Dipole) => f.write_str("poisson2ddipole"),
        }
    }
}

/// Split a `"format:path"` file specification.
pub fn parse_file_spec(spec: &str) -> BeamResult<(FieldFormat, PathBuf)> {
    let (format, path) = spec.split_once(':').ok_or_else(|| {
        BeamError::ConfigError(format!(
            "field file \"{spec}\" must be written as \"format:path\""
        ))
    })?;
    let path = path.trim();
    if path.is_empty() {
        return Err(BeamError::ConfigError(format!(
            "field file \"{spec}\" has an empty path"
        )));
    }
    Ok((format.parse()?, PathBuf::from(path)))
}

fn open(path: &Path) -> BeamResult<Box<dyn BufRead>> {
    if !path.is_file() {
        return Err(BeamError::MissingFile(path.display().to_string()));
    }
    let file = File::open(path)?;
    let gz = path
        .extension()
        .map(|e| e.eq_ignore_ascii_case("gz"))
        .unwrap_or(false);
    if gz {
        Ok(Box::new(BufReader::new(GzDecoder::new(file))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

/// Read and parse one field-map file.
pub fn load(path: &Path, format: FieldFormat, units: &Units) -> BeamResult<FieldArray> {
    let reader = open(path)?;
    let label = path.display().to_string();
    let array = match format {
        FieldFormat::Bdsim(d) => parse_bdsim(reader, d, units, &label)?,
        FieldFormat::Poisson(symmetry) => parse_poisson(reader, symmetry, units, &label)?,
    };
    debug!(path = %label, %format, array = %array, "parsed field map");
    Ok(array)
}

fn format_error(label: &str, message: String) -> BeamError {
    BeamError::FieldMapFormat {
        path: label.to_string(),
        message,
    }
}

fn parse_float(label: &str, key: &str, text: &str) -> BeamResult<f64> {
    let val = text.trim().parse::<f64>().map_err(|e| {
        format_error(label, format!("failed to parse '{key}' as float: {e}"))
    })?;
    if !val.is_finite() {
        return Err(format_error(label, format!("'{key}' must be finite, got {val}")));
    }
    Ok(val)
}

fn parse_count(label: &str, key: &str, text: &str) -> BeamResult<usize> {
    let n = text.trim().parse::<usize>().map_err(|e| {
        format_error(label, format!("failed to parse '{key}' as integer: {e}"))
    })?;
    if n == 0 {
        return Err(format_error(label, format!("'{key}' must be at least 1")));
    }
    Ok(n)
}

fn parse_row(label: &str, line_no: usize, line: &str) -> BeamResult<Vec<f64>> {
    line.split_whitespace()
        .map(|tok| {
            tok.parse::<f64>().map_err(|e| {
                format_error(label, format!("line {line_no}: bad number '{tok}': {e}"))
            })
        })
        .collect()
}

/// Loop nesting from outermost to innermost.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoopOrder {
    /// Last axis fastest (row-major)
    Xyzt,
    /// First axis fastest (column-major)
    Tzyx,
}

pub fn parse_bdsim<R: BufRead>(
    reader: R,
    dimensions: usize,
    units: &Units,
    label: &str,
) -> BeamResult<FieldArray> {
    let mut header: HashMap<String, String> = HashMap::new();
    let mut rows: Vec<Vec<f64>> = Vec::new();
    let mut columns_seen = false;

    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if line.starts_with('!') {
            columns_seen = true;
            continue;
        }
        if let Some((key, value)) = line.split_once('>') {
            if columns_seen {
                return Err(format_error(
                    label,
                    format!("line {}: header entry after the column line", i + 1),
                ));
            }
            header.insert(key.trim().to_ascii_lowercase(), value.trim().to_string());
            continue;
        }
        rows.push(parse_row(label, i + 1, line)?);
    }

    let mut axes = Vec::new();
    for dim in Dimension::ALL {
        let n_key = format!("n{}", dim.label());
        let Some(n_text) = header.get(&n_key) else {
            continue;
        };
        let n = parse_count(label, &n_key, n_text)?;
        let bound = |suffix: &str| -> BeamResult<f64> {
            let key = format!("{}{suffix}", dim.label());
            let text = header
                .get(&key)
                .ok_or_else(|| format_error(label, format!("missing header key '{key}'")))?;
            parse_float(label, &key, text)
        };
        let scale = if dim == Dimension::T { 1.0 } else { units.cm() };
        axes.push(Axis::new(dim, bound("min")? * scale, bound("max")? * scale, n));
    }
    if axes.len() != dimensions {
        return Err(BeamError::DimensionMismatch {
            name: label.to_string(),
            expected: dimensions,
            found: axes.len(),
        });
    }

    let order = match header.get("looporder").map(|s| s.to_ascii_lowercase()) {
        None => LoopOrder::Xyzt,
        Some(s) if s == "xyzt" => LoopOrder::Xyzt,
        Some(s) if s == "tzyx" => LoopOrder::Tzyx,
        Some(other) => {
            return Err(format_error(
                label,
                format!("unknown loopOrder '{other}', expected xyzt or tzyx"),
            ))
        }
    };

    let shape: Vec<usize> = axes.iter().map(|a| a.len).collect();
    let expected_rows: usize = shape.iter().product();
    if rows.len() != expected_rows {
        return Err(format_error(
            label,
            format!("expected {expected_rows} data rows, found {}", rows.len()),
        ));
    }
    let n_cols = dimensions + 3;
    let mut values = Vec::with_capacity(expected_rows);
    for (i, row) in rows.iter().enumerate() {
        if row.len() != n_cols {
            return Err(format_error(
                label,
                format!("data row {} has {} columns, expected {n_cols}", i + 1, row.len()),
            ));
        }
        values.push(Vector3::new(row[dimensions], row[dimensions + 1], row[dimensions + 2]));
    }
    check_first_row(label, &axes, &rows[0], units);

    let values = match order {
        LoopOrder::Xyzt => ArrayD::from_shape_vec(IxDyn(&shape), values),
        LoopOrder::Tzyx => ArrayD::from_shape_vec(IxDyn(&shape).f(), values),
    }
    .map_err(|e| format_error(label, format!("cannot shape data: {e}")))?;
    FieldArray::new(axes, values)
}

fn check_first_row(label: &str, axes: &[Axis], row: &[f64], units: &Units) {
    for (axis, raw) in axes.iter().zip(row) {
        let value = if axis.dimension == Dimension::T { *raw } else { *raw * units.cm() };
        let tolerance = COORDINATE_TOLERANCE * axis.min.abs().max(axis.step().abs()).max(1e-12);
        if (value - axis.min).abs() > tolerance {
            warn!(
                path = label,
                axis = axis.dimension.label(),
                header_min = axis.min,
                first = value,
                "first data row does not start at the header minimum"
            );
        }
    }
}

/// Extract `(a, b)` from `"... = (a, b) ..."`.
fn parse_pair(label: &str, key: &str, line: &str) -> BeamResult<(f64, f64)> {
    let rhs = line
        .split_once('=')
        .map(|(_, r)| r)
        .ok_or_else(|| format_error(label, format!("'{key}' line has no '='")))?;
    let open = rhs.find('(');
    let close = rhs.find(')');
    let inner = match (open, close) {
        (Some(o), Some(c)) if c > o => &rhs[o + 1..c],
        _ => return Err(format_error(label, format!("'{key}' line has no (a,b) pair"))),
    };
    let (a, b) = inner
        .split_once(',')
        .ok_or_else(|| format_error(label, format!("'{key}' pair needs two values")))?;
    Ok((parse_float(label, key, a)?, parse_float(label, key, b)?))
}

pub fn parse_poisson<R: BufRead>(
    reader: R,
    symmetry: PoissonSymmetry,
    units: &Units,
    label: &str,
) -> BeamResult<FieldArray> {
    let mut min: Option<(f64, f64)> = None;
    let mut max: Option<(f64, f64)> = None;
    let mut increments: Option<(usize, usize)> = None;
    let mut in_data = false;
    let mut rows: Vec<[f64; 4]> = Vec::new();

    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if trimmed.contains("(Xmin,Ymin)") {
            min = Some(parse_pair(label, "(Xmin,Ymin)", trimmed)?);
        } else if trimmed.contains("(Xmax,Ymax)") {
            max = Some(parse_pair(label, "(Xmax,Ymax)", trimmed)?);
        } else if trimmed.contains("X and Y increments") {
            let rhs = trimmed.split_once(':').map(|(_, r)| r).unwrap_or("");
            let mut it = rhs.split_whitespace();
            let ix = parse_count(label, "X increments", it.next().unwrap_or(""))?;
            let iy = parse_count(label, "Y increments", it.next().unwrap_or(""))?;
            increments = Some((ix, iy));
        } else if trimmed.contains("Bx") && trimmed.contains('X') {
            in_data = true;
        } else if in_data {
            let row = parse_row(label, i + 1, trimmed)?;
            if row.len() < 4 {
                return Err(format_error(
                    label,
                    format!("line {}: expected at least 4 columns", i + 1),
                ));
            }
            rows.push([row[0], row[1], row[2], row[3]]);
        }
    }

    let missing = |what: &str| format_error(label, format!("missing {what} header"));
    let (xmin, ymin) = min.ok_or_else(|| missing("(Xmin,Ymin)"))?;
    let (xmax, ymax) = max.ok_or_else(|| missing("(Xmax,Ymax)"))?;
    let (ix, iy) = increments.ok_or_else(|| missing("X and Y increments"))?;
    let (nx, ny) = (ix + 1, iy + 1);
    if rows.len() != nx * ny {
        return Err(format_error(
            label,
            format!("expected {} data rows for {nx}x{ny} grid, found {}", nx * ny, rows.len()),
        ));
    }

    let cm = units.cm();
    let axes = vec![
        Axis::new(Dimension::X, xmin * cm, xmax * cm, nx),
        Axis::new(Dimension::Y, ymin * cm, ymax * cm, ny),
    ];
    let x_fastest = rows.len() > 1 && rows[1][0] != rows[0][0];
    let values: Vec<Vector3<f64>> = rows
        .iter()
        .map(|r| Vector3::new(r[2], r[3], 0.0) * TESLA_PER_GAUSS)
        .collect();
    let shape = [nx, ny];
    let values = if x_fastest {
        ArrayD::from_shape_vec(IxDyn(&shape).f(), values)
    } else {
        ArrayD::from_shape_vec(IxDyn(&shape), values)
    }
    .map_err(|e| format_error(label, format!("cannot shape data: {e}")))?;
    let array = FieldArray::new(axes, values)?;

    match symmetry {
        PoissonSymmetry::None => Ok(array),
        PoissonSymmetry::Quadrupole => array
            .diagonal_reflect(Dimension::X, Dimension::Y)?
            .reflect(&[Reflection::ReflectXYQuadrupole]),
        PoissonSymmetry::Dipole => array.reflect(&[Reflection::ReflectXYDipole]),
    }
}
