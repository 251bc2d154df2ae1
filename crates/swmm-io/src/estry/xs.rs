//! Cross-section tables and height/width shape curves.

use std::path::Path;

use anyhow::{Context, Result};
use swmm_core::{SwmmError, SwmmResult};

/// Height/width pairs normalised by the full section height.
#[derive(Debug, Clone, PartialEq)]
pub struct HwCurve {
    pub minval: f64,
    pub maxval: f64,
    /// `(h, w)` rows, one per distinct elevation, lowest first.
    pub rows: Vec<(f64, f64)>,
}

impl HwCurve {
    pub fn full_height(&self) -> f64 {
        self.maxval - self.minval
    }
}

const LEVEL_EPS: f64 = 1e-9;

/// Builds a shape curve from a station/elevation profile. For every
/// distinct elevation the wetted top width is measured and both values are
/// divided by the section height.
pub fn hw_curve_from_xz(x: &[f64], z: &[f64]) -> SwmmResult<HwCurve> {
    if x.len() != z.len() {
        return Err(SwmmError::Geometry(format!(
            "cross-section has {} stations but {} elevations",
            x.len(),
            z.len()
        )));
    }
    if x.len() < 2 {
        return Err(SwmmError::Geometry(
            "cross-section needs at least two points".into(),
        ));
    }
    let minval = z.iter().copied().fold(f64::INFINITY, f64::min);
    let maxval = z.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let height = maxval - minval;
    if height <= LEVEL_EPS {
        return Err(SwmmError::Geometry("cross-section is flat".into()));
    }

    let mut levels: Vec<f64> = z.to_vec();
    levels.sort_by(f64::total_cmp);
    levels.dedup_by(|a, b| (*a - *b).abs() <= LEVEL_EPS);

    let rows = levels
        .iter()
        .map(|&level| {
            let width: f64 = x
                .windows(2)
                .zip(z.windows(2))
                .map(|(xs, zs)| wet_width(xs[0], zs[0], xs[1], zs[1], level))
                .sum();
            ((level - minval) / height, width / height)
        })
        .collect();
    Ok(HwCurve { minval, maxval, rows })
}

/// Horizontal extent of a segment lying at or below `level`.
fn wet_width(x1: f64, z1: f64, x2: f64, z2: f64, level: f64) -> f64 {
    let dx = (x2 - x1).abs();
    match (z1 <= level, z2 <= level) {
        (true, true) => dx,
        (false, false) => 0.0,
        (true, false) => dx * (level - z1) / (z2 - z1),
        (false, true) => dx * (level - z2) / (z1 - z2),
    }
}

/// Normalises raw height/width pairs, measuring heights from the lowest.
pub fn hw_curve_from_hw(h: &[f64], w: &[f64]) -> SwmmResult<HwCurve> {
    if h.len() != w.len() || h.is_empty() {
        return Err(SwmmError::Geometry(
            "height/width table needs matching, non-empty columns".into(),
        ));
    }
    let minval = h.iter().copied().fold(f64::INFINITY, f64::min);
    let maxval = h.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let height = maxval - minval;
    if height <= LEVEL_EPS {
        return Err(SwmmError::Geometry("height/width table has no height".into()));
    }
    let mut rows: Vec<(f64, f64)> = h
        .iter()
        .zip(w)
        .map(|(h, w)| ((h - minval) / height, w / height))
        .collect();
    rows.sort_by(|a, b| a.0.total_cmp(&b.0));
    Ok(HwCurve { minval, maxval, rows })
}

/// Reads the named columns of a CSV file as numbers. Headings match
/// case-insensitively; rows that are entirely empty are skipped.
pub fn read_curve_csv(path: &Path, headings: &[&str]) -> Result<Vec<Vec<f64>>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("opening curve file {}", path.display()))?;
    let header = reader.headers()?.clone();

    let mut indices = Vec::with_capacity(headings.len());
    let mut missing = Vec::new();
    for heading in headings {
        match header.iter().position(|h| h.eq_ignore_ascii_case(heading)) {
            Some(i) => indices.push(i),
            None => missing.push(heading.to_string()),
        }
    }
    if !missing.is_empty() {
        return Err(SwmmError::MissingHeadings {
            headings: missing,
            file: path.display().to_string(),
        }
        .into());
    }

    let mut columns = vec![Vec::new(); headings.len()];
    for (n, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("reading {}", path.display()))?;
        if record.iter().all(str::is_empty) {
            continue;
        }
        for (col, &i) in indices.iter().enumerate() {
            let cell = record.get(i).unwrap_or("");
            let value: f64 = cell.parse().map_err(|_| {
                SwmmError::Parse(format!(
                    "{} row {}: '{}' in column {} is not a number",
                    path.display(),
                    n + 2,
                    cell,
                    headings[col]
                ))
            })?;
            columns[col].push(value);
        }
    }
    Ok(columns)
}

/// Loads a cross-section CSV of the given ESTRY type (`XZ` or `HW`).
pub fn load_cross_section(path: &Path, kind: &str) -> Result<HwCurve> {
    let curve = match kind.trim().to_ascii_uppercase().as_str() {
        "XZ" => {
            let cols = read_curve_csv(path, &["X", "Z"])?;
            hw_curve_from_xz(&cols[0], &cols[1])?
        }
        "HW" => {
            let cols = read_curve_csv(path, &["H", "W"])?;
            hw_curve_from_hw(&cols[0], &cols[1])?
        }
        other => {
            return Err(SwmmError::Parse(format!(
                "cross-section type '{}' in {} is not supported",
                other,
                path.display()
            ))
            .into())
        }
    };
    Ok(curve)
}
