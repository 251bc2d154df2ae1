//! Repairs 2D boundary connections that miss their SWMM node.
//!
//! `HX` and `SX` features in a 2d_bc layer connect the 2D domain to a 1D
//! node by location. A vertex that is close to a node but not on it does
//! not connect; it is moved onto the nearest node. Vertices with no node in
//! reach are reported and left alone.

use std::path::Path;

use anyhow::{Context, Result};
use geo::{Coord, Point};
use serde::{Deserialize, Serialize};
use swmm_core::geometry::{FeatureGeometry, SnapIndex};
use swmm_core::table::Table;
use swmm_core::Feedback;
use tracing::{debug, info};

use crate::estry::schema::BC_2D;
use crate::messages::{MessageLog, MESSAGES_LAYER};
use crate::sections::node_sections;
use crate::store::{LayerStore, OgrStore};

/// Vertices closer than this are already connected.
const COINCIDENT: f64 = 1e-6;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BcFixOptions {
    /// Largest distance a vertex is moved to reach a node.
    pub tolerance: f64,
}

impl Default for BcFixOptions {
    fn default() -> Self {
        Self { tolerance: 1.0 }
    }
}

#[derive(Debug, Clone)]
pub struct BcFixReport {
    /// The input layer with corrected geometry.
    pub table: Table,
    pub moved: usize,
    pub unresolved: usize,
    pub messages: Table,
}

/// Connection vertices of a feature: the point, or both ends of a line.
fn connection_vertices(geometry: &FeatureGeometry) -> Vec<usize> {
    match geometry {
        FeatureGeometry::Point(_) => vec![0],
        FeatureGeometry::LineString(l) if l.0.len() > 1 => vec![0, l.0.len() - 1],
        FeatureGeometry::LineString(l) if !l.0.is_empty() => vec![0],
        _ => Vec::new(),
    }
}

fn vertex(geometry: &FeatureGeometry, index: usize) -> Option<Coord<f64>> {
    match geometry {
        FeatureGeometry::Point(p) => Some(p.0),
        FeatureGeometry::LineString(l) => l.0.get(index).copied(),
        FeatureGeometry::Polygon(_) => None,
    }
}

fn move_vertex(geometry: &mut FeatureGeometry, index: usize, to: Coord<f64>) {
    match geometry {
        FeatureGeometry::Point(p) => *p = Point::from(to),
        FeatureGeometry::LineString(l) => {
            if let Some(c) = l.0.get_mut(index) {
                *c = to;
            }
        }
        FeatureGeometry::Polygon(_) => {}
    }
}

/// Snaps `HX`/`SX` connection vertices of `bc` onto the points of the node
/// layers. Other boundary types are copied unchanged.
pub fn fix_invalid_bc_connections(
    bc: &Table,
    nodes: &[Table],
    options: &BcFixOptions,
    feedback: &mut dyn Feedback,
) -> Result<BcFixReport> {
    let typed = BC_2D
        .apply(bc)
        .with_context(|| format!("reading 2D BC layer {}", bc.name))?;

    let mut index = SnapIndex::new(options.tolerance);
    let mut names = Vec::new();
    for layer in nodes {
        for r in 0..layer.len() {
            if let Some(at) = layer.rows[r].geometry.as_ref().and_then(FeatureGeometry::anchor) {
                index.insert(at);
                names.push(layer.key(r));
            }
        }
    }

    let mut table = bc.clone();
    let mut log = MessageLog::new(bc.crs.clone());
    let (mut moved, mut unresolved) = (0, 0);
    for r in 0..typed.len() {
        feedback.check_canceled()?;
        let ty = typed.get_text(r, "Type").trim().to_ascii_uppercase();
        if ty != "HX" && ty != "SX" {
            continue;
        }
        let Some(geometry) = table.rows[r].geometry.as_mut() else {
            continue;
        };
        for v in connection_vertices(geometry) {
            let Some(at) = vertex(geometry, v) else {
                continue;
            };
            match index.nearest_within(at, options.tolerance) {
                Some((_, d)) if d <= COINCIDENT => {}
                Some((hit, d)) => {
                    move_vertex(geometry, v, index.point(hit));
                    moved += 1;
                    debug!(node = %names[hit], distance = d, "moved {} connection", ty);
                }
                None => {
                    unresolved += 1;
                    log.warn(
                        feedback,
                        &format!(
                            "{} connection {} at ({}, {}) is not within {} of a SWMM node",
                            ty,
                            typed.get_text(r, "Name"),
                            at.x,
                            at.y,
                            options.tolerance
                        ),
                        Some(FeatureGeometry::point(at.x, at.y)),
                    );
                }
            }
        }
    }

    if moved > 0 {
        feedback.push_info(&format!("Moved {} 2D BC vertices onto SWMM nodes", moved));
    }
    Ok(BcFixReport {
        table,
        moved,
        unresolved,
        messages: log.into_table(),
    })
}

/// Reads `bc_layer` from `bc_gpkg` and the node layers of `swmm_gpkg`, and
/// writes the corrected layer to `out_gpkg` as `out_layer`.
pub fn fix_bc_layer(
    bc_gpkg: &Path,
    bc_layer: &str,
    swmm_gpkg: &Path,
    out_gpkg: &Path,
    out_layer: &str,
    options: &BcFixOptions,
    feedback: &mut dyn Feedback,
) -> Result<BcFixReport> {
    let bc = OgrStore::open(bc_gpkg)?
        .read_layer(bc_layer)
        .with_context(|| format!("reading {} from {}", bc_layer, bc_gpkg.display()))?;

    let swmm = OgrStore::open(swmm_gpkg)?;
    let mut nodes = Vec::new();
    for section in node_sections() {
        let name = section.layer_name();
        if swmm.has_layer(&name)? {
            nodes.push(swmm.read_layer(&name)?);
        }
    }

    let mut report = fix_invalid_bc_connections(&bc, &nodes, options, feedback)?;
    report.table.name = out_layer.to_string();
    let mut out = OgrStore::open_or_create(out_gpkg)?;
    out.write_layer(out_layer, &report.table)
        .with_context(|| format!("writing {} to {}", out_layer, out_gpkg.display()))?;
    if !report.messages.is_empty() {
        out.write_layer(MESSAGES_LAYER, &report.messages)?;
    }
    info!(
        moved = report.moved,
        unresolved = report.unresolved,
        out = %out_gpkg.display(),
        "fixed 2D BC connections"
    );
    Ok(report)
}
