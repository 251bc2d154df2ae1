//! XPSWMM GIS exports to SWMM.
//!
//! XPSWMM writes nodes and links with explicit node names on every link, so
//! links are connected by name first. Only when a referenced node is missing
//! does the link fall back to snapping its line ends to nearby nodes.

use std::path::Path;

use anyhow::Result;
use geo::Coord;
use serde::{Deserialize, Serialize};
use swmm_core::geometry::{line_length, FeatureGeometry};
use swmm_core::table::{Table, Value};
use swmm_core::Feedback;
use tracing::info;

use crate::estry::schema::{measured, XP_LINK, XP_NODE};
use crate::estry::topology::{End, NodeSet, UniqueNames};
use crate::estry::{apply_all, default_options, named_layer, write_converted};
use crate::messages::MessageLog;
use crate::model::SwmmModel;
use crate::sections::find_section;

#[derive(Debug, Clone, Default)]
pub struct XpswmmInputs {
    pub nodes: Vec<Table>,
    pub links: Vec<Table>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct XpswmmOptions {
    /// Distance used when a link has to be connected by location.
    pub snap_tolerance: f64,
    /// Create nodes at link ends that neither name nor touch a node.
    pub auto_create_nodes: bool,
}

impl Default for XpswmmOptions {
    fn default() -> Self {
        Self {
            snap_tolerance: 0.001,
            auto_create_nodes: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum NodeKind {
    Junction,
    Outfall { ty: String, stage: Option<f64> },
    Storage { area: f64 },
}

#[derive(Debug, Clone)]
struct NodeAttrs {
    kind: NodeKind,
    max_depth: Option<f64>,
}

/// Maps an XPSWMM conduit shape to a SWMM one.
fn swmm_shape(shape: &str) -> String {
    match shape.trim().to_ascii_uppercase().as_str() {
        "CIRCULAR" | "CIRCLE" => "CIRCULAR".to_string(),
        "RECT" | "RECTANGULAR" => "RECT_CLOSED".to_string(),
        "" => "CIRCULAR".to_string(),
        other => other.to_string(),
    }
}

/// Converts XPSWMM node and link layers into SWMM section layers.
pub fn convert_xpswmm(
    inputs: &XpswmmInputs,
    options: &XpswmmOptions,
    feedback: &mut dyn Feedback,
) -> Result<Vec<Table>> {
    let node_layers = apply_all(&XP_NODE, &inputs.nodes)?;
    let link_layers = apply_all(&XP_LINK, &inputs.links)?;
    let crs = node_layers
        .iter()
        .chain(&link_layers)
        .find_map(|t| t.crs.clone());
    let mut log = MessageLog::new(crs.clone());

    if node_layers.is_empty() && !options.auto_create_nodes {
        feedback.report_error("No XPSWMM node layer was given", true)?;
    }

    let mut nodes = NodeSet::new(options.snap_tolerance);
    let mut attrs: Vec<Option<NodeAttrs>> = Vec::new();
    for layer in &node_layers {
        feedback.check_canceled()?;
        for r in 0..layer.len() {
            let name = layer.get_text(r, "Name");
            let Some(at) = layer.rows[r].geometry.as_ref().and_then(FeatureGeometry::anchor) else {
                log.warn(feedback, &format!("Node {} has no location and was skipped", name), None);
                continue;
            };
            let invert = measured(layer, r, "Invert");
            let index = nodes.add_explicit(&name, at, invert, feedback);
            let kind = match layer.get_text(r, "Type").trim().to_ascii_uppercase().as_str() {
                "OUTFALL" => NodeKind::Outfall {
                    ty: layer.get_text(r, "Outfall_Type").trim().to_ascii_uppercase(),
                    stage: measured(layer, r, "Outfall_Stage"),
                },
                "STORAGE" => NodeKind::Storage {
                    area: measured(layer, r, "Ponded_Area").unwrap_or(0.0),
                },
                _ => NodeKind::Junction,
            };
            let max_depth = measured(layer, r, "Max_Depth").or_else(|| {
                let ground = measured(layer, r, "X_Ground")?;
                Some((ground - invert?).max(0.0))
            });
            if attrs.len() <= index {
                attrs.resize(index + 1, None);
            }
            attrs[index].get_or_insert(NodeAttrs { kind, max_depth });
        }
    }

    let mut conduits = find_section("Conduits")?.empty_table();
    let mut link_names = UniqueNames::new();
    let mut unresolved = Vec::new();
    for layer in &link_layers {
        feedback.check_canceled()?;
        for r in 0..layer.len() {
            let id = layer.get_text(r, "Name");
            let geometry = layer.rows[r].geometry.clone();
            let ty = layer.get_text(r, "Type").trim().to_ascii_uppercase();
            if !(ty.is_empty() || ty == "CONDUIT") {
                log.error(
                    feedback,
                    &format!("Link {} has type {} which is not converted; skipped", id, ty),
                    geometry,
                );
                continue;
            }
            let line = geometry.as_ref().and_then(FeatureGeometry::as_line);
            let ends: Option<(Coord<f64>, Coord<f64>)> = line
                .filter(|l| l.0.len() >= 2)
                .map(|l| (l.0[0], l.0[l.0.len() - 1]));
            let us_invert = measured(layer, r, "US_Invert");
            let ds_invert = measured(layer, r, "DS_Invert");

            let mut connect = |node_col: &str, end: End, invert: Option<f64>| {
                let named = layer.get_text(r, node_col);
                if let Some(index) = nodes.index_of(named.trim()) {
                    return Some(index);
                }
                let at = ends.map(|(a, b)| if end == End::Upstream { a } else { b })?;
                nodes
                    .resolve(&id, end, at, invert, options.auto_create_nodes)
                    .node()
            };
            let from = connect("US_Node", End::Upstream, us_invert);
            let to = connect("DS_Node", End::Downstream, ds_invert);
            let (Some(from), Some(to)) = (from, to) else {
                log.error(
                    feedback,
                    &format!("Link {} could not be connected to its nodes", id),
                    geometry,
                );
                unresolved.push(id);
                continue;
            };

            let name = link_names.claim(&id);
            if name != id {
                feedback.push_warning(&format!(
                    "Link name {} is used more than once; renamed to {}",
                    id, name
                ));
            }
            let length = measured(layer, r, "Length")
                .filter(|l| *l > 0.0)
                .or_else(|| line.map(line_length))
                .unwrap_or(0.0);
            let shape = swmm_shape(&layer.get_text(r, "Shape"));
            let (geom1, geom2) = match shape.as_str() {
                "CIRCULAR" => (measured(layer, r, "Height"), None),
                _ => (measured(layer, r, "Height"), measured(layer, r, "Width")),
            };
            let barrels = layer.get(r, "Barrels").as_i64().unwrap_or(1).max(1);
            let pairs = vec![
                ("Name", Value::text(&name)),
                ("From Node", Value::text(&nodes.get(from).name)),
                ("To Node", Value::text(&nodes.get(to).name)),
                ("Length", Value::Float(length)),
                ("Roughness", measured(layer, r, "Roughness").into()),
                ("InOffset", Value::Float(nodes.offset(from, us_invert))),
                ("OutOffset", Value::Float(nodes.offset(to, ds_invert))),
                ("InitFlow", Value::Float(0.0)),
                ("MaxFlow", Value::Float(0.0)),
                ("xsec_Shape", Value::text(shape)),
                ("xsec_Geom1", geom1.into()),
                ("xsec_Geom2", geom2.into()),
                ("xsec_Barrels", Value::Int(barrels)),
                ("losses_Kentry", measured(layer, r, "Entry_Loss").unwrap_or(0.0).into()),
                ("losses_Kexit", measured(layer, r, "Exit_Loss").unwrap_or(0.0).into()),
                ("losses_Kavg", Value::Float(0.0)),
                ("losses_Flap", Value::text("NO")),
            ];
            conduits.push_named(pairs, geometry);
        }
    }
    if !unresolved.is_empty() {
        feedback.report_error(
            &format!("Links not connected to any node: {}", unresolved.join(", ")),
            true,
        )?;
    }
    nodes.finalize_elevations(feedback);

    let mut junctions = find_section("Junctions")?.empty_table();
    let mut outfalls = find_section("Outfalls")?.empty_table();
    let mut storage = find_section("Storage")?.empty_table();
    for (index, node) in nodes.iter() {
        let point = Some(FeatureGeometry::point(node.coord.x, node.coord.y));
        let elev = Value::Float(nodes.elevation(index));
        let attr = attrs.get(index).cloned().flatten();
        let max_depth = attr.as_ref().and_then(|a| a.max_depth).unwrap_or(0.0);
        match attr.map(|a| a.kind).unwrap_or(NodeKind::Junction) {
            NodeKind::Junction => {
                junctions.push_named(
                    vec![
                        ("Name", Value::text(&node.name)),
                        ("Elev", elev),
                        ("Ymax", Value::Float(max_depth)),
                        ("Y0", Value::Float(0.0)),
                        ("Ysur", Value::Float(0.0)),
                        ("Apond", Value::Float(0.0)),
                    ],
                    point,
                );
            }
            NodeKind::Outfall { ty, stage } => {
                let (ty, stage) = match (ty.as_str(), stage) {
                    ("FIXED", Some(s)) => ("FIXED", Value::Float(s)),
                    ("FIXED", None) => {
                        log.warn(
                            feedback,
                            &format!("Outfall {} is FIXED without a stage; using FREE", node.name),
                            point.clone(),
                        );
                        ("FREE", Value::Null)
                    }
                    ("NORMAL", _) => ("NORMAL", Value::Null),
                    _ => ("FREE", Value::Null),
                };
                outfalls.push_named(
                    vec![
                        ("Name", Value::text(&node.name)),
                        ("Elev", elev),
                        ("Type", Value::text(ty)),
                        ("Stage", stage),
                        ("Gated", Value::text("NO")),
                    ],
                    point,
                );
            }
            NodeKind::Storage { area } => {
                storage.push_named(
                    vec![
                        ("Name", Value::text(&node.name)),
                        ("Elev", elev),
                        ("Ymax", Value::Float(max_depth)),
                        ("Y0", Value::Float(0.0)),
                        ("Shape", Value::text("FUNCTIONAL")),
                        ("Coeff", Value::Float(0.0)),
                        ("Expon", Value::Float(0.0)),
                        ("Const", Value::Float(area)),
                    ],
                    point,
                );
            }
        }
    }

    let mut layers = Vec::new();
    for (section, table) in [
        ("Options", default_options()?),
        ("Junctions", junctions),
        ("Outfalls", outfalls),
        ("Storage", storage),
        ("Conduits", conduits),
    ] {
        if !table.is_empty() {
            layers.push(named_layer(section, table, crs.as_ref())?);
        }
    }
    if !log.is_empty() {
        layers.push(log.into_table());
    }
    info!(nodes = nodes.len(), layers = layers.len(), "converted XPSWMM network");
    Ok(layers)
}

/// Converts XPSWMM layers into a new GeoPackage and optionally an `.inp`.
pub fn xpswmm_to_swmm(
    inputs: &XpswmmInputs,
    gpkg: &Path,
    inp: Option<&Path>,
    options: &XpswmmOptions,
    feedback: &mut dyn Feedback,
) -> Result<SwmmModel> {
    let layers = convert_xpswmm(inputs, options, feedback)?;
    write_converted(&layers, gpkg, inp, options.snap_tolerance, feedback)
}

#[cfg(test)]
mod tests {
    use swmm_core::CapturingFeedback;

    use super::*;

    fn node_layer() -> Table {
        Table::with_columns("xp_nodes", XP_NODE.fields.iter().map(|f| f.column()).collect())
    }

    fn link_layer() -> Table {
        Table::with_columns("xp_links", XP_LINK.fields.iter().map(|f| f.column()).collect())
    }

    fn node(t: &mut Table, name: &str, x: f64, invert: f64, ty: &str) {
        t.push_named(
            vec![
                ("Name", name.into()),
                ("X_Ground", (invert + 2.0).into()),
                ("Invert", invert.into()),
                ("Type", ty.into()),
                ("Outfall_Type", "FIXED".into()),
                ("Outfall_Stage", 1.5.into()),
            ],
            Some(FeatureGeometry::point(x, 0.0)),
        );
    }

    #[test]
    fn links_connect_by_name_then_location() {
        let mut nodes = node_layer();
        node(&mut nodes, "N1", 0.0, 10.0, "JUNCTION");
        node(&mut nodes, "N2", 50.0, 9.0, "JUNCTION");
        node(&mut nodes, "OUT", 100.0, 8.0, "OUTFALL");
        let mut links = link_layer();
        links.push_named(
            vec![
                ("Name", "L1".into()),
                ("US_Node", "N1".into()),
                ("DS_Node", "N2".into()),
                ("US_Invert", 10.2.into()),
                ("DS_Invert", 9.0.into()),
                ("Shape", "CIRCLE".into()),
                ("Height", 0.6.into()),
            ],
            // drawn away from N1 on purpose: the name wins
            Some(FeatureGeometry::line(vec![(5.0, 5.0), (50.0, 0.0)])),
        );
        links.push_named(
            vec![
                ("Name", "L2".into()),
                ("US_Node", "missing".into()),
                ("DS_Node", "".into()),
                ("Shape", "RECT".into()),
                ("Height", 1.0.into()),
                ("Width", 2.0.into()),
            ],
            Some(FeatureGeometry::line(vec![(50.0, 0.0), (100.0, 0.0)])),
        );
        links.push_named(
            vec![("Name", "P1".into()), ("Type", "PUMP".into())],
            Some(FeatureGeometry::line(vec![(0.0, 0.0), (50.0, 0.0)])),
        );

        let inputs = XpswmmInputs { nodes: vec![nodes], links: vec![links] };
        let mut fb = CapturingFeedback::new();
        let layers = convert_xpswmm(&inputs, &XpswmmOptions::default(), &mut fb).unwrap();
        let conduits = layers.iter().find(|l| l.name == "Links--Conduits").unwrap();
        assert_eq!(conduits.keys(), vec!["L1", "L2"]);
        assert_eq!(conduits.get_text(0, "From Node"), "N1");
        assert!((conduits.get_f64(0, "InOffset").unwrap() - 0.2).abs() < 1e-9);
        assert_eq!(conduits.get_text(0, "xsec_Shape"), "CIRCULAR");
        assert_eq!(conduits.get_text(1, "From Node"), "N2");
        assert_eq!(conduits.get_text(1, "To Node"), "OUT");
        assert_eq!(conduits.get_text(1, "xsec_Shape"), "RECT_CLOSED");
        assert_eq!(conduits.get_f64(1, "Length"), Some(50.0));

        let outfalls = layers.iter().find(|l| l.name == "Nodes--Outfalls").unwrap();
        assert_eq!(outfalls.get_text(0, "Type"), "FIXED");
        assert_eq!(outfalls.get_f64(0, "Stage"), Some(1.5));
        let junctions = layers.iter().find(|l| l.name == "Nodes--Junctions").unwrap();
        assert_eq!(junctions.get_f64(0, "Ymax"), Some(2.0));
        assert!(fb.mentions("Link P1 has type PUMP"));
    }

    #[test]
    fn unconnected_links_are_fatal() {
        let mut nodes = node_layer();
        node(&mut nodes, "N1", 0.0, 10.0, "JUNCTION");
        let mut links = link_layer();
        links.push_named(
            vec![("Name", "L1".into()), ("US_Node", "N1".into()), ("DS_Node", "N9".into())],
            Some(FeatureGeometry::line(vec![(0.0, 0.0), (30.0, 0.0)])),
        );
        let inputs = XpswmmInputs { nodes: vec![nodes], links: vec![links] };
        let mut fb = CapturingFeedback::new();
        assert!(convert_xpswmm(&inputs, &XpswmmOptions::default(), &mut fb).is_err());
        assert!(fb.mentions("Link L1 could not be connected"));
    }

    #[test]
    fn shapes_map_to_swmm_names() {
        assert_eq!(swmm_shape("circle"), "CIRCULAR");
        assert_eq!(swmm_shape("Rect"), "RECT_CLOSED");
        assert_eq!(swmm_shape("EGG"), "EGG");
    }
}
