//! ESTRY 1D network layers to SWMM.
//!
//! Channels (`1d_nwk` lines) become conduits, weirs, orifices, outlets or
//! pumps depending on their type code. Nodes come from `1d_nwk` points, node
//! layers or are synthesized at unconnected channel ends (see [`topology`]).
//! Pits become inlets, and `1d_bc` points turn nodes into outfalls or add
//! inflows. The result is a set of section layers in the same shape
//! [`crate::reconcile::layers_to_model`] reads.

pub mod classify;
pub mod inlets;
pub mod schema;
pub mod topology;
pub mod xs;

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use geo::{Intersects, LineString};
use serde::{Deserialize, Serialize};
use swmm_core::geometry::{line_length, FeatureGeometry};
use swmm_core::table::{Crs, Table, Value};
use swmm_core::Feedback;
use tracing::{debug, info};

use self::classify::{
    classify, over_top_weir, ChannelKind, ChannelType, ConduitShape, WeirSpec, SLUICE_GATE_COEFF,
};
use self::inlets::{InletBuilder, Pit};
use self::schema::{is_ignored, measured, BC, CROSS_SECTION, NETWORK, NODE};
use self::topology::{End, EndpointState, NodeSet, UniqueNames};
use self::xs::{load_cross_section, HwCurve};
use crate::messages::MessageLog;
use crate::model::SwmmModel;
use crate::reconcile::{layers_to_model, write_layers, GisToSwmmOptions};
use crate::sections::find_section;
use crate::store::OgrStore;

/// Height given to weirs whose source row has none.
pub const DEFAULT_WEIR_HEIGHT: f64 = 10.0;

/// Source layers, already read from disk.
#[derive(Debug, Clone, Default)]
pub struct EstryInputs {
    /// `1d_nwk` layers: lines are channels, points are nodes or pits.
    pub network: Vec<Table>,
    /// Node layers with bed levels.
    pub nodes: Vec<Table>,
    /// `1d_xs` lines pointing at cross-section CSV files.
    pub cross_sections: Vec<Table>,
    /// `1d_bc` points.
    pub bc: Vec<Table>,
    /// Directory that relative cross-section paths are resolved against.
    pub xs_base_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstryConvertOptions {
    /// Distance within which channel ends join a node.
    pub snap_tolerance: f64,
    /// 2D cell size used to turn pit connection cell counts into widths.
    pub reference_cell_size: f64,
    /// Create `<channel>.<1|2>` nodes at channel ends with no node.
    pub auto_create_nodes: bool,
}

impl Default for EstryConvertOptions {
    fn default() -> Self {
        Self {
            snap_tolerance: 0.001,
            reference_cell_size: 1.0,
            auto_create_nodes: true,
        }
    }
}

/// Channel attributes that survive past classification.
#[derive(Debug, Clone)]
struct Channel {
    id: String,
    ty: ChannelType,
    line: LineString<f64>,
    from: usize,
    to: usize,
    us_invert: Option<f64>,
    ds_invert: Option<f64>,
    length: Option<f64>,
    n: Option<f64>,
    form_loss: Option<f64>,
    inlet_type: String,
    width: Option<f64>,
    height: Option<f64>,
    number: i64,
    entry: Option<f64>,
    exit: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
enum Outfall {
    Free,
    Timeseries(String),
}

/// Output tables under construction, keyed by section.
struct Outputs {
    conduits: Table,
    weirs: Table,
    orifices: Table,
    outlets: Table,
    pumps: Table,
    curves: Table,
    inflows: Table,
    link_names: UniqueNames,
}

impl Outputs {
    fn new() -> Result<Self> {
        Ok(Self {
            conduits: find_section("Conduits")?.empty_table(),
            weirs: find_section("Weirs")?.empty_table(),
            orifices: find_section("Orifices")?.empty_table(),
            outlets: find_section("Outlets")?.empty_table(),
            pumps: find_section("Pumps")?.empty_table(),
            curves: find_section("Curves")?.empty_table(),
            inflows: find_section("Inflows")?.empty_table(),
            link_names: UniqueNames::new(),
        })
    }

    fn link_name(&mut self, id: &str, feedback: &mut dyn Feedback) -> String {
        let name = self.link_names.claim(id);
        if name != id {
            feedback.push_warning(&format!(
                "Channel name {} is used more than once; renamed to {}",
                id, name
            ));
        }
        name
    }
}

/// Converts ESTRY layers into SWMM section layers plus a `Messages`
/// layer. The returned tables are named after their GeoPackage layers.
pub fn convert_layers(
    inputs: &EstryInputs,
    options: &EstryConvertOptions,
    feedback: &mut dyn Feedback,
) -> Result<Vec<Table>> {
    let network = apply_all(&NETWORK, &inputs.network)?;
    let node_layers = apply_all(&NODE, &inputs.nodes)?;
    let xs_layers = apply_all(&CROSS_SECTION, &inputs.cross_sections)?;
    let bc_layers = apply_all(&BC, &inputs.bc)?;

    let crs = network
        .iter()
        .chain(&node_layers)
        .find_map(|t| t.crs.clone());
    let mut log = MessageLog::new(crs.clone());

    let has_points = network
        .iter()
        .any(|t| t.rows.iter().any(|r| matches!(r.geometry, Some(FeatureGeometry::Point(_)))));
    if !options.auto_create_nodes && node_layers.is_empty() && !has_points {
        feedback.report_error(
            "No node layers were given and automatic node creation is disabled",
            true,
        )?;
    }

    let mut nodes = NodeSet::new(options.snap_tolerance);
    for layer in &node_layers {
        feedback.check_canceled()?;
        for r in 0..layer.len() {
            if is_ignored(layer, r) {
                continue;
            }
            let id = layer.get_text(r, "ID");
            match layer.rows[r].geometry.as_ref().and_then(FeatureGeometry::anchor) {
                Some(c) => {
                    nodes.add_explicit(&id, c, measured(layer, r, "Bed_Level"), feedback);
                }
                None => feedback.push_warning(&format!(
                    "Node {} in {} has no location",
                    id, layer.name
                )),
            }
        }
    }

    let mut inlet_builder = InletBuilder::new(crs.clone())?;
    let mut pits: Vec<Pit> = Vec::new();
    let mut channels: Vec<Channel> = Vec::new();
    let mut unresolved = Vec::new();

    // points first so that every channel can snap to them
    for layer in &network {
        feedback.check_canceled()?;
        for r in 0..layer.len() {
            if is_ignored(layer, r) {
                continue;
            }
            let Some(FeatureGeometry::Point(p)) = &layer.rows[r].geometry else {
                continue;
            };
            let id = layer.get_text(r, "ID");
            let ty = layer.get_text(r, "Type").trim().to_ascii_uppercase();
            let elev = measured(layer, r, "US_Invert");
            let index = nodes.add_explicit(&id, p.0, elev, feedback);
            if ty.starts_with("NODE") || ty.is_empty() {
                continue;
            }
            pits.push(Pit {
                node: nodes.get(index).name.clone(),
                location: FeatureGeometry::Point(*p),
                pit_type: ty,
                inlet_type: layer.get_text(r, "Inlet_Type"),
                width: measured(layer, r, "Width_or_Dia"),
                height: measured(layer, r, "Height_or_WF"),
                number: layer.get(r, "Number_of").as_i64().unwrap_or(1),
                conn_1d_2d: layer.get_text(r, "Conn_1D_2D"),
                conn_no: measured(layer, r, "Conn_No"),
                elevation: elev,
            });
        }
    }

    for layer in &network {
        feedback.check_canceled()?;
        debug!(layer = %layer.name, rows = layer.len(), "reading channels");
        for r in 0..layer.len() {
            if is_ignored(layer, r) {
                continue;
            }
            let Some(FeatureGeometry::LineString(line)) = &layer.rows[r].geometry else {
                continue;
            };
            let id = layer.get_text(r, "ID");
            let geometry = FeatureGeometry::LineString(line.clone());
            if line.0.len() < 2 {
                log.error(
                    feedback,
                    &format!("Channel {} has fewer than two vertices and was skipped", id),
                    Some(geometry),
                );
                continue;
            }
            let ty = match classify(&layer.get_text(r, "Type")) {
                Ok(ty) => ty,
                Err(e) => {
                    log.error(feedback, &format!("Channel {}: {}; skipped", id, e), Some(geometry));
                    continue;
                }
            };
            let us_invert = measured(layer, r, "US_Invert");
            let ds_invert = measured(layer, r, "DS_Invert");
            let (start, end) = (line.0[0], line.0[line.0.len() - 1]);
            let auto = options.auto_create_nodes;
            let from = nodes.resolve(&id, End::Upstream, start, us_invert, auto);
            let to = nodes.resolve(&id, End::Downstream, end, ds_invert, auto);
            let (Some(from), Some(to)) = (from.node(), to.node()) else {
                let which = if from == EndpointState::Unresolved {
                    "upstream"
                } else {
                    "downstream"
                };
                log.error(
                    feedback,
                    &format!("Channel {} {} end is not connected to a node", id, which),
                    Some(geometry),
                );
                unresolved.push(id);
                continue;
            };
            channels.push(Channel {
                id,
                ty,
                line: line.clone(),
                from,
                to,
                us_invert,
                ds_invert,
                length: measured(layer, r, "Len_or_ANA").filter(|l| *l > 0.0),
                n: measured(layer, r, "n_nF_Cd"),
                form_loss: measured(layer, r, "Form_Loss"),
                inlet_type: layer.get_text(r, "Inlet_Type"),
                width: measured(layer, r, "Width_or_Dia"),
                height: measured(layer, r, "Height_or_WF"),
                number: layer.get(r, "Number_of").as_i64().unwrap_or(1),
                entry: measured(layer, r, "EntryC_or_WSa"),
                exit: measured(layer, r, "ExitC_or_WSb"),
            });
        }
    }
    if !unresolved.is_empty() {
        feedback.report_error(
            &format!("Channels not connected to any node: {}", unresolved.join(", ")),
            true,
        )?;
    }
    nodes.finalize_elevations(feedback);

    for pit in &pits {
        inlet_builder.add_pit(pit, options.reference_cell_size, &mut log, feedback);
    }

    let mut outputs = Outputs::new()?;
    let outfalls = apply_bc(
        &bc_layers,
        &nodes,
        &mut outputs,
        &mut inlet_builder,
        &mut log,
        feedback,
    )?;

    let xs_index = CrossSections::new(&xs_layers, inputs.xs_base_dir.as_deref());
    for channel in &channels {
        feedback.check_canceled()?;
        emit_channel(channel, &nodes, &xs_index, &mut outputs, &mut log, feedback);
    }

    let mut junctions = find_section("Junctions")?.empty_table();
    let mut outfall_table = find_section("Outfalls")?.empty_table();
    for (index, node) in nodes.iter() {
        let point = Some(FeatureGeometry::point(node.coord.x, node.coord.y));
        let elev = Value::Float(nodes.elevation(index));
        match outfalls.get(&index) {
            Some(kind) => {
                let (ty, tseries) = match kind {
                    Outfall::Free => ("FREE", Value::Null),
                    Outfall::Timeseries(ts) => ("TIMESERIES", Value::text(ts)),
                };
                outfall_table.push_named(
                    vec![
                        ("Name", Value::text(&node.name)),
                        ("Elev", elev),
                        ("Type", Value::text(ty)),
                        ("Tseries", tseries),
                        ("Gated", Value::text("NO")),
                    ],
                    point,
                );
            }
            None => {
                junctions.push_named(
                    vec![
                        ("Name", Value::text(&node.name)),
                        ("Elev", elev),
                        ("Ymax", Value::Float(0.0)),
                        ("Y0", Value::Float(0.0)),
                        ("Ysur", Value::Float(0.0)),
                        ("Apond", Value::Float(0.0)),
                    ],
                    point,
                );
            }
        }
    }

    let options_table = default_options()?;

    let (inlet_table, usage) = inlet_builder.into_tables();
    let mut layers = Vec::new();
    for (section, table) in [
        ("Options", options_table),
        ("Junctions", junctions),
        ("Outfalls", outfall_table),
        ("Conduits", outputs.conduits),
        ("Pumps", outputs.pumps),
        ("Orifices", outputs.orifices),
        ("Weirs", outputs.weirs),
        ("Outlets", outputs.outlets),
        ("Inlets", inlet_table),
        ("Inlet_Usage", usage),
        ("Inflows", outputs.inflows),
        ("Curves", outputs.curves),
    ] {
        if table.is_empty() {
            continue;
        }
        layers.push(named_layer(section, table, crs.as_ref())?);
    }
    if !log.is_empty() {
        layers.push(log.into_table());
    }
    info!(
        nodes = nodes.len(),
        channels = channels.len(),
        layers = layers.len(),
        "converted ESTRY network"
    );
    Ok(layers)
}

/// Converts ESTRY layers into a new GeoPackage and, when `inp` is given, a
/// SWMM input file built from it.
pub fn estry_to_swmm(
    inputs: &EstryInputs,
    gpkg: &Path,
    inp: Option<&Path>,
    options: &EstryConvertOptions,
    feedback: &mut dyn Feedback,
) -> Result<SwmmModel> {
    let layers = convert_layers(inputs, options, feedback)?;
    write_converted(&layers, gpkg, inp, options.snap_tolerance, feedback)
}

/// Stores converted layers in a new GeoPackage and reads them back into a
/// validated model, optionally writing the `.inp` file.
pub(crate) fn write_converted(
    layers: &[Table],
    gpkg: &Path,
    inp: Option<&Path>,
    snap_tolerance: f64,
    feedback: &mut dyn Feedback,
) -> Result<SwmmModel> {
    let mut store = OgrStore::create(gpkg)?;
    write_layers(&mut store, layers, feedback)?;

    let reconcile = GisToSwmmOptions {
        check_references: true,
        snap_tolerance,
    };
    let model = layers_to_model(&store, &reconcile, feedback)
        .with_context(|| format!("building SWMM model from {}", gpkg.display()))?;
    if let Some(inp) = inp {
        model.write_inp(inp)?;
        info!(inp = %inp.display(), "wrote SWMM input file");
    }
    Ok(model)
}

/// Default `Options` rows for converted networks.
pub(crate) fn default_options() -> Result<Table> {
    let mut table = find_section("Options")?.empty_table();
    for (option, value) in [
        ("FLOW_UNITS", "CMS"),
        ("FLOW_ROUTING", "DYNAMIC"),
        ("LINK_OFFSETS", "DEPTH"),
    ] {
        table.push_named(
            vec![("Option", Value::text(option)), ("Value", Value::text(value))],
            None,
        );
    }
    Ok(table)
}

pub(crate) fn apply_all(
    schema: &schema::PositionalSchema,
    layers: &[Table],
) -> Result<Vec<Table>> {
    layers
        .iter()
        .map(|l| {
            schema
                .apply(l)
                .with_context(|| format!("reading {} layer {}", schema.name, l.name))
        })
        .collect()
}

pub(crate) fn named_layer(section: &str, mut table: Table, crs: Option<&Crs>) -> Result<Table> {
    let section = find_section(section)?;
    table.name = section.layer_name();
    if table.geometry_kind.is_some() {
        table.crs = crs.cloned();
    }
    Ok(table)
}

/// Applies `1d_bc` points to the nodes they sit on.
fn apply_bc(
    layers: &[Table],
    nodes: &NodeSet,
    outputs: &mut Outputs,
    inlet_builder: &mut InletBuilder,
    log: &mut MessageLog,
    feedback: &mut dyn Feedback,
) -> Result<HashMap<usize, Outfall>> {
    let mut outfalls = HashMap::new();
    for layer in layers {
        feedback.check_canceled()?;
        for r in 0..layer.len() {
            let ty = layer.get_text(r, "Type").trim().to_ascii_uppercase();
            let name = layer.get_text(r, "Name");
            let geometry = layer.rows[r].geometry.clone();
            let Some(at) = geometry.as_ref().and_then(FeatureGeometry::anchor) else {
                feedback.push_warning(&format!("Boundary {} ({}) has no location", name, ty));
                continue;
            };
            let Some(index) = nodes.nearest(at, nodes.tolerance()) else {
                log.warn(
                    feedback,
                    &format!("Boundary {} ({}) is not on a node and was ignored", name, ty),
                    geometry,
                );
                continue;
            };
            let node = &nodes.get(index).name;
            match ty.as_str() {
                "HQ" => {
                    outfalls.insert(index, Outfall::Free);
                }
                "HT" => {
                    outfalls.insert(index, Outfall::Timeseries(name.clone()));
                }
                "QT" => {
                    outputs.inflows.push_named(
                        vec![
                            ("Node", Value::text(node)),
                            ("Constituent", Value::text("FLOW")),
                            ("Time_Series", Value::text(&name)),
                            ("Type", Value::text("FLOW")),
                            ("Mfactor", Value::Float(1.0)),
                            ("Sfactor", Value::Float(1.0)),
                            ("Baseline", Value::Float(0.0)),
                        ],
                        None,
                    );
                    continue;
                }
                other => {
                    log.warn(
                        feedback,
                        &format!("Boundary {} has type {} which is not converted", name, other),
                        geometry,
                    );
                    continue;
                }
            }
            if inlet_builder.remove_node(node) {
                log.warn(
                    feedback,
                    &format!("Node {} is an outfall; its pit inlet was removed", node),
                    geometry,
                );
            }
        }
    }
    Ok(outfalls)
}

/// Cross-section lines with their shape files.
struct CrossSections<'a> {
    layers: &'a [Table],
    base: Option<&'a Path>,
}

impl<'a> CrossSections<'a> {
    fn new(layers: &'a [Table], base: Option<&'a Path>) -> Self {
        Self { layers, base }
    }

    /// Shape curve of the first cross-section line crossing `line`.
    fn for_channel(&self, line: &LineString<f64>) -> Option<Result<HwCurve>> {
        self.layers.iter().find_map(|layer| {
            (0..layer.len()).find_map(|r| {
                let crosses = match &layer.rows[r].geometry {
                    Some(FeatureGeometry::LineString(xs)) => xs.intersects(line),
                    Some(FeatureGeometry::Point(p)) => line.intersects(p),
                    _ => false,
                };
                crosses.then(|| self.load(layer, r))
            })
        })
    }

    fn load(&self, layer: &Table, row: usize) -> Result<HwCurve> {
        let source = PathBuf::from(layer.get_text(row, "Source").trim());
        let path = match self.base {
            Some(base) if source.is_relative() => base.join(&source),
            _ => source,
        };
        load_cross_section(&path, &layer.get_text(row, "Type"))
    }
}

fn emit_channel(
    ch: &Channel,
    nodes: &NodeSet,
    xs: &CrossSections<'_>,
    out: &mut Outputs,
    log: &mut MessageLog,
    feedback: &mut dyn Feedback,
) {
    let from = nodes.get(ch.from);
    let to = nodes.get(ch.to);
    let mut coords = ch.line.0.clone();
    let last = coords.len() - 1;
    coords[0] = from.coord;
    coords[last] = to.coord;
    let geometry = FeatureGeometry::LineString(LineString::new(coords));
    let located = Some(geometry.clone());
    let gated = if ch.ty.unidirectional { "YES" } else { "NO" };
    let in_offset = nodes.offset(ch.from, ch.us_invert);
    let out_offset = nodes.offset(ch.to, ch.ds_invert);
    let barrels = ch.number.max(1);

    if ch.ty.operational {
        log.warn(
            feedback,
            &format!("Channel {} is operational; its control rules must be added manually", ch.id),
            located.clone(),
        );
    }

    match ch.ty.kind {
        ChannelKind::Conduit(shape) => {
            let name = out.link_name(&ch.id, feedback);
            let mut pairs = conduit_pairs(
                ch,
                &name,
                (&from.name, &to.name),
                (in_offset, out_offset),
                &geometry,
            );
            pairs.push(("xsec_Shape", Value::text(shape.swmm_name())));
            match shape {
                ConduitShape::Circular => {
                    pairs.push(("xsec_Geom1", ch.width.into()));
                    pairs.push(("xsec_Barrels", Value::Int(barrels)));
                }
                ConduitShape::Rectangular => {
                    pairs.push(("xsec_Geom1", ch.height.into()));
                    pairs.push(("xsec_Geom2", ch.width.into()));
                    pairs.push(("xsec_Barrels", Value::Int(barrels)));
                }
                ConduitShape::Irregular => {
                    pairs.push(("xsec_Tsect", Value::text(&name)));
                    log.warn(
                        feedback,
                        &format!(
                            "Conduit {} is irregular; transect {} must be added manually",
                            name, name
                        ),
                        located.clone(),
                    );
                }
            }
            out.conduits.push_named(pairs, located.clone());
        }
        ChannelKind::Bridge => {
            let curve = match xs.for_channel(&ch.line) {
                Some(Ok(curve)) => curve,
                Some(Err(e)) => {
                    log.error(feedback, &format!("Bridge {}: {:#}; skipped", ch.id, e), located);
                    return;
                }
                None => {
                    log.error(
                        feedback,
                        &format!(
                            "Bridge {} is not crossed by a cross-section line; skipped",
                            ch.id
                        ),
                        located,
                    );
                    return;
                }
            };
            let name = out.link_name(&ch.id, feedback);
            let shape = format!("{}_shape", name);
            for (i, (h, w)) in curve.rows.iter().enumerate() {
                let ty = if i == 0 { Value::text("SHAPE") } else { Value::Null };
                out.curves.push_named(
                    vec![
                        ("Name", Value::text(&shape)),
                        ("Type", ty),
                        ("X", Value::Float(*h)),
                        ("Y", Value::Float(*w)),
                    ],
                    None,
                );
            }
            let mut pairs = conduit_pairs(
                ch,
                &name,
                (&from.name, &to.name),
                (in_offset, out_offset),
                &geometry,
            );
            pairs.push(("xsec_Shape", Value::text("CUSTOM")));
            pairs.push(("xsec_Geom1", Value::Float(curve.full_height())));
            pairs.push(("xsec_Curve", Value::text(&shape)));
            pairs.push(("xsec_Barrels", Value::Int(barrels)));
            out.conduits.push_named(pairs, located.clone());
        }
        ChannelKind::Weir(spec) => {
            let name = out.link_name(&ch.id, feedback);
            let crest = nodes.offset(ch.from, ch.us_invert);
            let coeff = spec.coeff * ch.n.filter(|n| *n > 0.0).unwrap_or(1.0);
            let height = ch.height.filter(|h| *h > 0.0).unwrap_or(DEFAULT_WEIR_HEIGHT);
            out.weirs.push_named(
                WeirRow {
                    name: &name,
                    from: &from.name,
                    to: &to.name,
                    spec,
                    crest,
                    coeff,
                    gated,
                    height,
                    width: ch.width,
                }
                .pairs(),
                located.clone(),
            );
        }
        ChannelKind::Orifice => {
            let name = out.link_name(&ch.id, feedback);
            let coeff = ch.n.filter(|n| *n > 0.0).unwrap_or(SLUICE_GATE_COEFF);
            out.orifices.push_named(
                vec![
                    ("Name", Value::text(&name)),
                    ("From Node", Value::text(&from.name)),
                    ("To Node", Value::text(&to.name)),
                    ("Type", Value::text("SIDE")),
                    ("Offset", Value::Float(in_offset)),
                    ("Qcoeff", Value::Float(coeff)),
                    ("Gated", Value::text(gated)),
                    ("CloseTime", Value::Float(0.0)),
                    ("xsec_Shape", Value::text("RECT_CLOSED")),
                    ("xsec_Geom1", ch.height.into()),
                    ("xsec_Geom2", ch.width.into()),
                ],
                located.clone(),
            );
        }
        ChannelKind::Outlet => {
            let name = out.link_name(&ch.id, feedback);
            let curve = curve_name(&ch.inlet_type, &name);
            out.outlets.push_named(
                vec![
                    ("Name", Value::text(&name)),
                    ("From Node", Value::text(&from.name)),
                    ("To Node", Value::text(&to.name)),
                    ("Offset", Value::Float(in_offset)),
                    ("Type", Value::text("TABULAR/HEAD")),
                    ("Qcurve", Value::text(&curve)),
                    ("Gated", Value::text(gated)),
                ],
                located.clone(),
            );
            log.warn(
                feedback,
                &format!(
                    "Outlet {} uses rating curve {} which must be added to [CURVES]",
                    name, curve
                ),
                located.clone(),
            );
        }
        ChannelKind::Pump => {
            let name = out.link_name(&ch.id, feedback);
            let curve = curve_name(&ch.inlet_type, &name);
            out.pumps.push_named(
                vec![
                    ("Name", Value::text(&name)),
                    ("From Node", Value::text(&from.name)),
                    ("To Node", Value::text(&to.name)),
                    ("Pcurve", Value::text(&curve)),
                    ("Status", Value::text("ON")),
                    ("Startup", Value::Float(0.0)),
                    ("Shutoff", Value::Float(0.0)),
                ],
                located.clone(),
            );
            log.warn(
                feedback,
                &format!("Pump {} uses curve {} which must be added to [CURVES]", name, curve),
                located.clone(),
            );
        }
    }

    if ch.ty.weir_over_top {
        let name = out.link_name(&format!("{}_weir", ch.id), feedback);
        let obvert = ch.us_invert.map(|inv| inv + ch.height.unwrap_or(0.0));
        let crest = nodes.offset(ch.from, obvert);
        let spec = over_top_weir();
        let width = ch.width.map(|w| w * barrels as f64);
        out.weirs.push_named(
            WeirRow {
                name: &name,
                from: &from.name,
                to: &to.name,
                spec,
                crest,
                coeff: spec.coeff,
                gated,
                height: DEFAULT_WEIR_HEIGHT,
                width,
            }
            .pairs(),
            located,
        );
    }
}

fn conduit_pairs(
    ch: &Channel,
    name: &str,
    (from, to): (&str, &str),
    (in_offset, out_offset): (f64, f64),
    geometry: &FeatureGeometry,
) -> Vec<(&'static str, Value)> {
    let length = ch
        .length
        .or_else(|| geometry.as_line().map(line_length))
        .unwrap_or(0.0);
    vec![
        ("Name", Value::text(name)),
        ("From Node", Value::text(from)),
        ("To Node", Value::text(to)),
        ("Length", Value::Float(length)),
        ("Roughness", ch.n.into()),
        ("InOffset", Value::Float(in_offset)),
        ("OutOffset", Value::Float(out_offset)),
        ("InitFlow", Value::Float(0.0)),
        ("MaxFlow", Value::Float(0.0)),
        ("losses_Kentry", Value::Float(ch.entry.unwrap_or(0.0))),
        ("losses_Kexit", Value::Float(ch.exit.unwrap_or(0.0))),
        ("losses_Kavg", Value::Float(ch.form_loss.unwrap_or(0.0))),
        ("losses_Flap", Value::text(if ch.ty.unidirectional { "YES" } else { "NO" })),
    ]
}

struct WeirRow<'a> {
    name: &'a str,
    from: &'a str,
    to: &'a str,
    spec: &'static WeirSpec,
    crest: f64,
    coeff: f64,
    gated: &'a str,
    height: f64,
    width: Option<f64>,
}

impl WeirRow<'_> {
    fn pairs(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("Name", Value::text(self.name)),
            ("From Node", Value::text(self.from)),
            ("To Node", Value::text(self.to)),
            ("Type", Value::text(self.spec.swmm_type)),
            ("CrestHt", Value::Float(self.crest)),
            ("Qcoeff", Value::Float(self.coeff)),
            ("Gated", Value::text(self.gated)),
            ("EndCon", Value::Int(0)),
            ("EndCoeff", Value::Float(0.0)),
            ("xsec_Shape", Value::text(self.spec.xsection)),
            ("xsec_Geom1", Value::Float(self.height)),
            ("xsec_Geom2", self.width.into()),
        ]
    }
}

/// Curve name from a file reference, falling back to the link name.
fn curve_name(inlet_type: &str, link: &str) -> String {
    let trimmed = inlet_type.trim();
    if trimmed.is_empty() {
        return format!("{}_curve", link);
    }
    Path::new(trimmed)
        .file_stem()
        .and_then(|s| s.to_str())
        .map(str::to_string)
        .unwrap_or_else(|| trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use swmm_core::table::Column;
    use swmm_core::CapturingFeedback;

    use super::*;
    use crate::messages::MESSAGES_LAYER;

    fn network_layer() -> Table {
        let columns = NETWORK.fields.iter().map(|f| f.column()).collect();
        Table::with_columns("1d_nwk_pipes_L", columns)
    }

    fn pipe(
        t: &mut Table,
        id: &str,
        ty: &str,
        coords: Vec<(f64, f64)>,
        us: f64,
        ds: f64,
        dia: f64,
    ) {
        t.push_named(
            vec![
                ("ID", id.into()),
                ("Type", ty.into()),
                ("Len_or_ANA", schema::SENTINEL.into()),
                ("n_nF_Cd", 0.013.into()),
                ("US_Invert", us.into()),
                ("DS_Invert", ds.into()),
                ("Width_or_Dia", dia.into()),
                ("Height_or_WF", 0.6.into()),
                ("Number_of", 1i64.into()),
            ],
            Some(FeatureGeometry::line(coords)),
        );
    }

    fn layer<'a>(layers: &'a [Table], name: &str) -> &'a Table {
        layers
            .iter()
            .find(|l| l.name == name)
            .unwrap_or_else(|| panic!("no layer {}", name))
    }

    #[test]
    fn pipes_without_nodes_get_automatic_junctions() {
        let mut t = network_layer();
        pipe(&mut t, "P1", "C", vec![(0.0, 0.0), (10.0, 0.0)], 10.0, 9.5, 0.375);
        pipe(&mut t, "P2", "C", vec![(10.0, 0.0), (20.0, 0.0)], 9.3, 9.0, 0.375);
        let inputs = EstryInputs { network: vec![t], ..Default::default() };
        let mut fb = CapturingFeedback::new();
        let layers = convert_layers(&inputs, &EstryConvertOptions::default(), &mut fb).unwrap();

        let junctions = layer(&layers, "Nodes--Junctions");
        assert_eq!(junctions.keys(), vec!["P1.1", "P1.2", "P2.2"]);
        assert_eq!(junctions.get_f64(1, "Elev"), Some(9.3));

        let conduits = layer(&layers, "Links--Conduits");
        assert_eq!(conduits.get_text(1, "From Node"), "P1.2");
        assert!((conduits.get_f64(0, "OutOffset").unwrap() - 0.2).abs() < 1e-9);
        assert_eq!(conduits.get_f64(1, "InOffset"), Some(0.0));
        assert_eq!(conduits.get_f64(0, "Length"), Some(10.0));
        assert_eq!(conduits.get_text(0, "xsec_Shape"), "CIRCULAR");
        assert_eq!(conduits.get_f64(0, "xsec_Geom1"), Some(0.375));
    }

    #[test]
    fn weirs_and_unknown_types() {
        let mut t = network_layer();
        pipe(&mut t, "W1", "WVU", vec![(0.0, 0.0), (5.0, 0.0)], 2.0, 2.0, 1.5);
        pipe(&mut t, "X1", "WX", vec![(5.0, 0.0), (9.0, 0.0)], 1.0, 1.0, 1.0);
        pipe(&mut t, "C1", "RW", vec![(5.0, 0.0), (9.0, 0.0)], 1.0, 0.9, 2.0);
        let inputs = EstryInputs { network: vec![t], ..Default::default() };
        let mut fb = CapturingFeedback::new();
        let layers = convert_layers(&inputs, &EstryConvertOptions::default(), &mut fb).unwrap();

        let weirs = layer(&layers, "Links--Weirs");
        assert_eq!(weirs.keys(), vec!["W1", "C1_weir"]);
        assert_eq!(weirs.get_text(0, "Type"), "V-NOTCH");
        assert_eq!(weirs.get_text(0, "Gated"), "YES");
        assert!((weirs.get_f64(0, "Qcoeff").unwrap() - 1.38 * 0.013).abs() < 1e-9);
        assert_eq!(weirs.get_f64(0, "xsec_Geom1"), Some(0.6));
        assert!((weirs.get_f64(1, "CrestHt").unwrap() - 0.6).abs() < 1e-9);

        assert!(fb.mentions("Channel X1: weir type 'WX' has no SWMM equivalent"));
        let messages = layer(&layers, MESSAGES_LAYER);
        assert!(messages.rows.iter().all(|r| r.geometry.is_some()));
    }

    #[test]
    fn pits_and_boundaries() {
        let mut pits = network_layer().with_geometry_kind(swmm_core::geometry::GeometryKind::Point);
        pits.name = "1d_nwk_pits_P".into();
        pits.push_named(
            vec![
                ("ID", "Pit1".into()),
                ("Type", "R".into()),
                ("US_Invert", schema::SENTINEL.into()),
                ("Conn_No", 2.0.into()),
                ("Width_or_Dia", 1.0.into()),
                ("Height_or_WF", 0.1.into()),
            ],
            Some(FeatureGeometry::point(0.0, 0.0)),
        );
        pits.push_named(
            vec![("ID", "Out".into()), ("Type", "Q".into()), ("Inlet_Type", "q.csv".into())],
            Some(FeatureGeometry::point(10.0, 0.0)),
        );
        let mut pipes = network_layer();
        pipe(&mut pipes, "P1", "C", vec![(0.0, 0.0), (10.0, 0.0)], 5.0, 4.0, 0.3);

        let mut bc = Table::with_columns(
            "1d_bc_P",
            vec![Column::text("a"), Column::text("b"), Column::text("c"), Column::text("d")],
        );
        bc.push_named(
            vec![("a", "HT".into()), ("c", "Tide".into())],
            Some(FeatureGeometry::point(10.0, 0.0)),
        );
        bc.push_named(
            vec![("a", "QT".into()), ("c", "Q100".into())],
            Some(FeatureGeometry::point(0.0, 0.0)),
        );

        let inputs = EstryInputs {
            network: vec![pits, pipes],
            bc: vec![bc],
            ..Default::default()
        };
        let options = EstryConvertOptions {
            reference_cell_size: 5.0,
            ..Default::default()
        };
        let mut fb = CapturingFeedback::new();
        let layers = convert_layers(&inputs, &options, &mut fb).unwrap();

        let junctions = layer(&layers, "Nodes--Junctions");
        assert_eq!(junctions.keys(), vec!["Pit1"]);
        assert_eq!(junctions.get_f64(0, "Elev"), Some(5.0));
        let outfalls = layer(&layers, "Nodes--Outfalls");
        assert_eq!(outfalls.get_text(0, "Type"), "TIMESERIES");
        assert_eq!(outfalls.get_text(0, "Tseries"), "Tide");
        let usage = layer(&layers, "Inlets--Inlet_Usage");
        assert_eq!(usage.len(), 1);
        assert_eq!(usage.get_f64(0, "Conn_width"), Some(10.0));
        let inflows = layer(&layers, "BC--Inflows");
        assert_eq!(inflows.key(0), "Pit1");
        assert!(fb.mentions("Node Out is an outfall"));
    }

    #[test]
    fn disabled_auto_nodes_without_node_layers_is_fatal() {
        let mut t = network_layer();
        pipe(&mut t, "P1", "C", vec![(0.0, 0.0), (10.0, 0.0)], 1.0, 0.5, 0.3);
        let inputs = EstryInputs { network: vec![t], ..Default::default() };
        let options = EstryConvertOptions {
            auto_create_nodes: false,
            ..Default::default()
        };
        let mut fb = CapturingFeedback::new();
        assert!(convert_layers(&inputs, &options, &mut fb).is_err());
        assert_eq!(fb.errors().len(), 1);
    }

    #[test]
    fn short_layers_name_the_source() {
        let t = Table::with_columns("bad_pipes", vec![Column::text("ID")]);
        let inputs = EstryInputs { network: vec![t], ..Default::default() };
        let mut fb = CapturingFeedback::new();
        let err = convert_layers(&inputs, &EstryConvertOptions::default(), &mut fb).unwrap_err();
        assert!(format!("{:#}", err).contains("Layer bad_pipes has 1 columns"));
    }
}
