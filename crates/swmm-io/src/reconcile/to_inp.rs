use std::collections::{HashMap, HashSet};
use std::path::Path;

use anyhow::{Context, Result};
use geo::Coord;
use swmm_core::geometry::{distance, FeatureGeometry};
use swmm_core::table::{Table, Value};
use swmm_core::Feedback;
use tracing::{debug, info};

use super::{merges_into, strip_prefix_ci, GisToSwmmOptions};
use crate::messages::MESSAGES_LAYER;
use crate::model::SwmmModel;
use crate::sections::{
    find_section, layer_name_for, section_for_layer, tag_object_type, Encoding, GeometryAssoc,
    Section, TAG, TRANSECT_COORDS,
};
use crate::store::{LayerStore, OgrStore, VERSION_LAYER};

/// Reads every section layer of a GeoPackage and writes the `.inp` file.
pub fn gis_to_swmm(
    gpkg: &Path,
    inp: &Path,
    options: &GisToSwmmOptions,
    feedback: &mut dyn Feedback,
) -> Result<SwmmModel> {
    let store = OgrStore::open(gpkg)?;
    let model = layers_to_model(&store, options, feedback)
        .with_context(|| format!("converting layers of {}", gpkg.display()))?;
    model.write_inp(inp)?;
    info!(gpkg = %gpkg.display(), inp = %inp.display(), "wrote SWMM input file");
    Ok(model)
}

/// Rebuilds section tables from GIS layers: geometry goes back into the
/// geometry sections, merged columns into their own sections and `Tag`
/// columns into `[TAGS]`. The node/link network is validated before the
/// model is returned.
pub fn layers_to_model(
    store: &dyn LayerStore,
    options: &GisToSwmmOptions,
    feedback: &mut dyn Feedback,
) -> Result<SwmmModel> {
    let transects = find_section("Transects")?;
    let coords_layer = layer_name_for(transects.prefix, TRANSECT_COORDS);
    let mut model = SwmmModel::new();
    let mut geometry = GeometryTables::default();

    for name in store.layer_names()? {
        feedback.check_canceled()?;
        if name.eq_ignore_ascii_case(VERSION_LAYER) || name.eq_ignore_ascii_case(MESSAGES_LAYER) {
            continue;
        }
        if name.eq_ignore_ascii_case(&coords_layer) {
            let mut table = store.read_layer(&name)?;
            table.name = TRANSECT_COORDS.to_string();
            strip_geometry(&mut table);
            model.insert(table);
            continue;
        }
        let Some(section) = section_for_layer(&name) else {
            feedback.push_warning(&format!(
                "Layer {} does not match a SWMM section and was ignored",
                name
            ));
            continue;
        };
        if section.gis_only {
            feedback.push_info(&format!(
                "Layer {} is only used in GIS and is not written to the input file",
                name
            ));
            continue;
        }
        if matches!(section.encoding, Encoding::Geometry(_)) {
            feedback.push_warning(&format!(
                "Layer {} was ignored; [{}] is rebuilt from feature geometry",
                name,
                section.header()
            ));
            continue;
        }
        let layer = store
            .read_layer(&name)
            .with_context(|| format!("reading layer {}", name))?;
        debug!(layer = %name, rows = layer.len(), "converting layer");
        add_layer(&mut model, section, &layer, &mut geometry, feedback)?;
    }

    if !geometry.missing_polygons.is_empty() {
        feedback.report_error(
            &format!(
                "Subcatchments without polygon geometry: {}",
                geometry.missing_polygons.join(", ")
            ),
            true,
        )?;
    }
    let ends = std::mem::take(&mut geometry.link_ends);
    for table in geometry.into_tables() {
        model.insert(table);
    }
    validate(&model, &ends, options, feedback)?;
    Ok(model)
}

fn add_layer(
    model: &mut SwmmModel,
    section: &'static Section,
    layer: &Table,
    geometry: &mut GeometryTables,
    feedback: &mut dyn Feedback,
) -> Result<()> {
    let mut table = section.empty_table();
    table.append(layer);

    for merge in merges_into(section.name) {
        split_prefixed(model, &mut table, merge.section, merge.prefix)?;
    }
    if table.has_column(TAG) {
        if let Some(object_type) = tag_object_type(section) {
            let tags = model.table_or_default("Tags")?;
            for r in 0..table.len() {
                let tag = table.get(r, TAG);
                if !tag.is_blank() {
                    tags.push_named(
                        vec![
                            ("Object_Type", Value::text(object_type)),
                            ("Name", Value::text(table.key(r))),
                            ("Tag", tag.clone()),
                        ],
                        None,
                    );
                }
            }
        }
        table.drop_column(TAG);
    }
    if let Some(assoc) = section.geometry {
        geometry.collect(&table, assoc, feedback);
    }
    strip_geometry(&mut table);
    table.geometry_kind = section.geometry.map(|g| g.kind());

    match model.table_mut(section.name) {
        Some(existing) => existing.append(&table),
        None => model.insert(table),
    }
    Ok(())
}

/// Moves `<prefix><column>` columns into rows of `target`. Rows whose
/// prefixed cells are all blank produce no record.
fn split_prefixed(model: &mut SwmmModel, table: &mut Table, target: &str, prefix: &str) -> Result<()> {
    let columns: Vec<(usize, String, String)> = table
        .columns
        .iter()
        .enumerate()
        .filter_map(|(i, c)| {
            strip_prefix_ci(&c.name, prefix).map(|rest| (i, c.name.clone(), rest.to_string()))
        })
        .collect();
    if columns.is_empty() {
        return Ok(());
    }
    let key_name = find_section(target)?.key_field().name;
    let out = model.table_or_default(target)?;
    for (r, row) in table.rows.iter().enumerate() {
        if columns.iter().all(|(i, _, _)| row.values[*i].is_blank()) {
            continue;
        }
        let mut pairs = vec![(key_name, Value::text(table.key(r)))];
        pairs.extend(
            columns
                .iter()
                .map(|(i, _, name)| (name.as_str(), row.values[*i].clone())),
        );
        out.push_named(pairs, None);
    }
    for (_, full, _) in &columns {
        table.drop_column(full);
    }
    Ok(())
}

fn strip_geometry(table: &mut Table) {
    table.crs = None;
    table.geometry_kind = None;
    for row in &mut table.rows {
        row.geometry = None;
    }
}

struct LinkEnds {
    name: String,
    from: String,
    to: String,
    start: Coord<f64>,
    end: Coord<f64>,
}

/// Geometry sections rebuilt from feature geometry.
#[derive(Default)]
struct GeometryTables {
    coordinates: Vec<(String, Coord<f64>)>,
    seen_nodes: HashSet<String>,
    vertices: Vec<(String, Coord<f64>)>,
    polygons: Vec<(String, Coord<f64>)>,
    symbols: Vec<(String, Coord<f64>)>,
    missing_polygons: Vec<String>,
    link_ends: Vec<LinkEnds>,
}

impl GeometryTables {
    fn collect(&mut self, table: &Table, assoc: GeometryAssoc, feedback: &mut dyn Feedback) {
        for (r, row) in table.rows.iter().enumerate() {
            let key = table.key(r);
            match (assoc, &row.geometry) {
                (GeometryAssoc::Nodes, Some(FeatureGeometry::Point(p))) => {
                    if self.seen_nodes.insert(key.clone()) {
                        self.coordinates.push((key, p.0));
                    }
                }
                (GeometryAssoc::Misc, Some(FeatureGeometry::Point(p))) => {
                    self.symbols.push((key, p.0));
                }
                (GeometryAssoc::Links, Some(FeatureGeometry::LineString(line))) if line.0.len() >= 2 => {
                    let coords = &line.0;
                    for c in &coords[1..coords.len() - 1] {
                        self.vertices.push((key.clone(), *c));
                    }
                    self.link_ends.push(LinkEnds {
                        name: key,
                        from: table.get_text(r, "From Node"),
                        to: table.get_text(r, "To Node"),
                        start: coords[0],
                        end: coords[coords.len() - 1],
                    });
                }
                (GeometryAssoc::Subcatchments, Some(FeatureGeometry::Polygon(poly))) => {
                    let ring = &poly.exterior().0;
                    let open = match (ring.first(), ring.last()) {
                        (Some(a), Some(b)) if ring.len() > 1 && a == b => &ring[..ring.len() - 1],
                        _ => &ring[..],
                    };
                    for c in open {
                        self.polygons.push((key.clone(), *c));
                    }
                }
                (GeometryAssoc::Subcatchments, _) => self.missing_polygons.push(key),
                (GeometryAssoc::Inlets, _) => {}
                (_, None) => feedback.push_warning(&format!(
                    "{} {} has no geometry and will not be drawn",
                    table.name, key
                )),
                (_, Some(g)) => feedback.push_warning(&format!(
                    "{} {} has unexpected {} geometry",
                    table.name,
                    key,
                    g.kind().gpkg_name()
                )),
            }
        }
    }

    fn into_tables(self) -> Vec<Table> {
        let mut out = Vec::new();
        for (name, points) in [
            ("Coordinates", self.coordinates),
            ("Vertices", self.vertices),
            ("Polygons", self.polygons),
            ("Symbols", self.symbols),
        ] {
            if points.is_empty() {
                continue;
            }
            let Ok(section) = find_section(name) else {
                continue;
            };
            let mut table = section.empty_table();
            for (key, c) in points {
                table.push_values(vec![Value::text(key), Value::Float(c.x), Value::Float(c.y)]);
            }
            out.push(table);
        }
        out
    }
}

fn validate(
    model: &SwmmModel,
    ends: &[LinkEnds],
    options: &GisToSwmmOptions,
    feedback: &mut dyn Feedback,
) -> Result<()> {
    let network = model.network();
    let fatal = network.validate_into(!options.check_references, feedback);
    if fatal > 0 {
        feedback.report_error(
            &format!("{} topology error(s) prevent writing the input file", fatal),
            true,
        )?;
    }

    let nodes: HashMap<String, Coord<f64>> = model
        .table("Coordinates")
        .map(|t| {
            t.rows
                .iter()
                .enumerate()
                .filter_map(|(r, _)| Some((t.key(r), Coord { x: t.get_f64(r, "X")?, y: t.get_f64(r, "Y")? })))
                .collect()
        })
        .unwrap_or_default();
    for link in ends {
        for (label, node, point) in [("starts", &link.from, link.start), ("ends", &link.to, link.end)] {
            if let Some(c) = nodes.get(node) {
                let gap = distance(*c, point);
                if gap > options.snap_tolerance {
                    feedback.push_warning(&format!(
                        "Link {} {} {:.3} away from node {}",
                        link.name, label, gap, node
                    ));
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use swmm_core::geometry::GeometryKind;
    use swmm_core::table::{Column, Row};
    use swmm_core::{CapturingFeedback, SwmmError};

    use super::*;
    use crate::store::MemoryStore;

    fn junctions() -> Table {
        let mut t = Table::with_columns("Nodes--Junctions", vec![Column::text("Name"), Column::real("Elev")])
            .with_geometry_kind(GeometryKind::Point);
        t.push_row(Row::new(vec!["J1".into(), 10.0.into()]).with_geometry(FeatureGeometry::point(0.0, 0.0)));
        t.push_row(Row::new(vec!["J2".into(), 9.0.into()]).with_geometry(FeatureGeometry::point(10.0, 0.0)));
        t
    }

    fn conduits(to: &str, end_x: f64) -> Table {
        let mut t = Table::with_columns(
            "Links--Conduits",
            vec![
                Column::text("Name"),
                Column::text("From Node"),
                Column::text("To Node"),
                Column::real("Length"),
                Column::real("Roughness"),
                Column::text("xsec_Shape"),
                Column::real("xsec_Geom1"),
                Column::text("Tag"),
            ],
        )
        .with_geometry_kind(GeometryKind::LineString);
        t.push_row(
            Row::new(vec![
                "C1".into(),
                "J1".into(),
                to.into(),
                50.0.into(),
                0.013.into(),
                "CIRCULAR".into(),
                0.6.into(),
                "trunk".into(),
            ])
            .with_geometry(FeatureGeometry::line(vec![(0.0, 0.0), (5.0, 1.0), (end_x, 0.0)])),
        );
        t
    }

    #[test]
    fn layers_split_back_into_sections() {
        let mut fb = CapturingFeedback::new();
        let store = MemoryStore::with_layers([junctions(), conduits("J2", 10.0)]);
        let model = layers_to_model(&store, &GisToSwmmOptions::default(), &mut fb).unwrap();

        let xs = model.table("XSections").unwrap();
        assert_eq!(xs.key(0), "C1");
        assert_eq!(xs.get_text(0, "Shape"), "CIRCULAR");
        let tags = model.table("Tags").unwrap();
        assert_eq!(tags.get_text(0, "Object_Type"), "Link");
        assert!(!model.table("Conduits").unwrap().has_column("xsec_Shape"));
        assert_eq!(model.table("Vertices").unwrap().len(), 1);
        assert_eq!(model.table("Coordinates").unwrap().keys(), vec!["J1", "J2"]);
        assert!(fb.diagnostics.is_empty());

        let text = model.to_inp_string();
        assert!(text.contains("[XSECTIONS]"));
        assert!(text.contains("[VERTICES]"));
    }

    #[test]
    fn dangling_links_are_fatal_unless_disabled() {
        let mut fb = CapturingFeedback::new();
        let store = MemoryStore::with_layers([junctions(), conduits("J9", 10.0)]);
        let err = layers_to_model(&store, &GisToSwmmOptions::default(), &mut fb).unwrap_err();
        assert!(matches!(err.downcast_ref::<SwmmError>(), Some(SwmmError::Fatal(_))));
        assert!(fb.mentions("Conduits C1 references unknown To Node J9"));

        let mut fb = CapturingFeedback::new();
        let options = GisToSwmmOptions {
            check_references: false,
            ..GisToSwmmOptions::default()
        };
        layers_to_model(&store, &options, &mut fb).unwrap();
        assert!(fb.errors().is_empty());
        assert!(fb.mentions("Conduits C1 references unknown To Node J9"));
    }

    #[test]
    fn unconnected_nodes_are_warned() {
        let mut fb = CapturingFeedback::new();
        let mut nodes = junctions();
        nodes.push_row(Row::new(vec!["J3".into(), 8.0.into()]).with_geometry(FeatureGeometry::point(50.0, 50.0)));
        let store = MemoryStore::with_layers([nodes, conduits("J2", 10.0)]);
        layers_to_model(&store, &GisToSwmmOptions::default(), &mut fb).unwrap();
        let topology = fb.in_category("topology");
        assert_eq!(topology.len(), 1);
        assert_eq!(topology[0].message, "Node J3 is not connected to any link");
        assert_eq!(topology[0].entity.as_deref(), Some("J3"));
    }

    #[test]
    fn endpoint_gap_is_warned() {
        let mut fb = CapturingFeedback::new();
        let store = MemoryStore::with_layers([junctions(), conduits("J2", 12.0)]);
        layers_to_model(&store, &GisToSwmmOptions::default(), &mut fb).unwrap();
        assert!(fb.mentions("Link C1 ends 2.000 away from node J2"));
    }

    #[test]
    fn missing_subcatchment_polygons_are_fatal() {
        let mut t = Table::with_columns("Hydrology--Subcatchments", vec![Column::text("Name")])
            .with_geometry_kind(GeometryKind::Polygon);
        t.push_values(vec!["S1".into()]);
        t.push_values(vec!["S2".into()]);
        let store = MemoryStore::with_layers([t]);
        let mut fb = CapturingFeedback::new();
        let err = layers_to_model(&store, &GisToSwmmOptions::default(), &mut fb).unwrap_err();
        assert!(err.to_string().contains("S1, S2"));
    }

    #[test]
    fn unknown_layers_are_warned_and_skipped() {
        let mut fb = CapturingFeedback::new();
        let mut notes = Table::with_columns("Notes", vec![Column::text("Text")]);
        notes.push_values(vec!["hello".into()]);
        let store = MemoryStore::with_layers([notes, Table::new(MESSAGES_LAYER)]);
        let model = layers_to_model(&store, &GisToSwmmOptions::default(), &mut fb).unwrap();
        assert!(model.is_empty());
        assert_eq!(fb.warnings(), vec!["Layer Notes does not match a SWMM section and was ignored"]);
    }
}
