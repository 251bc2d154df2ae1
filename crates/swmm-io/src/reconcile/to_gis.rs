use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use geo::{Coord, LineString, Polygon};
use swmm_core::geometry::FeatureGeometry;
use swmm_core::table::{Crs, Table};
use swmm_core::Feedback;
use tracing::{debug, info};

use super::{merges_into, SwmmToGpkgOptions, MERGES};
use crate::model::SwmmModel;
use crate::sections::{all_sections, layer_name_for, tag_object_type, GeometryAssoc, TRANSECT_COORDS};
use crate::store::{LayerStore, OgrStore};

/// Converts an `.inp` file into a fresh GeoPackage.
pub fn swmm_to_gpkg(
    inp: &Path,
    gpkg: &Path,
    options: &SwmmToGpkgOptions,
    feedback: &mut dyn Feedback,
) -> Result<SwmmModel> {
    let model = SwmmModel::read_inp(inp, feedback)?;
    let crs = options.crs.map(Crs::epsg);
    let layers = model_to_layers(&model, crs.as_ref(), feedback)?;

    let mut store = OgrStore::create(gpkg)?;
    write_layers(&mut store, &layers, feedback)?;

    if options.export_timeseries_csv {
        let written = export_timeseries_csv(&model, &timeseries_dir(gpkg))?;
        if !written.is_empty() {
            feedback.push_info(&format!("Wrote {} time series CSV file(s)", written.len()));
        }
    }
    info!(
        inp = %inp.display(),
        gpkg = %gpkg.display(),
        layers = layers.len(),
        "converted SWMM input to GeoPackage"
    );
    Ok(model)
}

pub fn write_layers(
    store: &mut dyn LayerStore,
    layers: &[Table],
    feedback: &mut dyn Feedback,
) -> Result<()> {
    for layer in layers {
        feedback.check_canceled()?;
        store
            .write_layer(&layer.name, layer)
            .with_context(|| format!("writing layer {}", layer.name))?;
    }
    Ok(())
}

/// One GIS layer per section with geometry, merged sections and tags
/// attached.
pub fn model_to_layers(
    model: &SwmmModel,
    crs: Option<&Crs>,
    feedback: &mut dyn Feedback,
) -> Result<Vec<Table>> {
    let locations = Locations::from_model(model, feedback);
    let tags = model.table("Tags");
    let mut used_tags: HashSet<usize> = HashSet::new();
    let mut layers = Vec::new();

    for section in all_sections() {
        if section.folded || section.gis_only {
            continue;
        }
        let Some(table) = model.table(section.name) else {
            continue;
        };
        feedback.check_canceled()?;

        let mut layer = table.clone();
        layer.name = section.layer_name();
        for merge in merges_into(section.name) {
            if let Some(folded) = model.table(merge.section) {
                merge_prefixed(&mut layer, folded, merge.prefix);
            }
        }
        if let (Some(object_type), Some(tags)) = (tag_object_type(section), tags) {
            used_tags.extend(attach_tags(&mut layer, tags, object_type));
        }
        if let Some(assoc) = section.geometry {
            layer.geometry_kind = Some(assoc.kind());
            layer.crs = crs.cloned();
            locations.attach(&mut layer, assoc, feedback);
        }
        debug!(layer = %layer.name, rows = layer.len(), "built layer");
        layers.push(layer);

        if section.name == "Transects" {
            if let Some(coords) = model.table(TRANSECT_COORDS) {
                let mut coords = coords.clone();
                coords.name = layer_name_for(section.prefix, TRANSECT_COORDS);
                layers.push(coords);
            }
        }
    }

    report_orphans(model, feedback);
    if let Some(tags) = tags {
        for row in (0..tags.len()).filter(|r| !used_tags.contains(r)) {
            feedback.push_warning(&format!(
                "Tag for {} {} does not match any record and was dropped",
                tags.get_text(row, "Object_Type"),
                tags.get_text(row, "Name")
            ));
        }
    }
    Ok(layers)
}

/// Appends every non-key column of `folded` as `<prefix><column>`.
fn merge_prefixed(layer: &mut Table, folded: &Table, prefix: &str) {
    let names: Vec<String> = folded
        .columns
        .iter()
        .skip(1)
        .map(|c| format!("{}{}", prefix, c.name))
        .collect();
    for (col, name) in folded.columns.iter().skip(1).zip(&names) {
        layer.add_column(name, col.kind);
    }
    for (r, row) in folded.rows.iter().enumerate() {
        let Some(target) = layer.find_row(&folded.key(r)) else {
            continue;
        };
        for (value, name) in row.values.iter().skip(1).zip(&names) {
            layer.set(target, name, value.clone());
        }
    }
}

fn report_orphans(model: &SwmmModel, feedback: &mut dyn Feedback) {
    for merge in MERGES {
        let Some(folded) = model.table(merge.section) else {
            continue;
        };
        let owners: HashSet<String> = merge
            .into
            .iter()
            .filter_map(|s| model.table(s))
            .flat_map(Table::keys)
            .collect();
        for key in folded.keys() {
            if !owners.contains(&key) {
                feedback.push_warning(&format!(
                    "{} record {} has no matching {} record and was dropped",
                    merge.section,
                    key,
                    merge.into.join("/")
                ));
            }
        }
    }
}

/// Sets the `Tag` column from matching `[TAGS]` rows; returns the rows used.
fn attach_tags(layer: &mut Table, tags: &Table, object_type: &str) -> Vec<usize> {
    let mut used = Vec::new();
    for row in 0..tags.len() {
        if !tags.get_text(row, "Object_Type").eq_ignore_ascii_case(object_type) {
            continue;
        }
        if let Some(target) = layer.find_row(&tags.get_text(row, "Name")) {
            layer.set(target, crate::sections::TAG, tags.get(row, "Tag").clone());
            used.push(row);
        }
    }
    used
}

/// Point data from the geometry sections, keyed by object name.
struct Locations {
    nodes: HashMap<String, Coord<f64>>,
    vertices: HashMap<String, Vec<Coord<f64>>>,
    polygons: HashMap<String, Vec<Coord<f64>>>,
    symbols: HashMap<String, Coord<f64>>,
}

impl Locations {
    fn from_model(model: &SwmmModel, feedback: &mut dyn Feedback) -> Self {
        let mut nodes = HashMap::new();
        for (name, c) in points(model.table("Coordinates")) {
            if nodes.contains_key(&name) {
                feedback.push_warning(&format!(
                    "Node {} has more than one coordinate; the first is used",
                    name
                ));
                continue;
            }
            nodes.insert(name, c);
        }
        let mut symbols = HashMap::new();
        for (name, c) in points(model.table("Symbols")) {
            symbols.entry(name).or_insert(c);
        }
        Self {
            nodes,
            vertices: chains(model.table("Vertices")),
            polygons: chains(model.table("Polygons")),
            symbols,
        }
    }

    fn attach(&self, layer: &mut Table, assoc: GeometryAssoc, feedback: &mut dyn Feedback) {
        for r in 0..layer.len() {
            let key = layer.key(r);
            let geometry = match assoc {
                GeometryAssoc::Nodes => self.point(&self.nodes, &key, "Node", feedback),
                GeometryAssoc::Misc => self.point(&self.symbols, &key, "Rain gage", feedback),
                GeometryAssoc::Links => {
                    let from = layer.get_text(r, "From Node");
                    let to = layer.get_text(r, "To Node");
                    self.link(&key, &from, &to, feedback)
                }
                GeometryAssoc::Subcatchments => self.polygon(&key, feedback),
                GeometryAssoc::Inlets => None,
            };
            layer.rows[r].geometry = geometry;
        }
    }

    fn point(
        &self,
        source: &HashMap<String, Coord<f64>>,
        key: &str,
        what: &str,
        feedback: &mut dyn Feedback,
    ) -> Option<FeatureGeometry> {
        match source.get(key) {
            Some(c) => Some(FeatureGeometry::point(c.x, c.y)),
            None => {
                feedback.push_warning(&format!("{} {} has no coordinates", what, key));
                None
            }
        }
    }

    fn link(&self, key: &str, from: &str, to: &str, feedback: &mut dyn Feedback) -> Option<FeatureGeometry> {
        let (Some(start), Some(end)) = (self.nodes.get(from), self.nodes.get(to)) else {
            let missing = if self.nodes.contains_key(from) { to } else { from };
            feedback.push_error(&format!(
                "Link {} could not be located: node {} has no coordinates",
                key, missing
            ));
            return None;
        };
        let mut chain = vec![*start];
        if let Some(v) = self.vertices.get(key) {
            chain.extend(v.iter().copied());
        }
        chain.push(*end);
        Some(FeatureGeometry::LineString(LineString::from(chain)))
    }

    fn polygon(&self, key: &str, feedback: &mut dyn Feedback) -> Option<FeatureGeometry> {
        match self.polygons.get(key) {
            Some(ring) if ring.len() >= 3 => Some(FeatureGeometry::Polygon(Polygon::new(
                LineString::from(ring.clone()),
                vec![],
            ))),
            Some(_) => {
                feedback.push_warning(&format!(
                    "Subcatchment {} polygon has fewer than three points",
                    key
                ));
                None
            }
            None => {
                feedback.push_warning(&format!("Subcatchment {} has no polygon", key));
                None
            }
        }
    }
}

fn points(table: Option<&Table>) -> Vec<(String, Coord<f64>)> {
    let Some(table) = table else {
        return Vec::new();
    };
    (0..table.len())
        .filter_map(|r| {
            let x = table.get_f64(r, "X")?;
            let y = table.get_f64(r, "Y")?;
            Some((table.key(r), Coord { x, y }))
        })
        .collect()
}

fn chains(table: Option<&Table>) -> HashMap<String, Vec<Coord<f64>>> {
    let mut out: HashMap<String, Vec<Coord<f64>>> = HashMap::new();
    for (name, c) in points(table) {
        out.entry(name).or_default().push(c);
    }
    out
}

/// `<gpkg stem>_ts` beside the GeoPackage.
pub fn timeseries_dir(gpkg: &Path) -> PathBuf {
    let stem = gpkg
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "model".to_string());
    gpkg.with_file_name(format!("{}_ts", stem))
}

/// Writes one `Date,Time,Value` CSV per inline time series. Series that
/// point at an external file are skipped.
pub fn export_timeseries_csv(model: &SwmmModel, dir: &Path) -> Result<Vec<PathBuf>> {
    let Some(table) = model.table("Timeseries") else {
        return Ok(Vec::new());
    };
    let mut order: Vec<String> = Vec::new();
    let mut series: HashMap<String, Vec<usize>> = HashMap::new();
    for r in 0..table.len() {
        if !table.get(r, "File").is_blank() {
            continue;
        }
        let name = table.key(r);
        if !series.contains_key(&name) {
            order.push(name.clone());
        }
        series.entry(name).or_default().push(r);
    }
    if order.is_empty() {
        return Ok(Vec::new());
    }

    fs::create_dir_all(dir).with_context(|| format!("creating directory {}", dir.display()))?;
    let mut written = Vec::with_capacity(order.len());
    for name in order {
        let path = dir.join(format!("{}.csv", file_safe(&name)));
        let mut writer = csv::Writer::from_path(&path)
            .with_context(|| format!("creating time series file {}", path.display()))?;
        writer.write_record(["Date", "Time", "Value"])?;
        for &r in &series[&name] {
            writer.write_record([
                table.get_text(r, "Date"),
                table.get_text(r, "Time"),
                table.get_text(r, "Value"),
            ])?;
        }
        writer
            .flush()
            .with_context(|| format!("writing time series file {}", path.display()))?;
        written.push(path);
    }
    Ok(written)
}

fn file_safe(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' { c } else { '_' })
        .collect()
}

#[cfg(test)]
mod tests {
    use swmm_core::table::Value;
    use swmm_core::CapturingFeedback;

    use super::*;

    const NETWORK: &str = "\
[SUBCATCHMENTS]
S1 RG1 J1 1.5 25 100 0.5 0

[SUBAREAS]
S1 0.01 0.1 0.05 0.05 25 OUTLET

[JUNCTIONS]
J1 10 2
J2 9 2

[CONDUITS]
C1 J1 J2 50 0.013

[XSECTIONS]
C1 CIRCULAR 0.6 0 0 0 1
C9 CIRCULAR 0.6 0 0 0 1

[TAGS]
Node J1 pit
Link C1 trunk

[COORDINATES]
J1 0 0
J2 10 0

[VERTICES]
C1 5 1

[POLYGONS]
S1 0 0
S1 1 0
S1 1 1
";

    fn layers(fb: &mut CapturingFeedback) -> Vec<Table> {
        let model = SwmmModel::from_inp_str(NETWORK, fb).unwrap();
        model_to_layers(&model, Some(&Crs::epsg(28355)), fb).unwrap()
    }

    fn layer<'a>(layers: &'a [Table], name: &str) -> &'a Table {
        layers.iter().find(|l| l.name == name).unwrap()
    }

    #[test]
    fn geometry_and_merges_are_attached() {
        let mut fb = CapturingFeedback::new();
        let layers = layers(&mut fb);
        let names: Vec<&str> = layers.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, vec!["Hydrology--Subcatchments", "Nodes--Junctions", "Links--Conduits"]);

        let conduits = layer(&layers, "Links--Conduits");
        assert_eq!(
            conduits.rows[0].geometry,
            Some(FeatureGeometry::line(vec![(0.0, 0.0), (5.0, 1.0), (10.0, 0.0)]))
        );
        assert_eq!(conduits.get_text(0, "xsec_Shape"), "CIRCULAR");
        assert_eq!(conduits.get(0, "xsec_Geom1"), &Value::Float(0.6));
        assert_eq!(conduits.get_text(0, "Tag"), "trunk");
        assert_eq!(conduits.crs.as_ref().map(|c| c.srs_id), Some(28355));

        let subs = layer(&layers, "Hydrology--Subcatchments");
        assert_eq!(subs.get(0, "subareas_N-Imperv"), &Value::Float(0.01));
        let poly = subs.rows[0].geometry.as_ref().unwrap().as_polygon().unwrap();
        assert_eq!(poly.exterior().0.len(), 4);
    }

    #[test]
    fn orphans_and_missing_locations_are_warned() {
        let mut fb = CapturingFeedback::new();
        layers(&mut fb);
        assert!(fb.mentions("XSections record C9"));

        let mut fb = CapturingFeedback::new();
        let model = SwmmModel::from_inp_str(
            "[JUNCTIONS]\nJ1 1\nJ2 1\n[CONDUITS]\nC1 J1 J2 5 0.01\n[COORDINATES]\nJ1 0 0\n",
            &mut fb,
        )
        .unwrap();
        let layers = model_to_layers(&model, None, &mut fb).unwrap();
        assert_eq!(layer(&layers, "Links--Conduits").rows[0].geometry, None);
        assert!(fb.mentions("Link C1 could not be located: node J2"));
        assert!(fb.mentions("Node J2 has no coordinates"));
    }

    #[test]
    fn timeseries_csv_per_series() {
        let mut fb = CapturingFeedback::new();
        let model = SwmmModel::from_inp_str(
            "[TIMESERIES]\nTS1 0:00 1.0\nTS1 1:00 2.5\nTS2 FILE \"rain.dat\"\nTS3 01/01/2020 0:00 4\n",
            &mut fb,
        )
        .unwrap();
        let dir = tempfile::tempdir().unwrap();
        let written = export_timeseries_csv(&model, dir.path()).unwrap();
        assert_eq!(written.len(), 2);
        let text = fs::read_to_string(dir.path().join("TS1.csv")).unwrap();
        assert_eq!(text, "Date,Time,Value\n,0:00,1\n,1:00,2.5\n");
        let text = fs::read_to_string(dir.path().join("TS3.csv")).unwrap();
        assert!(text.contains("01/01/2020,0:00,4"));
    }

    #[test]
    fn timeseries_dir_sits_beside_the_geopackage() {
        assert_eq!(
            timeseries_dir(Path::new("out/model.gpkg")),
            PathBuf::from("out/model_ts")
        );
    }
}
