//! `file.gpkg>layer` arguments.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Result};
use swmm_core::table::Table;
use swmm_io::store::VERSION_LAYER;
use swmm_io::{LayerStore, OgrStore};

/// A GeoPackage and optionally one of its layers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerSource {
    pub path: PathBuf,
    pub layer: Option<String>,
}

impl LayerSource {
    pub fn parse(arg: &str) -> Result<Self> {
        let (path, layer) = match arg.split_once('>') {
            Some((path, layer)) => (path.trim(), Some(layer.trim().to_string())),
            None => (arg.trim(), None),
        };
        if path.is_empty() {
            bail!("'{}' does not name a file", arg);
        }
        Ok(Self {
            path: PathBuf::from(path),
            layer: layer.filter(|l| !l.is_empty()),
        })
    }

    fn stem(&self) -> Option<String> {
        self.path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
    }

    /// The named layer; without a name, the layer called like the file, or
    /// the only layer the file has.
    pub fn read(&self) -> Result<Table> {
        let store = OgrStore::open(&self.path)?;
        let name = match &self.layer {
            Some(layer) => layer.clone(),
            None => pick_layer(&store, self.stem().as_deref(), &self.path)?,
        };
        store.read_layer(&name)
    }

    /// Layer name to write to, defaulting to the file stem.
    pub fn output_layer(&self) -> String {
        self.layer
            .clone()
            .or_else(|| self.stem())
            .unwrap_or_else(|| "layer".to_string())
    }
}

fn pick_layer(store: &OgrStore, stem: Option<&str>, path: &Path) -> Result<String> {
    let names: Vec<String> = store
        .layer_names()?
        .into_iter()
        .filter(|n| !n.eq_ignore_ascii_case(VERSION_LAYER))
        .collect();
    if let Some(stem) = stem {
        if let Some(hit) = names.iter().find(|n| n.eq_ignore_ascii_case(stem)) {
            return Ok(hit.clone());
        }
    }
    match names.as_slice() {
        [only] => Ok(only.clone()),
        [] => Err(anyhow!("{} has no layers", path.display())),
        _ => Err(anyhow!(
            "{} has several layers ({}); name one as {}>layer",
            path.display(),
            names.join(", "),
            path.display()
        )),
    }
}

pub fn read_all(args: &[String]) -> Result<Vec<Table>> {
    args.iter()
        .map(|a| LayerSource::parse(a).and_then(|s| s.read()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_optional_layer() {
        let s = LayerSource::parse("data/nwk.gpkg>1d_nwk_pipes").unwrap();
        assert_eq!(s.path, PathBuf::from("data/nwk.gpkg"));
        assert_eq!(s.layer.as_deref(), Some("1d_nwk_pipes"));

        let s = LayerSource::parse("data/2d_bc_hx.gpkg").unwrap();
        assert_eq!(s.layer, None);
        assert_eq!(s.output_layer(), "2d_bc_hx");

        assert!(LayerSource::parse(">layer").is_err());
    }

    #[test]
    fn shapefiles_read_without_layer_name() {
        use swmm_core::geometry::{FeatureGeometry, GeometryKind};
        use swmm_core::table::{Column, Row};

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("1d_nwk_pipes.shp");
        let mut pipes = Table::with_columns("1d_nwk_pipes", vec![Column::text("ID")])
            .with_geometry_kind(GeometryKind::LineString);
        pipes.push_row(
            Row::new(vec!["P1".into()])
                .with_geometry(FeatureGeometry::line(vec![(0.0, 0.0), (5.0, 0.0)])),
        );
        OgrStore::create(&path)
            .unwrap()
            .write_layer("1d_nwk_pipes", &pipes)
            .unwrap();

        let source = LayerSource::parse(path.to_str().unwrap()).unwrap();
        let read = source.read().unwrap();
        assert_eq!(read.len(), 1);
        assert_eq!(read.get_text(0, "ID"), "P1");
    }
}
