//! Vector layer stores.
//!
//! Conversions read and write GIS layers through the [`LayerStore`] trait.
//! [`OgrStore`] reads any GDAL vector source and writes GeoPackages;
//! [`MemoryStore`] keeps layers in memory for tests and chained pipelines.

mod ogr;

use anyhow::{anyhow, Result};
use swmm_core::table::Table;

pub use ogr::{driver_for, OgrStore, VERSION_COLUMN, VERSION_LAYER};

pub trait LayerStore {
    /// Layer names in creation order.
    fn layer_names(&self) -> Result<Vec<String>>;

    fn read_layer(&self, name: &str) -> Result<Table>;

    /// Writes a layer, replacing any existing layer of the same name.
    fn write_layer(&mut self, name: &str, table: &Table) -> Result<()>;

    /// Case-insensitive layer lookup.
    fn has_layer(&self, name: &str) -> Result<bool> {
        Ok(self
            .layer_names()?
            .iter()
            .any(|l| l.eq_ignore_ascii_case(name)))
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    layers: Vec<Table>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_layers(layers: impl IntoIterator<Item = Table>) -> Self {
        let mut store = Self::new();
        for layer in layers {
            let name = layer.name.clone();
            store.put(&name, layer);
        }
        store
    }

    pub fn layer(&self, name: &str) -> Option<&Table> {
        self.layers.iter().find(|l| l.name.eq_ignore_ascii_case(name))
    }

    fn put(&mut self, name: &str, mut table: Table) {
        table.name = name.to_string();
        match self
            .layers
            .iter_mut()
            .find(|l| l.name.eq_ignore_ascii_case(name))
        {
            Some(existing) => *existing = table,
            None => self.layers.push(table),
        }
    }
}

impl LayerStore for MemoryStore {
    fn layer_names(&self) -> Result<Vec<String>> {
        Ok(self.layers.iter().map(|l| l.name.clone()).collect())
    }

    fn read_layer(&self, name: &str) -> Result<Table> {
        self.layer(name)
            .cloned()
            .ok_or_else(|| anyhow!("layer {} not found", name))
    }

    fn write_layer(&mut self, name: &str, table: &Table) -> Result<()> {
        self.put(name, table.clone());
        Ok(())
    }
}
