//! A whole `.inp` file held as one table per section.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use swmm_core::table::Table;
use swmm_core::{DrainageNetwork, Feedback, SwmmError};
use tracing::debug;

use crate::codec::{decode_section, encode_section, parse_sections};
use crate::sections::{all_sections, find_section, link_sections, node_sections, TRANSECT_COORDS};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SwmmModel {
    tables: BTreeMap<String, Table>,
}

impl SwmmModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decodes `.inp` text. Unknown sections are fatal; GIS-only sections
    /// are skipped with a warning.
    pub fn from_inp_str(text: &str, feedback: &mut dyn Feedback) -> Result<Self> {
        let mut model = Self::new();
        for block in parse_sections(text) {
            feedback.check_canceled()?;
            let section = find_section(&block.name)
                .with_context(|| format!("Reading section header at line {}", block.line_no))?;
            if section.gis_only {
                feedback.push_warning(&format!(
                    "Section [{}] is only used in GIS layers and was skipped",
                    block.name
                ));
                continue;
            }
            debug!(section = section.name, lines = block.lines.len(), "decoding section");
            let tables = decode_section(section, &block.lines, feedback)
                .with_context(|| format!("Decoding section [{}]", block.name))?;
            for table in tables {
                model.insert(table);
            }
        }
        Ok(model)
    }

    pub fn read_inp(path: &Path, feedback: &mut dyn Feedback) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading SWMM input file {}", path.display()))?;
        Self::from_inp_str(&text, feedback)
            .with_context(|| format!("parsing SWMM input file {}", path.display()))
    }

    /// Encodes every non-empty section in catalog order.
    pub fn to_inp_string(&self) -> String {
        let mut out = String::new();
        for section in all_sections() {
            if section.gis_only {
                continue;
            }
            let Some(table) = self.tables.get(section.name) else {
                continue;
            };
            let companion = if section.name == "Transects" {
                self.tables.get(TRANSECT_COORDS)
            } else {
                None
            };
            out.push_str(&encode_section(section, table, companion));
        }
        out
    }

    pub fn write_inp(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("creating directory {}", parent.display()))?;
            }
        }
        fs::write(path, self.to_inp_string())
            .with_context(|| format!("writing SWMM input file {}", path.display()))
    }

    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.get(name)
    }

    pub fn table_mut(&mut self, name: &str) -> Option<&mut Table> {
        self.tables.get_mut(name)
    }

    /// Returns the named table, creating an empty one from the catalog
    /// layout if it does not exist yet.
    pub fn table_or_default(&mut self, name: &str) -> Result<&mut Table, SwmmError> {
        if !self.tables.contains_key(name) {
            let section = find_section(name)?;
            self.tables.insert(name.to_string(), section.empty_table());
        }
        self.tables
            .get_mut(name)
            .ok_or_else(|| SwmmError::UnknownSection(name.to_string()))
    }

    /// Inserts a table, replacing any table with the same name.
    pub fn insert(&mut self, table: Table) {
        self.tables.insert(table.name.clone(), table);
    }

    pub fn remove(&mut self, name: &str) -> Option<Table> {
        self.tables.remove(name)
    }

    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.tables.values()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.values().all(Table::is_empty)
    }

    /// Graph of every node and link section present.
    pub fn network(&self) -> DrainageNetwork {
        let nodes: Vec<&Table> = node_sections()
            .iter()
            .filter_map(|s| self.tables.get(s.name))
            .collect();
        let links: Vec<&Table> = link_sections()
            .iter()
            .filter_map(|s| self.tables.get(s.name))
            .collect();
        DrainageNetwork::from_tables(&nodes, &links)
    }
}
