//! Conversion options read from a TOML file.
//!
//! ```toml
//! [estry]
//! snap_tolerance = 0.01
//! reference_cell_size = 2.0
//!
//! [scenarios]
//! prefix = "flood"
//! ```

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use swmm_io::{
    BcFixOptions, EstryConvertOptions, GisToSwmmOptions, ScenarioOptions, SwmmToGpkgOptions,
    XpswmmOptions,
};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolConfig {
    pub inp_to_gpkg: SwmmToGpkgOptions,
    pub gpkg_to_inp: GisToSwmmOptions,
    pub estry: EstryConvertOptions,
    pub xpswmm: XpswmmOptions,
    pub scenarios: ScenarioOptions,
    pub fix_bc: BcFixOptions,
}

impl ToolConfig {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let contents = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        toml::from_str(&contents).with_context(|| format!("parsing config {}", path.display()))
    }
}
