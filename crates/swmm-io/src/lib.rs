//! # swmm-io: SWMM input files, GeoPackages and 1D network conversion
//!
//! Converts EPA SWMM `.inp` files to GIS layers and back, and builds SWMM
//! models from ESTRY and XPSWMM GIS exports.
//!
//! ## Quick Start: `.inp` to GeoPackage and back
//!
//! ```rust,no_run
//! use std::path::Path;
//! use swmm_core::LogFeedback;
//! use swmm_io::{gis_to_swmm, swmm_to_gpkg, GisToSwmmOptions, SwmmToGpkgOptions};
//!
//! fn main() -> anyhow::Result<()> {
//!     let mut feedback = LogFeedback;
//!     let model = swmm_to_gpkg(
//!         Path::new("model.inp"),
//!         Path::new("model.gpkg"),
//!         &SwmmToGpkgOptions::default(),
//!         &mut feedback,
//!     )?;
//!     println!("sections: {}", model.tables().count());
//!
//!     gis_to_swmm(
//!         Path::new("model.gpkg"),
//!         Path::new("roundtrip.inp"),
//!         &GisToSwmmOptions::default(),
//!         &mut feedback,
//!     )?;
//!     Ok(())
//! }
//! ```
//!
//! ## Module Overview
//!
//! - [`sections`]: the section catalog; one field list per section drives
//!   both decoding and encoding
//! - [`codec`]: `.inp` tokenizing, section splitting, table encode/decode
//! - [`model`]: [`SwmmModel`], the decoded section tables
//! - [`store`]: [`LayerStore`] over GDAL/OGR vector sources (GeoPackage,
//!   Shapefile, MapInfo) and an in-memory backend
//! - [`reconcile`]: geometry sections ⇄ per-feature GIS geometry
//! - [`estry`]: ESTRY channels, pits and boundaries to SWMM
//! - [`xpswmm`]: XPSWMM node/link exports to SWMM
//! - [`scenarios`]: common and per-scenario model extraction
//! - [`bc`]: 2D boundary connection repair
//! - [`messages`]: the `Messages` layer for located warnings

pub mod bc;
pub mod codec;
pub mod estry;
pub mod messages;
pub mod model;
pub mod reconcile;
pub mod scenarios;
pub mod sections;
pub mod store;
pub mod xpswmm;

pub use bc::{fix_bc_layer, fix_invalid_bc_connections, BcFixOptions, BcFixReport};
pub use estry::xs::{hw_curve_from_hw, hw_curve_from_xz, load_cross_section, read_curve_csv, HwCurve};
pub use estry::{convert_layers, estry_to_swmm, EstryConvertOptions, EstryInputs};
pub use messages::{MessageLog, MESSAGES_LAYER};
pub use model::SwmmModel;
pub use reconcile::{
    gis_to_swmm, layers_to_model, model_to_layers, swmm_to_gpkg, GisToSwmmOptions,
    SwmmToGpkgOptions,
};
pub use scenarios::{extract_scenarios, ScenarioOptions, ScenarioReport};
pub use store::{LayerStore, MemoryStore, OgrStore};
pub use xpswmm::{convert_xpswmm, xpswmm_to_swmm, XpswmmInputs, XpswmmOptions};
