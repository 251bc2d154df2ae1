//! GIS ⇄ `.inp` reconciliation.
//!
//! The GIS side stores one layer per section with geometry attached to the
//! record. The `.inp` side keeps geometry in separate sections
//! (`[COORDINATES]`, `[VERTICES]`, `[POLYGONS]`, `[SYMBOLS]`) and spreads a
//! link or subcatchment over several sections. [`to_gis`] joins them;
//! [`to_inp`] splits them back apart and validates the resulting network.

mod to_gis;
mod to_inp;

use serde::{Deserialize, Serialize};

pub use to_gis::{export_timeseries_csv, model_to_layers, swmm_to_gpkg, timeseries_dir, write_layers};
pub use to_inp::{gis_to_swmm, layers_to_model};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SwmmToGpkgOptions {
    /// EPSG code stamped on geometry layers. Coordinates are never
    /// reprojected.
    pub crs: Option<i32>,
    /// Write one CSV per time series next to the GeoPackage.
    pub export_timeseries_csv: bool,
}

impl Default for SwmmToGpkgOptions {
    fn default() -> Self {
        Self {
            crs: None,
            export_timeseries_csv: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GisToSwmmOptions {
    /// Treat links that reference unknown nodes as fatal.
    pub check_references: bool,
    /// Largest allowed gap between a link end and its node point.
    pub snap_tolerance: f64,
}

impl Default for GisToSwmmOptions {
    fn default() -> Self {
        Self {
            check_references: true,
            snap_tolerance: 0.001,
        }
    }
}

/// A section folded into other layers as `<prefix><column>` columns.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Merge {
    pub section: &'static str,
    pub prefix: &'static str,
    pub into: &'static [&'static str],
}

pub(crate) const MERGES: &[Merge] = &[
    Merge {
        section: "XSections",
        prefix: "xsec_",
        into: &["Conduits", "Weirs", "Orifices"],
    },
    Merge {
        section: "Losses",
        prefix: "losses_",
        into: &["Conduits"],
    },
    Merge {
        section: "Subareas",
        prefix: "subareas_",
        into: &["Subcatchments"],
    },
    Merge {
        section: "Infiltration",
        prefix: "infiltration_",
        into: &["Subcatchments"],
    },
];

pub(crate) fn merges_into(section: &str) -> impl Iterator<Item = &'static Merge> + '_ {
    MERGES.iter().filter(move |m| m.into.contains(&section))
}

/// `name` without `prefix`, compared case-insensitively.
pub(crate) fn strip_prefix_ci<'a>(name: &'a str, prefix: &str) -> Option<&'a str> {
    if name.len() > prefix.len()
        && name.is_char_boundary(prefix.len())
        && name[..prefix.len()].eq_ignore_ascii_case(prefix)
    {
        Some(&name[prefix.len()..])
    } else {
        None
    }
}
