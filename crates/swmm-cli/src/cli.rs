use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "swmm-gis", author, version, about, long_about = None)]
pub struct Cli {
    /// Set the logging level
    #[arg(long, default_value = "info")]
    pub log_level: tracing::Level,

    /// TOML file with conversion options; flags override its values
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Write every warning and error as JSON to this file
    #[arg(long, global = true)]
    pub diagnostics: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Convert a SWMM input file to a GeoPackage
    InpToGpkg {
        /// SWMM `.inp` file
        inp: PathBuf,
        /// GeoPackage to create
        gpkg: PathBuf,
        /// EPSG code stamped on geometry layers
        #[arg(long)]
        crs: Option<i32>,
        /// Do not write time series CSV files
        #[arg(long)]
        no_timeseries_csv: bool,
    },
    /// Convert a GeoPackage back to a SWMM input file
    GpkgToInp {
        gpkg: PathBuf,
        inp: PathBuf,
        /// Accept links that reference nodes missing from the GeoPackage
        #[arg(long)]
        no_check_references: bool,
        #[arg(long)]
        snap_tolerance: Option<f64>,
    },
    /// Build a SWMM model from ESTRY layers
    Estry {
        /// `1d_nwk` layers as `file.gpkg>layer`, `file.gpkg` or `file.shp`
        #[arg(long = "network", required = true)]
        network: Vec<String>,
        /// Node layers
        #[arg(long = "nodes")]
        nodes: Vec<String>,
        /// `1d_xs` layers
        #[arg(long = "xs")]
        cross_sections: Vec<String>,
        /// `1d_bc` layers
        #[arg(long = "bc")]
        bc: Vec<String>,
        /// Directory relative cross-section paths are resolved against
        #[arg(long)]
        xs_dir: Option<PathBuf>,
        /// GeoPackage to create
        #[arg(short, long)]
        out: PathBuf,
        /// Also write a SWMM input file
        #[arg(long)]
        inp: Option<PathBuf>,
        #[arg(long)]
        snap_tolerance: Option<f64>,
        #[arg(long)]
        cell_size: Option<f64>,
        /// Do not create nodes at unconnected channel ends
        #[arg(long)]
        no_auto_nodes: bool,
    },
    /// Build a SWMM model from XPSWMM node and link exports
    Xpswmm {
        #[arg(long = "nodes")]
        nodes: Vec<String>,
        #[arg(long = "links", required = true)]
        links: Vec<String>,
        #[arg(short, long)]
        out: PathBuf,
        #[arg(long)]
        inp: Option<PathBuf>,
        #[arg(long)]
        snap_tolerance: Option<f64>,
        /// Create nodes at link ends that neither name nor touch a node
        #[arg(long)]
        auto_nodes: bool,
    },
    /// Split scenario GeoPackages into a common model and differences
    Scenarios {
        /// Scenario as `NAME=file.gpkg`
        #[arg(long = "scenario", required = true)]
        scenarios: Vec<String>,
        #[arg(long)]
        out_dir: PathBuf,
        #[arg(long)]
        prefix: Option<String>,
        /// Only write GeoPackages
        #[arg(long)]
        no_inp: bool,
    },
    /// Move 2D boundary connections onto nearby SWMM nodes
    FixBc {
        /// 2d_bc layer as `file.gpkg>layer`, `file.gpkg` or `file.shp`
        bc: String,
        /// SWMM GeoPackage providing the nodes
        swmm: PathBuf,
        /// Output as `file.gpkg>layer`, `file.gpkg` or `file.shp`
        #[arg(short, long)]
        out: String,
        #[arg(long)]
        tolerance: Option<f64>,
    },
    /// Print the SWMM shape curve of a cross-section CSV
    XsCurve {
        csv: PathBuf,
        /// Cross-section type
        #[arg(long, default_value = "XZ")]
        kind: String,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// List the supported `.inp` sections and their GIS layers
    Sections,
}
