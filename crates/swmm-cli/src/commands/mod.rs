use anyhow::Result;
use swmm_cli::{Commands, ToolConfig};
use swmm_core::Feedback;

pub mod bc;
pub mod estry;
pub mod inp;
pub mod scenarios;
pub mod sections;
pub mod xpswmm;
pub mod xs;

pub fn handle(command: &Commands, config: ToolConfig, feedback: &mut dyn Feedback) -> Result<()> {
    match command {
        Commands::InpToGpkg {
            inp,
            gpkg,
            crs,
            no_timeseries_csv,
        } => {
            let mut options = config.inp_to_gpkg;
            if crs.is_some() {
                options.crs = *crs;
            }
            if *no_timeseries_csv {
                options.export_timeseries_csv = false;
            }
            inp::to_gpkg(inp, gpkg, &options, feedback)
        }
        Commands::GpkgToInp {
            gpkg,
            inp,
            no_check_references,
            snap_tolerance,
        } => {
            let mut options = config.gpkg_to_inp;
            if *no_check_references {
                options.check_references = false;
            }
            if let Some(t) = snap_tolerance {
                options.snap_tolerance = *t;
            }
            inp::to_inp(gpkg, inp, &options, feedback)
        }
        Commands::Estry {
            network,
            nodes,
            cross_sections,
            bc,
            xs_dir,
            out,
            inp,
            snap_tolerance,
            cell_size,
            no_auto_nodes,
        } => {
            let mut options = config.estry;
            if let Some(t) = snap_tolerance {
                options.snap_tolerance = *t;
            }
            if let Some(c) = cell_size {
                options.reference_cell_size = *c;
            }
            if *no_auto_nodes {
                options.auto_create_nodes = false;
            }
            let sources = estry::Sources {
                network,
                nodes,
                cross_sections,
                bc,
                xs_dir: xs_dir.as_deref(),
            };
            estry::handle(&sources, out, inp.as_deref(), &options, feedback)
        }
        Commands::Xpswmm {
            nodes,
            links,
            out,
            inp,
            snap_tolerance,
            auto_nodes,
        } => {
            let mut options = config.xpswmm;
            if let Some(t) = snap_tolerance {
                options.snap_tolerance = *t;
            }
            if *auto_nodes {
                options.auto_create_nodes = true;
            }
            xpswmm::handle(nodes, links, out, inp.as_deref(), &options, feedback)
        }
        Commands::Scenarios {
            scenarios: list,
            out_dir,
            prefix,
            no_inp,
        } => {
            let mut options = config.scenarios;
            if let Some(p) = prefix {
                options.prefix = p.clone();
            }
            if *no_inp {
                options.write_inp = false;
            }
            scenarios::handle(list, out_dir, &options, feedback)
        }
        Commands::FixBc {
            bc: source,
            swmm,
            out,
            tolerance,
        } => {
            let mut options = config.fix_bc;
            if let Some(t) = tolerance {
                options.tolerance = *t;
            }
            bc::handle(source, swmm, out, &options, feedback)
        }
        Commands::XsCurve { csv, kind, json } => xs::handle(csv, kind, *json),
        Commands::Sections => sections::handle(),
    }
}
