use std::path::Path;

use anyhow::Result;
use swmm_cli::layers::read_all;
use swmm_core::Feedback;
use swmm_io::{estry_to_swmm, EstryConvertOptions, EstryInputs};

/// Layer arguments as given on the command line.
pub struct Sources<'a> {
    pub network: &'a [String],
    pub nodes: &'a [String],
    pub cross_sections: &'a [String],
    pub bc: &'a [String],
    pub xs_dir: Option<&'a Path>,
}

pub fn handle(
    sources: &Sources<'_>,
    out: &Path,
    inp: Option<&Path>,
    options: &EstryConvertOptions,
    feedback: &mut dyn Feedback,
) -> Result<()> {
    let inputs = EstryInputs {
        network: read_all(sources.network)?,
        nodes: read_all(sources.nodes)?,
        cross_sections: read_all(sources.cross_sections)?,
        bc: read_all(sources.bc)?,
        xs_base_dir: sources.xs_dir.map(Path::to_path_buf),
    };
    let model = estry_to_swmm(&inputs, out, inp, options, feedback)?;
    let conduits = model.table("Conduits").map_or(0, |t| t.len());
    let junctions = model.table("Junctions").map_or(0, |t| t.len());
    println!(
        "Converted {} conduits and {} junctions into {}",
        conduits,
        junctions,
        out.display()
    );
    Ok(())
}
