use std::path::Path;

use anyhow::Result;
use swmm_cli::layers::read_all;
use swmm_core::Feedback;
use swmm_io::{xpswmm_to_swmm, XpswmmInputs, XpswmmOptions};

pub fn handle(
    nodes: &[String],
    links: &[String],
    out: &Path,
    inp: Option<&Path>,
    options: &XpswmmOptions,
    feedback: &mut dyn Feedback,
) -> Result<()> {
    let inputs = XpswmmInputs {
        nodes: read_all(nodes)?,
        links: read_all(links)?,
    };
    let model = xpswmm_to_swmm(&inputs, out, inp, options, feedback)?;
    println!(
        "Converted {} links into {}",
        model.table("Conduits").map_or(0, |t| t.len()),
        out.display()
    );
    Ok(())
}
