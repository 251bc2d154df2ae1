use std::path::Path;

use anyhow::Result;
use swmm_cli::LayerSource;
use swmm_core::Feedback;
use swmm_io::{fix_bc_layer, BcFixOptions};

pub fn handle(
    bc: &str,
    swmm: &Path,
    out: &str,
    options: &BcFixOptions,
    feedback: &mut dyn Feedback,
) -> Result<()> {
    let source = LayerSource::parse(bc)?;
    let target = LayerSource::parse(out)?;
    let bc_layer = match &source.layer {
        Some(layer) => layer.clone(),
        None => source.output_layer(),
    };
    let report = fix_bc_layer(
        &source.path,
        &bc_layer,
        swmm,
        &target.path,
        &target.output_layer(),
        options,
        feedback,
    )?;
    println!(
        "Moved {} vertices; {} could not be connected",
        report.moved, report.unresolved
    );
    Ok(())
}
