use std::path::Path;

use anyhow::Result;
use swmm_core::Feedback;
use swmm_io::{gis_to_swmm, swmm_to_gpkg, GisToSwmmOptions, SwmmToGpkgOptions};

pub fn to_gpkg(
    inp: &Path,
    gpkg: &Path,
    options: &SwmmToGpkgOptions,
    feedback: &mut dyn Feedback,
) -> Result<()> {
    let model = swmm_to_gpkg(inp, gpkg, options, feedback)?;
    println!(
        "Wrote {} sections from {} to {}",
        model.tables().count(),
        inp.display(),
        gpkg.display()
    );
    Ok(())
}

pub fn to_inp(
    gpkg: &Path,
    inp: &Path,
    options: &GisToSwmmOptions,
    feedback: &mut dyn Feedback,
) -> Result<()> {
    let model = gis_to_swmm(gpkg, inp, options, feedback)?;
    println!(
        "Wrote {} sections from {} to {}",
        model.tables().count(),
        gpkg.display(),
        inp.display()
    );
    Ok(())
}
