use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use swmm_core::Feedback;
use swmm_io::{extract_scenarios, ScenarioOptions};

fn parse_scenario(arg: &str) -> Result<(String, PathBuf)> {
    let (name, path) = arg
        .split_once('=')
        .ok_or_else(|| anyhow!("scenario '{}' must be given as NAME=file.gpkg", arg))?;
    Ok((name.trim().to_string(), PathBuf::from(path.trim())))
}

pub fn handle(
    scenarios: &[String],
    out_dir: &Path,
    options: &ScenarioOptions,
    feedback: &mut dyn Feedback,
) -> Result<()> {
    let list = scenarios
        .iter()
        .map(|s| parse_scenario(s))
        .collect::<Result<Vec<_>>>()?;
    let report = extract_scenarios(&list, out_dir, options, feedback)?;
    println!(
        "Extracted {} common rows and {} scenarios into {}",
        report.common.rows,
        report.scenarios.len(),
        out_dir.display()
    );
    println!("Control lines: {}", report.control_file.display());
    Ok(())
}
