use std::fs;
use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use swmm_cli::{Cli, ToolConfig};
use swmm_core::CapturingFeedback;
use tracing::{error, info};
use tracing_subscriber::FmtSubscriber;

mod commands;

fn write_diagnostics(path: &Path, feedback: &CapturingFeedback) -> Result<()> {
    let file = fs::File::create(path)
        .with_context(|| format!("creating diagnostics file {}", path.display()))?;
    serde_json::to_writer_pretty(file, &feedback.diagnostics)
        .with_context(|| format!("writing diagnostics to {}", path.display()))?;
    Ok(())
}

fn run(cli: &Cli, feedback: &mut CapturingFeedback) -> Result<()> {
    let config = ToolConfig::load(cli.config.as_deref())?;
    commands::handle(&cli.command, config, feedback)
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(cli.log_level)
        .with_writer(std::io::stderr)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("setting default subscriber failed: {e}");
    }

    let mut feedback = CapturingFeedback::logging();
    let result = run(&cli, &mut feedback);

    if let Some(path) = &cli.diagnostics {
        if let Err(e) = write_diagnostics(path, &feedback) {
            error!("{:#}", e);
        }
    }
    info!("{}", feedback.diagnostics.summary());

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
