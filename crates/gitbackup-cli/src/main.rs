//! git-backup binary.

use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use gitbackup_cli::{Args, logging, run};
use gitbackup_core::load_config_with_overrides;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let args = Args::parse();

    let settings = load_config_with_overrides(&args.config, &args.overrides)
        .with_context(|| format!("failed to load {}", args.config.display()))?;
    logging::init(&settings.logging, args.verbose)?;

    tracing::info!("Starting git-backup v{}", env!("CARGO_PKG_VERSION"));

    if run(&args, &settings).await? {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}
