//! Command line arguments.

use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::time::Duration;

use clap::{ArgAction, Parser};

#[derive(Debug, Clone, Parser)]
#[command(
    name = "git-backup",
    version,
    about = "Mirror the branches and tags of remote Git repositories",
    long_about = "Backs up every repository listed by the configured sources into a \
    local bare mirror. Only refs/heads/* and refs/tags/* are mirrored; diverged \
    refs are kept under a _replaced_ name before being overwritten."
)]
pub struct Args {
    #[arg(short, long, default_value = "config.yml", help = "Path to the configuration file")]
    pub config: PathBuf,

    #[arg(short, action = ArgAction::Count, help = "More logging; repeat for more")]
    pub verbose: u8,

    #[arg(
        long = "set",
        value_name = "KEY=VALUE",
        help = "Override a configuration value, e.g. backup.parallelism=8"
    )]
    pub overrides: Vec<String>,

    #[arg(long, value_name = "N", help = "Repositories backed up at once")]
    pub jobs: Option<NonZeroUsize>,

    #[arg(
        long,
        value_name = "SECS",
        value_parser = parse_interval,
        help = "Keep running, backing up every SECS seconds"
    )]
    pub interval: Option<Duration>,

    #[arg(long, help = "Print the run summary as JSON")]
    pub json: bool,
}

fn parse_interval(value: &str) -> Result<Duration, String> {
    match value.parse::<u64>() {
        Ok(0) => Err("interval must be at least 1 second".to_string()),
        Ok(secs) => Ok(Duration::from_secs(secs)),
        Err(e) => Err(e.to_string()),
    }
}
