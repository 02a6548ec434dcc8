//! Logging setup.

use anyhow::{Context, bail};
use gitbackup_core::LoggingSettings;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

const LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

/// Targets that `logging.level` applies to. Everything else logs warnings.
const TARGETS: [&str; 5] = [
    "gitbackup_core",
    "gitbackup_mirror",
    "gitbackup_sources",
    "gitbackup_cli",
    "git_backup",
];

/// Returns the filter directive for the configured logging.
///
/// `logging.filter` wins over `logging.level`; each `-v` raises the level
/// by one step, up to `trace`.
pub fn filter_directive(settings: &LoggingSettings, verbose: u8) -> anyhow::Result<String> {
    if let Some(filter) = &settings.filter {
        return Ok(filter.clone());
    }

    let Some(base) = LEVELS
        .iter()
        .position(|level| level.eq_ignore_ascii_case(settings.level.trim()))
    else {
        bail!(
            "unknown log level '{}', expected one of {}",
            settings.level,
            LEVELS.join(", ")
        );
    };
    let level = LEVELS[(base + verbose as usize).min(LEVELS.len() - 1)];

    let mut directive = String::from("warn");
    for target in TARGETS {
        directive.push_str(&format!(",{}={}", target, level));
    }
    Ok(directive)
}

/// Installs the global subscriber. `RUST_LOG` overrides the configuration.
pub fn init(settings: &LoggingSettings, verbose: u8) -> anyhow::Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => {
            let directive = filter_directive(settings, verbose)?;
            EnvFilter::try_new(&directive)
                .with_context(|| format!("invalid logging filter '{}'", directive))?
        },
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .context("failed to install the logger")
}
