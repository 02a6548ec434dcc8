//! Turning the configuration into backup jobs and running them.

use std::future::Future;
use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use gitbackup_core::{Credentials, GitRepo, Settings};
use gitbackup_mirror::{
    BackupScheduler, LocalBackup, MirrorConfig, MirrorError, RunSummary, SchedulerConfig,
    mirror_path,
};
use gitbackup_sources::{RepoSource, from_specs};
use serde::Serialize;
use tracing::{error, info, warn};

use crate::cli::Args;

/// A source or repository that could not be turned into a job.
#[derive(Debug, Clone, Serialize)]
pub struct SetupFailure {
    /// Source name, or `<source>/<full_name>` for a repository.
    pub name: String,
    pub error: String,
}

/// Everything one backup run did.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Outcome {
    pub setup_failures: Vec<SetupFailure>,
    #[serde(flatten)]
    pub summary: RunSummary,
}

impl Outcome {
    /// Returns true if every source was listed and every backup succeeded.
    pub fn is_success(&self) -> bool {
        self.setup_failures.is_empty() && self.summary.is_success()
    }
}

/// Lists the repositories of every configured source.
///
/// An invalid source entry aborts; a source that cannot be listed is
/// recorded and the others still run.
pub async fn collect_jobs(
    settings: &Settings,
) -> anyhow::Result<(Vec<LocalBackup>, Vec<SetupFailure>)> {
    let sources = from_specs(&settings.sources).context("invalid source configuration")?;

    let mut jobs = Vec::new();
    let mut failures = Vec::new();
    for source in &sources {
        match source_jobs(source.as_ref(), settings, &mut failures).await {
            Ok(mut source_jobs) => {
                info!(
                    "Source '{}' ({}) has {} repositories",
                    source.name(),
                    source.kind(),
                    source_jobs.len()
                );
                jobs.append(&mut source_jobs);
            },
            Err(e) => {
                warn!("Skipping source '{}': {:#}", source.name(), e);
                failures.push(SetupFailure {
                    name: source.name().to_string(),
                    error: format!("{:#}", e),
                });
            },
        }
    }

    Ok((jobs, failures))
}

async fn source_jobs(
    source: &dyn RepoSource,
    settings: &Settings,
    failures: &mut Vec<SetupFailure>,
) -> anyhow::Result<Vec<LocalBackup>> {
    let credentials = source
        .credentials()
        .await
        .context("failed to resolve credentials")?;
    let repos = source
        .list_repos()
        .await
        .context("failed to list repositories")?;

    let base_dir = settings.source_dir(source.name());
    let lock_timeout = settings.backup.lock_timeout();

    let mut jobs = Vec::with_capacity(repos.len());
    for repo in repos {
        let name = format!("{}/{}", source.name(), repo.full_name());
        match job(repo, &base_dir, &credentials, lock_timeout) {
            Ok(job) => jobs.push(job),
            Err(e) => {
                warn!("Skipping repository {}: {}", name, e);
                failures.push(SetupFailure {
                    name,
                    error: e.to_string(),
                });
            },
        }
    }
    Ok(jobs)
}

fn job(
    repo: GitRepo,
    base_dir: &Path,
    credentials: &Credentials,
    lock_timeout: Duration,
) -> Result<LocalBackup, MirrorError> {
    let config = MirrorConfig::builder()
        .url(repo.url())
        .local_path(mirror_path(base_dir, repo.full_name())?)
        .lock_timeout(lock_timeout)
        .credentials(credentials.clone())
        .build()
        .map_err(|e| MirrorError::InvalidConfig(e.to_string()))?;

    Ok(LocalBackup::with_config(repo, config))
}

/// Runs the backups described by `settings`.
///
/// Without `--interval` this backs up every repository once and returns
/// whether everything succeeded. With it, backups repeat until Ctrl-C or
/// SIGTERM and the result is that of the last run. Sources are listed once
/// at startup; repositories created later are picked up on restart.
pub async fn run(args: &Args, settings: &Settings) -> anyhow::Result<bool> {
    let (jobs, setup_failures) = collect_jobs(settings).await?;

    let mut config = SchedulerConfig {
        parallelism: args
            .jobs
            .map_or(settings.backup.parallelism, |jobs| jobs.get()),
        ..Default::default()
    };
    if let Some(interval) = args.interval {
        config.interval = interval;
    }

    info!(
        "Backing up {} repositories into {} ({} at a time)",
        jobs.len(),
        settings.clone_base_dir.display(),
        config.parallelism
    );
    let scheduler = BackupScheduler::new(jobs, config);

    if args.interval.is_some() {
        return run_periodically(args, scheduler, setup_failures, shutdown_signal()).await;
    }

    let outcome = Outcome {
        setup_failures,
        summary: scheduler.run_once().await,
    };
    report(args, &outcome)?;
    Ok(outcome.is_success())
}

/// Runs `scheduler` periodically until `shutdown` completes, reporting
/// every finished run. Returns whether the last run succeeded.
pub async fn run_periodically(
    args: &Args,
    scheduler: BackupScheduler,
    setup_failures: Vec<SetupFailure>,
    shutdown: impl Future<Output = ()>,
) -> anyhow::Result<bool> {
    let handle = scheduler.start();
    let mut summaries = handle.summaries();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            changed = summaries.changed() => {
                if changed.is_err() {
                    break;
                }
                let summary = summaries.borrow_and_update().clone();
                if let Some(summary) = summary {
                    report(args, &Outcome { setup_failures: setup_failures.clone(), summary })?;
                }
            }
            _ = &mut shutdown => break,
        }
    }

    let Some(summary) = handle.shutdown().await else {
        warn!("Stopped before any backup run finished");
        return Ok(false);
    };
    Ok(Outcome {
        setup_failures,
        summary,
    }
    .is_success())
}

fn report(args: &Args, outcome: &Outcome) -> anyhow::Result<()> {
    if args.json {
        println!("{}", serde_json::to_string_pretty(outcome)?);
    }
    for failure in &outcome.summary.failures {
        error!("Backup of {} failed: {}", failure.repo, failure.error);
    }
    info!(
        "Backed up {} of {} repositories",
        outcome.summary.reports.len(),
        outcome.summary.total()
    );
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            },
            Err(e) => {
                error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
