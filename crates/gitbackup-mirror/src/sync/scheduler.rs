//! Running many backups, once or periodically.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::{Semaphore, watch};
use tokio::task::{Id, JoinError, JoinHandle, JoinSet};
use tokio::time::interval;
use tracing::{debug, info, warn};

use super::BackupState;
use crate::backup::{BackupReport, LocalBackup};
use crate::error::MirrorError;
use crate::repository::{DivergencePolicy, ReplaceDiverged};

/// Shortest interval between periodic runs.
pub const MIN_INTERVAL: Duration = Duration::from_secs(1);

/// Configuration for the backup scheduler.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Maximum number of backups running at once.
    pub parallelism: usize,
    /// Interval between periodic runs.
    pub interval: Duration,
    /// Number of consecutive failing runs before backing off.
    pub max_failures: u32,
    /// Backoff multiplier for failures.
    pub backoff_multiplier: f64,
    /// Maximum backoff duration.
    pub max_backoff: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            parallelism: 4,
            interval: Duration::from_secs(3600),
            max_failures: 3,
            backoff_multiplier: 2.0,
            max_backoff: Duration::from_secs(6 * 3600),
        }
    }
}

/// A backup that failed.
#[derive(Debug, Clone, Serialize)]
pub struct JobFailure {
    /// Full name of the repository.
    pub repo: String,
    /// The error message.
    pub error: String,
    /// True if a retry might succeed.
    pub transient: bool,
}

/// The outcome of one run over all jobs, sorted by repository.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    pub reports: Vec<BackupReport>,
    pub failures: Vec<JobFailure>,
}

impl RunSummary {
    /// Returns true if every backup succeeded.
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// Returns the number of backups attempted.
    pub fn total(&self) -> usize {
        self.reports.len() + self.failures.len()
    }
}

/// Handle for controlling a running periodic scheduler.
pub struct ScheduleHandle {
    /// Sender to signal shutdown.
    shutdown_tx: watch::Sender<bool>,
    /// Summary of the latest finished run.
    summaries: watch::Receiver<Option<RunSummary>>,
    task: Option<JoinHandle<()>>,
}

impl ScheduleHandle {
    /// Signals the scheduler to stop after the current run.
    pub fn stop(&self) {
        let _ = self.shutdown_tx.send(true);
    }

    /// Returns a receiver that changes after every finished run.
    pub fn summaries(&self) -> watch::Receiver<Option<RunSummary>> {
        self.summaries.clone()
    }

    /// Returns the summary of the latest finished run.
    pub fn last_summary(&self) -> Option<RunSummary> {
        self.summaries.borrow().clone()
    }

    /// Stops the scheduler, waits for the current run to finish and returns
    /// the summary of the last run.
    pub async fn shutdown(mut self) -> Option<RunSummary> {
        self.stop();
        if let Some(task) = self.task.take()
            && let Err(e) = task.await
        {
            warn!("Backup scheduler task failed: {}", e);
        }
        self.last_summary()
    }
}

impl Drop for ScheduleHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Runs backups for a set of repositories with bounded parallelism.
pub struct BackupScheduler {
    jobs: Vec<Arc<LocalBackup>>,
    policy: Arc<dyn DivergencePolicy>,
    state: Arc<BackupState>,
    config: SchedulerConfig,
    /// Current backoff duration.
    current_backoff: Arc<Mutex<Duration>>,
    /// Number of consecutive runs with at least one failure.
    failed_runs: Arc<Mutex<u32>>,
    summary_tx: watch::Sender<Option<RunSummary>>,
}

impl BackupScheduler {
    /// Creates a new scheduler using the default divergence policy.
    ///
    /// The interval is raised to at least [`MIN_INTERVAL`] and the backoff
    /// multiplier to at least 1.
    pub fn new(jobs: Vec<LocalBackup>, mut config: SchedulerConfig) -> Self {
        if config.interval < MIN_INTERVAL {
            warn!(
                "Scheduler interval {:?} is too short, using {:?}",
                config.interval, MIN_INTERVAL
            );
            config.interval = MIN_INTERVAL;
        }
        config.max_backoff = config.max_backoff.max(config.interval);
        config.backoff_multiplier = config.backoff_multiplier.max(1.0);

        Self {
            jobs: jobs.into_iter().map(Arc::new).collect(),
            policy: Arc::new(ReplaceDiverged),
            state: Arc::new(BackupState::new()),
            current_backoff: Arc::new(Mutex::new(config.interval)),
            failed_runs: Arc::new(Mutex::new(0)),
            summary_tx: watch::Sender::new(None),
            config,
        }
    }

    /// Sets the divergence policy for all jobs.
    pub fn with_policy(mut self, policy: Arc<dyn DivergencePolicy>) -> Self {
        self.policy = policy;
        self
    }

    /// Returns the per-repository state.
    pub fn state(&self) -> Arc<BackupState> {
        Arc::clone(&self.state)
    }

    /// Returns the number of jobs.
    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    /// Returns true if there are no jobs.
    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Backs up every repository once.
    pub async fn run_once(&self) -> RunSummary {
        let semaphore = Arc::new(Semaphore::new(self.config.parallelism.max(1)));
        let mut tasks = JoinSet::new();

        info!(
            "Backing up {} repositories, {} at a time",
            self.jobs.len(),
            self.config.parallelism.max(1)
        );

        let mut names = HashMap::new();
        for job in &self.jobs {
            let job = Arc::clone(job);
            let policy = Arc::clone(&self.policy);
            let semaphore = Arc::clone(&semaphore);
            let name = job.repo().full_name().to_string();

            let handle = tasks.spawn(async move {
                let _permit = semaphore.acquire_owned().await;
                let name = job.repo().full_name().to_string();
                (name, job.backup_with(policy).await)
            });
            names.insert(handle.id(), name);
        }

        let mut summary = RunSummary::default();
        while let Some(joined) = tasks.join_next().await {
            self.record(&mut summary, joined, &mut names);
        }

        summary.reports.sort_by(|a, b| a.repo.cmp(&b.repo));
        summary.failures.sort_by(|a, b| a.repo.cmp(&b.repo));

        info!(
            "Backup run finished: {} succeeded, {} failed",
            summary.reports.len(),
            summary.failures.len()
        );
        summary
    }

    /// Adds the outcome of one backup task to `summary` and the state.
    ///
    /// A task that panicked counts as a failure of the job it ran.
    fn record(
        &self,
        summary: &mut RunSummary,
        joined: Result<(String, Result<BackupReport, MirrorError>), JoinError>,
        names: &mut HashMap<Id, String>,
    ) {
        let (name, error, transient) = match joined {
            Ok((name, Ok(report))) => {
                self.state.record_success(&name);
                summary.reports.push(report);
                return;
            },
            Ok((name, Err(e))) => (name, e.to_string(), e.is_transient()),
            Err(e) => {
                let name = names.remove(&e.id()).unwrap_or_default();
                warn!("Backup task for {} failed: {}", name, e);
                (name, format!("backup task failed: {}", e), false)
            },
        };

        self.state.record_failure(&name, error.clone());
        summary.failures.push(JobFailure {
            repo: name,
            error,
            transient,
        });
    }

    /// Starts periodic backups in the background.
    ///
    /// The first run starts immediately. Returns a handle that can be used
    /// to stop the scheduler.
    pub fn start(self) -> ScheduleHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let summaries = self.summary_tx.subscribe();
        let task = tokio::spawn(self.run(shutdown_rx));

        ScheduleHandle {
            shutdown_tx,
            summaries,
            task: Some(task),
        }
    }

    /// Runs the scheduler loop.
    async fn run(self, mut shutdown_rx: watch::Receiver<bool>) {
        let initial_interval = self.config.interval;
        let mut interval_timer = interval(initial_interval);

        info!(
            "Starting backup scheduler with interval {:?}",
            initial_interval
        );

        loop {
            tokio::select! {
                _ = interval_timer.tick() => {
                    self.do_run().await;

                    // Adjust interval based on current backoff
                    let current = *self.current_backoff.lock();
                    if current != interval_timer.period() {
                        interval_timer = interval(current);
                        interval_timer.tick().await;
                    }
                }
                result = shutdown_rx.changed() => {
                    if result.is_err() || *shutdown_rx.borrow() {
                        info!("Backup scheduler shutting down");
                        break;
                    }
                }
            }
        }
    }

    /// Performs one scheduled run.
    async fn do_run(&self) -> RunSummary {
        debug!("Starting scheduled backup run");
        let summary = self.run_once().await;

        if summary.is_success() {
            self.reset_backoff();
        } else {
            self.increase_backoff();
        }
        self.summary_tx.send_replace(Some(summary.clone()));
        summary
    }

    /// Resets the backoff to the base interval.
    fn reset_backoff(&self) {
        *self.failed_runs.lock() = 0;
        *self.current_backoff.lock() = self.config.interval;
    }

    /// Increases the backoff duration after a failing run.
    fn increase_backoff(&self) {
        let failed_runs = {
            let mut failed_runs = self.failed_runs.lock();
            *failed_runs += 1;
            *failed_runs
        };

        if failed_runs >= self.config.max_failures {
            let mut backoff = self.current_backoff.lock();
            let new_backoff =
                Duration::from_secs_f64(backoff.as_secs_f64() * self.config.backoff_multiplier);
            *backoff = new_backoff.clamp(MIN_INTERVAL, self.config.max_backoff);

            debug!(
                "Increased backoff to {:?} after {} failing runs",
                *backoff, failed_runs
            );
        }
    }

    /// Returns the current interval between runs.
    pub fn current_interval(&self) -> Duration {
        *self.current_backoff.lock()
    }
}
