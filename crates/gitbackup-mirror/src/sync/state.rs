//! Backup state tracking.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::RwLock;

/// Outcome history of one repository.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepoStatus {
    /// The last successful backup time.
    pub last_success: Option<Instant>,
    /// The last error message, if the last backup failed.
    pub last_error: Option<String>,
    /// Number of consecutive failures.
    pub failure_count: u32,
}

/// Tracks backup outcomes per repository full name.
#[derive(Debug, Default)]
pub struct BackupState {
    repos: RwLock<HashMap<String, RepoStatus>>,
}

impl BackupState {
    /// Creates an empty state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a successful backup.
    pub fn record_success(&self, repo: &str) {
        let mut repos = self.repos.write();
        let status = repos.entry(repo.to_string()).or_default();

        status.last_success = Some(Instant::now());
        status.last_error = None;
        status.failure_count = 0;
    }

    /// Records a failed backup.
    pub fn record_failure(&self, repo: &str, error: impl Into<String>) {
        let mut repos = self.repos.write();
        let status = repos.entry(repo.to_string()).or_default();

        status.last_error = Some(error.into());
        status.failure_count += 1;
    }

    /// Returns the status of a repository.
    pub fn status(&self, repo: &str) -> Option<RepoStatus> {
        self.repos.read().get(repo).cloned()
    }

    /// Returns the number of consecutive failures of a repository.
    pub fn failure_count(&self, repo: &str) -> u32 {
        self.repos.read().get(repo).map_or(0, |s| s.failure_count)
    }

    /// Returns the last error of a repository.
    pub fn last_error(&self, repo: &str) -> Option<String> {
        self.repos.read().get(repo).and_then(|s| s.last_error.clone())
    }

    /// Returns true if the repository was backed up and has not failed since.
    pub fn is_healthy(&self, repo: &str) -> bool {
        self.repos
            .read()
            .get(repo)
            .is_some_and(|s| s.last_success.is_some() && s.last_error.is_none())
    }

    /// Returns the repositories whose last backup failed, sorted.
    pub fn failing(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .repos
            .read()
            .iter()
            .filter(|(_, s)| s.last_error.is_some())
            .map(|(name, _)| name.clone())
            .collect();
        names.sort();
        names
    }

    /// Returns true if a backup is due based on the given interval.
    pub fn needs_backup(&self, repo: &str, interval: Duration) -> bool {
        match self.repos.read().get(repo).and_then(|s| s.last_success) {
            Some(at) => at.elapsed() >= interval,
            None => true,
        }
    }

    /// Resets all state.
    pub fn reset(&self) {
        self.repos.write().clear();
    }
}
