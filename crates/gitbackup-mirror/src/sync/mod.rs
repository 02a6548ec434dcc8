//! Scheduling backups of many repositories.
//!
//! This module runs [`LocalBackup`](crate::LocalBackup)s with bounded
//! parallelism, either once or periodically, and tracks their health.

mod scheduler;
mod state;

pub use scheduler::{BackupScheduler, JobFailure, RunSummary, ScheduleHandle, SchedulerConfig};
pub use state::{BackupState, RepoStatus};
