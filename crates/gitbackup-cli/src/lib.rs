//! git-backup command line tool
//!
//! Loads the configuration, lists the repositories of every source and
//! mirrors them with [`gitbackup_mirror::BackupScheduler`], either once or
//! every `--interval` seconds.

pub mod cli;
pub mod logging;
pub mod run;

pub use cli::Args;
pub use run::{Outcome, SetupFailure, collect_jobs, run, run_periodically};
