//! # git-backup Mirror Engine
//!
//! Mirrors the branches and tags of remote Git repositories into local bare
//! repositories.
//!
//! A backup run has three stages:
//!
//! - **Enumerate**: ask the remote for every reference it advertises
//!   ([`enumerate`]), without transferring objects
//! - **Filter**: keep `refs/heads/*` and `refs/tags/*` only
//!   ([`RefSet::filtered`])
//! - **Write**: fetch the filtered tips into a staging namespace and apply
//!   them to the local refs ([`MirrorWriter`])
//!
//! [`LocalBackup`] runs these stages for one repository under a lock file,
//! and [`BackupScheduler`] runs many of them in parallel.
//!
//! All Git work uses gix (pure Rust); no system `git` is required.
//!
//! ## Example
//!
//! ```ignore
//! use gitbackup_core::{Credentials, GitRepo};
//! use gitbackup_mirror::LocalBackup;
//!
//! let repo = GitRepo::new("https://github.com/org/tool.git", "org/tool", "tool");
//! let backup = LocalBackup::new(repo, "/var/backups/github", Credentials::None)?;
//!
//! let report = backup.backup().await?;
//! println!("{} refs written", report.updates.writes());
//! ```

pub mod auth;
pub mod backup;
pub mod error;
pub mod lock;
pub mod refs;
pub mod repository;
pub mod sync;

// Re-exports
pub use backup::{BackupReport, LocalBackup, MirrorState, mirror_path};
pub use error::MirrorError;
pub use lock::MirrorLock;
pub use refs::{RefKind, RefSet, RemoteRef, StagingNamespace, is_mirrorable};
pub use repository::{
    Divergence, DivergencePolicy, KeepDiverged, LocalMirror, MirrorConfig, MirrorWriter,
    RefUpdate, ReplaceDiverged, UpdateReport, enumerate,
};
pub use sync::{BackupScheduler, BackupState, RunSummary, ScheduleHandle, SchedulerConfig};

// Re-export gitbackup_core for consumers
pub use gitbackup_core;
