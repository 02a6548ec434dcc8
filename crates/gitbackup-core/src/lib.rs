//! git-backup Core - Domain types and configuration
//!
//! This crate provides the foundational types shared by the mirroring engine,
//! the repository sources and the command line tool:
//!
//! - [`GitRepo`]: a remote repository to back up
//! - [`Credentials`]: how to authenticate against its transport
//! - [`Settings`]: the configuration file, merged over built-in defaults
//! - [`BackupError`]: the error type for configuration handling

pub mod config;
pub mod error;
pub mod types;

pub use config::{
    BackupSettings, LoggingSettings, Settings, SourceSpec, deep_merge, get_deep, load_config,
    load_config_with_overrides, set_deep,
};
pub use error::{BackupError, Result};
pub use types::{Credentials, GitRepo};
