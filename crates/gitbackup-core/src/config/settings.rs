//! Typed configuration.

use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{BackupError, Result};

/// The complete git-backup configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Directory under which every source gets its own subdirectory of mirrors.
    pub clone_base_dir: PathBuf,

    /// Repository sources to back up.
    #[serde(default)]
    pub sources: Vec<SourceSpec>,

    /// Backup engine tuning.
    #[serde(default)]
    pub backup: BackupSettings,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingSettings,
}

impl Settings {
    /// Checks invariants serde cannot express.
    pub fn validate(&self) -> Result<()> {
        if self.clone_base_dir.as_os_str().is_empty() {
            return Err(BackupError::validation_error(
                "clone_base_dir",
                "cannot be empty",
            ));
        }

        if self.backup.parallelism == 0 {
            return Err(BackupError::validation_error(
                "backup.parallelism",
                "must be at least 1",
            ));
        }

        let mut seen = HashSet::new();
        for source in &self.sources {
            source.validate()?;
            if !seen.insert(source.name.as_str()) {
                return Err(BackupError::validation_error(
                    "sources.name",
                    format!("duplicate source name '{}'", source.name),
                ));
            }
        }

        Ok(())
    }

    /// Returns the directory holding the mirrors of the named source.
    pub fn source_dir(&self, source_name: &str) -> PathBuf {
        self.clone_base_dir.join(source_name)
    }
}

/// One entry of the `sources` list.
///
/// Besides `name`, the mapping must contain exactly one key naming the source
/// kind (`plain_git`, `github`, ...); its value holds the kind's parameters.
/// The kind is resolved by the sources crate, so the remaining keys are kept
/// untyped here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceSpec {
    /// Label of the source, also the name of its subdirectory.
    pub name: String,

    /// Everything else in the mapping.
    #[serde(flatten)]
    pub params: serde_yaml::Mapping,
}

impl SourceSpec {
    /// Creates a spec with a single kind key.
    pub fn new(name: impl Into<String>, kind: &str, args: serde_yaml::Value) -> Self {
        let mut params = serde_yaml::Mapping::new();
        params.insert(kind.into(), args);
        Self {
            name: name.into(),
            params,
        }
    }

    /// Returns the keys of the mapping other than `name`.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.params.keys().filter_map(serde_yaml::Value::as_str)
    }

    fn validate(&self) -> Result<()> {
        let name = self.name.as_str();
        if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
            return Err(BackupError::validation_error(
                "sources.name",
                format!("'{}' is not usable as a directory name", name),
            ));
        }
        Ok(())
    }
}

/// Tuning of the backup engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupSettings {
    /// Maximum number of repositories backed up concurrently.
    #[serde(default = "default_parallelism")]
    pub parallelism: usize,

    /// How long to wait for another process holding a mirror, in seconds.
    #[serde(default = "default_lock_timeout")]
    pub lock_timeout: u64,
}

fn default_parallelism() -> usize {
    4
}

fn default_lock_timeout() -> u64 {
    60
}

impl BackupSettings {
    /// Returns the lock timeout as a duration.
    pub fn lock_timeout(&self) -> Duration {
        Duration::from_secs(self.lock_timeout)
    }
}

impl Default for BackupSettings {
    fn default() -> Self {
        Self {
            parallelism: default_parallelism(),
            lock_timeout: default_lock_timeout(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Base level for git-backup's own targets (`error` .. `trace`).
    #[serde(default = "default_level")]
    pub level: String,

    /// A complete filter directive; takes precedence over `level`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
}

fn default_level() -> String {
    "info".to_string()
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_level(),
            filter: None,
        }
    }
}
