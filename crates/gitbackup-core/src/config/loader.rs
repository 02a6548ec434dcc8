//! Loading the configuration file.

use std::path::{Path, PathBuf};

use serde_yaml::Value;

use super::merge::{deep_merge, set_deep};
use super::settings::Settings;
use crate::error::{BackupError, Result};

const DEFAULT_CONFIG: &str = include_str!("default_config.yml");

/// Loads the configuration at `path`, merged over the built-in defaults.
pub fn load_config(path: &Path) -> Result<Settings> {
    load_config_with_overrides(path, &[])
}

/// Loads the configuration at `path` and applies `KEY=VALUE` overrides.
///
/// Keys use dot notation (`logging.level=debug`); values are parsed as YAML,
/// so `backup.parallelism=8` yields a number.
pub fn load_config_with_overrides(path: &Path, overrides: &[String]) -> Result<Settings> {
    let path = expand_home(path);
    let content = match std::fs::read_to_string(&path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(BackupError::ConfigNotFound { path });
        },
        Err(e) => return Err(e.into()),
    };

    let source_name = path.display().to_string();
    let mut document = parse_document(DEFAULT_CONFIG, "defaults")?;
    let user = parse_document(&content, &source_name)?;
    deep_merge(&mut document, &user);

    for raw in overrides {
        let (keys, value) = parse_override(raw)?;
        let keys: Vec<&str> = keys.iter().map(String::as_str).collect();
        set_deep(&mut document, &keys, value);
    }

    let mut settings: Settings = serde_yaml::from_value(document).map_err(|e| {
        BackupError::parse_error_with_cause(&source_name, "invalid configuration", e)
    })?;
    settings.clone_base_dir = expand_home(&settings.clone_base_dir);
    settings.validate()?;

    Ok(settings)
}

/// Parses a `KEY=VALUE` override into its key path and YAML value.
pub fn parse_override(raw: &str) -> Result<(Vec<String>, Value)> {
    let (key, value) = raw.split_once('=').ok_or_else(|| {
        BackupError::validation_error(raw, "override must have the form KEY=VALUE")
    })?;

    let keys: Vec<String> = key.trim().split('.').map(str::to_string).collect();
    if keys.iter().any(String::is_empty) {
        return Err(BackupError::validation_error(raw, "empty key segment"));
    }

    let value = serde_yaml::from_str(value)
        .map_err(|e| BackupError::parse_error_with_cause(raw, "invalid override value", e))?;

    Ok((keys, value))
}

/// Expands a leading `~` to the user's home directory.
///
/// Paths without a leading `~`, or when `HOME` is unset, are returned as is.
pub fn expand_home(path: &Path) -> PathBuf {
    let Ok(rest) = path.strip_prefix("~") else {
        return path.to_path_buf();
    };

    match std::env::var_os("HOME") {
        Some(home) => PathBuf::from(home).join(rest),
        None => path.to_path_buf(),
    }
}

fn parse_document(content: &str, source_name: &str) -> Result<Value> {
    let value: Value = serde_yaml::from_str(content)
        .map_err(|e| BackupError::parse_error_with_cause(source_name, "invalid YAML", e))?;

    match value {
        // An empty file is an empty configuration.
        Value::Null => Ok(Value::Mapping(Default::default())),
        Value::Mapping(_) => Ok(value),
        _ => Err(BackupError::parse_error(
            source_name,
            "top level must be a mapping",
        )),
    }
}
