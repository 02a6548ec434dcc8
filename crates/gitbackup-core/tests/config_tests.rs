use std::path::PathBuf;

use gitbackup_core::config::load_config_with_overrides;
use gitbackup_core::{BackupError, load_config};

mod common;

#[test]
fn test_user_values_override_defaults() {
    let (_dir, path) = common::config_file(
        r#"
clone_base_dir: /srv/backups
backup:
  parallelism: 2
sources:
  - name: local
    plain_git:
      repos:
        tool: /srv/git/tool.git
"#,
    );

    let settings = load_config(&path).unwrap();

    assert_eq!(settings.clone_base_dir, PathBuf::from("/srv/backups"));
    assert_eq!(settings.backup.parallelism, 2);
    // Preserved from the defaults
    assert_eq!(settings.backup.lock_timeout, 60);
    assert_eq!(settings.logging.level, "info");
    assert_eq!(settings.sources.len(), 1);
    assert_eq!(settings.sources[0].name, "local");
}

#[test]
fn test_overrides_apply_last() {
    let (_dir, path) = common::config_file("clone_base_dir: /srv/backups\n");

    let settings = load_config_with_overrides(
        &path,
        &[
            "logging.level=debug".to_string(),
            "backup.parallelism=16".to_string(),
        ],
    )
    .unwrap();

    assert_eq!(settings.logging.level, "debug");
    assert_eq!(settings.backup.parallelism, 16);
}

#[test]
fn test_missing_file() {
    let result = load_config(&PathBuf::from("/nonexistent/git-backup/config.yml"));

    match result {
        Err(BackupError::ConfigNotFound { path }) => {
            assert!(path.ends_with("config.yml"));
        },
        other => panic!("Expected ConfigNotFound, got {:?}", other),
    }
}

#[test]
fn test_invalid_yaml_is_a_parse_error() {
    let (_dir, path) = common::config_file("clone_base_dir: [unterminated\n");

    let err = load_config(&path).unwrap_err();
    assert!(err.is_parse_error());
}

#[test]
fn test_validation_runs_after_merge() {
    let (_dir, path) = common::config_file(
        r#"
clone_base_dir: /srv/backups
backup:
  parallelism: 0
"#,
    );

    let err = load_config(&path).unwrap_err();
    assert!(err.is_validation_error());
}
