#![allow(dead_code)]
use std::path::PathBuf;

use tempfile::TempDir;

/// Writes `content` to a `config.yml` inside a fresh temporary directory.
///
/// The directory is returned so it outlives the test body.
pub fn config_file(content: &str) -> (TempDir, PathBuf) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = dir.path().join("config.yml");
    std::fs::write(&path, content).expect("Failed to write test config");
    (dir, path)
}
