#![allow(dead_code)]
use std::path::{Path, PathBuf};
use std::process::Command;

use gitbackup_core::{Settings, load_config};
use tempfile::TempDir;

/// A scratch repository with `master`, a `topic` branch and a `v1` tag.
pub struct SourceRepo {
    _dir: TempDir,
    path: PathBuf,
}

impl SourceRepo {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let path = dir.path().join("source");
        std::fs::create_dir_all(&path).expect("Failed to create repo dir");

        let repo = Self { _dir: dir, path };
        repo.git(&["init", "--quiet"]);
        repo.git(&["symbolic-ref", "HEAD", "refs/heads/master"]);
        repo.commit("one");
        repo.git(&["tag", "-a", "v1", "-m", "First release"]);
        repo.git(&["checkout", "--quiet", "-b", "topic"]);
        repo.commit("two");
        repo.git(&["checkout", "--quiet", "master"]);
        repo.git(&["update-ref", "refs/notes/extra", "HEAD"]);
        repo
    }

    pub fn url(&self) -> String {
        self.path.to_string_lossy().into_owned()
    }

    pub fn git(&self, args: &[&str]) -> String {
        run_git(&self.path, args)
    }

    fn commit(&self, content: &str) {
        std::fs::write(self.path.join("file.txt"), content).expect("Failed to write file");
        self.git(&["add", "file.txt"]);
        self.git(&["commit", "--quiet", "-m", content]);
    }
}

/// Runs git in `dir` with a clean environment and returns its trimmed stdout.
pub fn run_git(dir: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .env("GIT_CONFIG_NOSYSTEM", "1")
        .env("GIT_CONFIG_GLOBAL", "/dev/null")
        .env("GIT_AUTHOR_NAME", "Test Author")
        .env("GIT_AUTHOR_EMAIL", "author@example.com")
        .env("GIT_COMMITTER_NAME", "Test Author")
        .env("GIT_COMMITTER_EMAIL", "author@example.com")
        .output()
        .expect("Failed to run git");

    assert!(
        output.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

/// Lists `refname objectname` lines for heads and tags.
pub fn branches_and_tags(repo: &Path) -> String {
    run_git(
        repo,
        &[
            "for-each-ref",
            "--format=%(refname) %(objectname)",
            "refs/heads",
            "refs/tags",
        ],
    )
}

/// Writes `config.yml` into `dir` and loads it.
pub fn write_config(dir: &Path, yaml: &str) -> (PathBuf, Settings) {
    let path = dir.join("config.yml");
    std::fs::write(&path, yaml).expect("Failed to write config");
    let settings = load_config(&path).expect("Failed to load config");
    (path, settings)
}
