#![allow(dead_code)]
use std::path::{Path, PathBuf};
use std::process::Command;

use gitbackup_core::{Credentials, GitRepo};
use gitbackup_mirror::LocalBackup;
use tempfile::TempDir;

/// Branches and tags of the fixture repository, as mirrored.
pub const MIRRORED_REFS: [&str; 5] = [
    "refs/heads/fork1",
    "refs/heads/fork2",
    "refs/heads/master",
    "refs/tags/initial_commit",
    "refs/tags/list_of_refs",
];

/// A scratch repository with a work tree, driven by the `git` CLI.
pub struct SourceRepo {
    _dir: TempDir,
    path: PathBuf,
}

impl SourceRepo {
    /// Creates the fixture repository:
    ///
    /// - `master` with three commits, `fork1` and `fork2` branching off it
    /// - `initial_commit` (lightweight) and `list_of_refs` (annotated) tags
    /// - `refs/sym_alias_fork1`, a symbolic ref to `fork1`
    /// - `refs/direct_README`, pointing straight at a blob
    pub fn simple() -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let path = dir.path().join("simple-git-repo");
        std::fs::create_dir_all(&path).expect("Failed to create repo dir");

        let repo = Self { _dir: dir, path };
        repo.git(&["init", "--quiet"]);
        repo.git(&["symbolic-ref", "HEAD", "refs/heads/master"]);

        repo.commit_file("README.md", "# Simple repo #\n", "Add README.md");
        repo.git(&["tag", "initial_commit"]);

        repo.git(&["checkout", "--quiet", "-b", "fork1"]);
        repo.commit_file("fork1.txt", "fork1\n", "Start fork1");

        repo.git(&["checkout", "--quiet", "master"]);
        repo.commit_file("list.txt", "heads\ntags\n", "Add list of refs");
        repo.git(&["tag", "-a", "list_of_refs", "-m", "Tag with a message"]);

        repo.git(&["checkout", "--quiet", "-b", "fork2"]);
        repo.commit_file("fork2.txt", "fork2\n", "Start fork2");

        repo.git(&["checkout", "--quiet", "master"]);
        repo.commit_file("README.md", "# Simple repo #\n\nMore text.\n", "Extend README.md");

        repo.git(&["symbolic-ref", "refs/sym_alias_fork1", "refs/heads/fork1"]);
        let blob = repo.rev("HEAD:README.md");
        repo.git(&["update-ref", "refs/direct_README", &blob]);

        repo
    }

    /// Returns the repository path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the URL to clone from.
    pub fn url(&self) -> String {
        self.path.to_string_lossy().into_owned()
    }

    /// Returns a [`GitRepo`] for this repository.
    pub fn git_repo(&self, full_name: &str) -> GitRepo {
        GitRepo::named(self.url(), full_name)
    }

    /// Runs git in the work tree and returns its trimmed stdout.
    pub fn git(&self, args: &[&str]) -> String {
        run_git(&self.path, args)
    }

    /// Resolves a revision to a full object id.
    pub fn rev(&self, rev: &str) -> String {
        self.git(&["rev-parse", rev])
    }

    /// Writes a file and commits it on the current branch.
    pub fn commit_file(&self, name: &str, content: &str, message: &str) {
        std::fs::write(self.path.join(name), content).expect("Failed to write file");
        self.git(&["add", name]);
        self.git(&["commit", "--quiet", "-m", message]);
    }

    /// Adds a commit on top of `master`.
    pub fn advance_master(&self) {
        self.git(&["checkout", "--quiet", "master"]);
        self.commit_file("README.md", "# Edited README #\n", "Replace README.md");
    }

    /// Rewrites the last commit of `master`, so that it diverges.
    pub fn rewrite_master(&self) {
        self.git(&["checkout", "--quiet", "master"]);
        std::fs::write(self.path.join("README.md"), "# Rewritten README #\n")
            .expect("Failed to write file");
        self.git(&["commit", "--quiet", "--amend", "-am", "Rewrite README.md"]);
    }
}

/// Runs git in `dir` with a fixed identity and no global configuration.
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

/// Lists the refs of a mirror below `prefix` as `(name, target)` pairs.
pub fn mirror_refs(mirror: &Path, prefix: &str) -> Vec<(String, String)> {
    let out = run_git(
        mirror,
        &["for-each-ref", "--format=%(refname) %(objectname)", prefix],
    );
    out.lines()
        .filter_map(|line| line.split_once(' '))
        .map(|(name, target)| (name.to_string(), target.to_string()))
        .collect()
}

/// Returns the names of the refs of a mirror below `prefix`.
pub fn mirror_ref_names(mirror: &Path, prefix: &str) -> Vec<String> {
    mirror_refs(mirror, prefix)
        .into_iter()
        .map(|(name, _)| name)
        .collect()
}

/// Creates a backup of `source` below a fresh base directory.
pub fn backup_of(source: &SourceRepo) -> (TempDir, LocalBackup) {
    let base = TempDir::new().expect("Failed to create temp dir");
    let backup = LocalBackup::new(
        source.git_repo("simple-repo"),
        base.path().join("local_backups"),
        Credentials::None,
    )
    .expect("Failed to create backup");
    (base, backup)
}
