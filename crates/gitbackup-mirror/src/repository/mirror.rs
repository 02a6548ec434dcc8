//! Opening and initializing bare mirrors.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use gix::bstr::ByteSlice;
use gix::remote::Direction;
use tracing::{debug, info};

use super::MirrorConfig;
use crate::auth;
use crate::error::MirrorError;
use crate::refs::is_mirrorable;

/// Name of the remote every mirror fetches from.
pub const ORIGIN: &str = "origin";

/// A bare repository on disk holding the backup of one remote.
///
/// All methods block; callers on an async runtime go through
/// [`LocalBackup`](crate::LocalBackup).
#[derive(Debug, Clone)]
pub struct LocalMirror {
    path: PathBuf,
    url: String,
    staging_prefix: String,
    overrides: Vec<String>,
}

impl LocalMirror {
    /// Creates a handle for the mirror described by `config`.
    pub fn new(config: &MirrorConfig) -> Self {
        Self {
            path: config.local_path().to_path_buf(),
            url: config.url().to_string(),
            staging_prefix: config.staging().prefix().to_string(),
            overrides: auth::config_overrides(config.credentials(), config.url()),
        }
    }

    /// Returns the mirror path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns true if something already exists at the mirror path.
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Opens the mirror, creating it first if the path does not exist.
    ///
    /// Returns the repository and whether it was created. An existing mirror
    /// must have an `origin` remote whose URL is the configured one.
    pub fn open_or_init(&self) -> Result<(gix::Repository, bool), MirrorError> {
        if self.exists() {
            let repo = self.open()?;
            self.verify_origin(&repo)?;
            debug!("Mirror already present at {:?}", self.path);
            Ok((repo, false))
        } else {
            self.init()?;
            info!("Created mirror of {} at {:?}", self.url, self.path);
            Ok((self.open()?, true))
        }
    }

    /// Opens the existing mirror with transport overrides applied.
    pub fn open(&self) -> Result<gix::Repository, MirrorError> {
        let options = gix::open::Options::default()
            .config_overrides(self.overrides.iter().map(String::as_str));

        gix::open_opts(&self.path, options)
            .map_err(|e| MirrorError::git(format!("Failed to open mirror {:?}: {}", self.path, e)))
    }

    /// Creates an empty bare repository with an `origin` remote.
    fn init(&self) -> Result<(), MirrorError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let repo = gix::init_bare(&self.path)
            .map_err(|e| MirrorError::git(format!("Failed to init mirror: {}", e)))?;

        let heads = format!("+refs/heads/*:{}heads/*", self.staging_prefix);
        let tags = format!("+refs/tags/*:{}tags/*", self.staging_prefix);
        let mut remote = repo
            .remote_at(self.url.as_str())
            .map_err(|e| MirrorError::InvalidConfig(format!("Invalid URL {}: {}", self.url, e)))?
            .with_refspecs([heads.as_str(), tags.as_str()], Direction::Fetch)
            .map_err(|e| MirrorError::git(format!("Invalid refspec: {}", e)))?
            .with_fetch_tags(gix::remote::fetch::Tags::None);

        let config_path = repo.path().join("config");
        let mut config = gix::config::File::from_path_no_includes(
            config_path.clone(),
            gix::config::Source::Local,
        )
        .map_err(|e| MirrorError::git(format!("Failed to read mirror config: {}", e)))?;

        remote
            .save_as_to(ORIGIN, &mut config)
            .map_err(|e| MirrorError::git(format!("Failed to add origin remote: {}", e)))?;

        let mut file = std::fs::File::create(&config_path)?;
        config.write_to(&mut file)?;

        Ok(())
    }

    /// Checks that `origin` exists and points at the configured URL.
    pub fn verify_origin(&self, repo: &gix::Repository) -> Result<(), MirrorError> {
        let remote = match repo.try_find_remote(ORIGIN) {
            Some(remote) => remote
                .map_err(|e| MirrorError::git(format!("Failed to read origin remote: {}", e)))?,
            None => {
                return Err(MirrorError::MissingOrigin {
                    path: self.path.clone(),
                });
            },
        };

        let expected = gix::url::parse(self.url.as_str().into())
            .map_err(|e| MirrorError::InvalidConfig(format!("Invalid URL {}: {}", self.url, e)))?;

        match remote.url(Direction::Fetch) {
            Some(actual) if *actual == expected => Ok(()),
            actual => Err(MirrorError::OriginMismatch {
                path: self.path.clone(),
                expected: self.url.clone(),
                actual: actual
                    .map(|url| url.to_bstring().to_string())
                    .unwrap_or_default(),
            }),
        }
    }

    /// Returns every reference in the mirror, staged ones included, mapped
    /// to its target (`ref: <name>` for symbolic refs).
    pub fn snapshot(repo: &gix::Repository) -> Result<BTreeMap<String, String>, MirrorError> {
        let platform = repo
            .references()
            .map_err(|e| MirrorError::git(format!("Failed to list references: {}", e)))?;
        let all = platform
            .all()
            .map_err(|e| MirrorError::git(format!("Failed to list references: {}", e)))?;

        let mut refs = BTreeMap::new();
        for reference in all {
            let reference =
                reference.map_err(|e| MirrorError::git(format!("Failed to read reference: {}", e)))?;
            let name = reference.name().as_bstr().to_str_lossy().into_owned();
            refs.insert(name, describe_target(&reference.inner.target));
        }
        Ok(refs)
    }

    /// Returns the mirrored branches and tags only.
    pub fn local_refs(repo: &gix::Repository) -> Result<BTreeMap<String, String>, MirrorError> {
        let mut refs = Self::snapshot(repo)?;
        refs.retain(|name, _| is_mirrorable(name));
        Ok(refs)
    }
}

/// Renders a reference target for reports and logs.
pub(crate) fn describe_target(target: &gix::refs::Target) -> String {
    match target {
        gix::refs::Target::Object(id) => id.to_string(),
        gix::refs::Target::Symbolic(name) => format!("ref: {}", name.as_bstr()),
    }
}
