//! Backing up one remote repository into its local mirror.

use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use gitbackup_core::{Credentials, GitRepo};
use parking_lot::RwLock;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::MirrorError;
use crate::lock::MirrorLock;
use crate::refs::RefSet;
use crate::repository::{
    DivergencePolicy, LocalMirror, MirrorConfig, MirrorWriter, ReplaceDiverged, UpdateReport,
    enumerate,
};

/// State of a mirror within this process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MirrorState {
    /// No mirror exists on disk yet.
    NotCloned,
    /// The mirror exists and is idle.
    Ready,
    /// A backup is running.
    Updating,
    /// The last operation failed.
    Error(String),
}

/// The result of one successful backup run.
#[derive(Debug, Clone, Serialize)]
pub struct BackupReport {
    /// Full name of the backed up repository.
    pub repo: String,
    /// Path of the mirror.
    pub path: PathBuf,
    /// True if the mirror was created by this run.
    pub created: bool,
    /// True if the remote sent new objects.
    pub received_pack: bool,
    /// Advertised refs dropped by the filter.
    pub discarded: Vec<String>,
    /// What happened to each mirrored ref.
    pub updates: UpdateReport,
}

/// Keeps a local mirror of one remote repository up to date.
pub struct LocalBackup {
    repo: GitRepo,
    config: MirrorConfig,
    state: Arc<RwLock<MirrorState>>,
}

impl LocalBackup {
    /// Creates a backup of `repo` under `base_dir`.
    ///
    /// The mirror lives at `base_dir/<full_name>.git`; names that are
    /// empty, absolute or contain `.`/`..` components are rejected.
    pub fn new(
        repo: GitRepo,
        base_dir: impl AsRef<Path>,
        credentials: Credentials,
    ) -> Result<Self, MirrorError> {
        let local_path = mirror_path(base_dir.as_ref(), repo.full_name())?;
        let config = MirrorConfig::builder()
            .url(repo.url())
            .local_path(local_path)
            .credentials(credentials)
            .build()
            .map_err(|e| MirrorError::InvalidConfig(e.to_string()))?;

        Ok(Self::with_config(repo, config))
    }

    /// Creates a backup with an explicit mirror configuration.
    pub fn with_config(repo: GitRepo, config: MirrorConfig) -> Self {
        let state = if config.local_path().exists() {
            MirrorState::Ready
        } else {
            MirrorState::NotCloned
        };

        Self {
            repo,
            config,
            state: Arc::new(RwLock::new(state)),
        }
    }

    /// Returns the repository being backed up.
    pub fn repo(&self) -> &GitRepo {
        &self.repo
    }

    /// Returns the mirror configuration.
    pub fn config(&self) -> &MirrorConfig {
        &self.config
    }

    /// Returns the mirror path.
    pub fn path(&self) -> &Path {
        self.config.local_path()
    }

    /// Returns the current state.
    pub fn state(&self) -> MirrorState {
        self.state.read().clone()
    }

    /// Creates the mirror if needed and checks its `origin` remote.
    ///
    /// Returns true if the mirror was created.
    pub async fn clone_mirror(&self) -> Result<bool, MirrorError> {
        let mirror = LocalMirror::new(&self.config);
        self.run_blocking(move || mirror.open_or_init().map(|(_, created)| created))
            .await
    }

    /// Lists the references the remote advertises, unfiltered.
    pub async fn enumerate(&self) -> Result<RefSet, MirrorError> {
        let mirror = LocalMirror::new(&self.config);
        let url = self.config.url().to_string();
        self.run_blocking(move || enumerate(&mirror.open()?, &url))
            .await
    }

    /// Fetches `filtered` into the staging namespace.
    pub async fn fetch(&self, filtered: RefSet) -> Result<bool, MirrorError> {
        let mirror = LocalMirror::new(&self.config);
        let staging = self.config.staging().clone();
        self.run_blocking(move || MirrorWriter::new(&mirror.open()?, &staging).fetch(&filtered))
            .await
    }

    /// Applies staged tips of `filtered` to the local refs.
    ///
    /// Fails with [`MirrorError::Resolution`] if any ref could not be
    /// resolved, after the other refs have been updated.
    pub async fn update_refs(
        &self,
        filtered: RefSet,
        policy: Arc<dyn DivergencePolicy>,
    ) -> Result<UpdateReport, MirrorError> {
        let mirror = LocalMirror::new(&self.config);
        let staging = self.config.staging().clone();
        self.run_blocking(move || {
            let report =
                MirrorWriter::new(&mirror.open()?, &staging).update_refs(&filtered, &*policy)?;
            report.ensure_resolved()?;
            Ok(report)
        })
        .await
    }

    /// Returns the mirrored branches and tags with their targets.
    pub async fn local_refs(&self) -> Result<BTreeMap<String, String>, MirrorError> {
        let mirror = LocalMirror::new(&self.config);
        self.run_blocking(move || LocalMirror::local_refs(&mirror.open()?))
            .await
    }

    /// Runs a full backup, replacing diverged refs.
    pub async fn backup(&self) -> Result<BackupReport, MirrorError> {
        self.backup_with(Arc::new(ReplaceDiverged)).await
    }

    /// Runs a full backup under the mirror lock: clone, enumerate, filter,
    /// fetch and update.
    pub async fn backup_with(
        &self,
        policy: Arc<dyn DivergencePolicy>,
    ) -> Result<BackupReport, MirrorError> {
        {
            let mut state = self.state.write();
            if *state == MirrorState::Updating {
                return Err(MirrorError::Locked {
                    path: self.path().to_path_buf(),
                    reason: "a backup is already running in this process".to_string(),
                });
            }
            *state = MirrorState::Updating;
        }

        info!("Backing up {} into {:?}", self.repo, self.path());

        let repo_name = self.repo.full_name().to_string();
        let config = self.config.clone();
        let result = tokio::task::spawn_blocking(move || {
            Self::backup_blocking(repo_name, &config, &*policy)
        })
        .await
        .map_err(MirrorError::from)
        .and_then(|r| r);

        let mut state = self.state.write();
        match &result {
            Ok(report) => {
                *state = MirrorState::Ready;
                info!(
                    "Backed up {}: {} refs written",
                    self.repo,
                    report.updates.writes()
                );
            },
            Err(e) => {
                *state = if self.path().exists() {
                    MirrorState::Error(e.to_string())
                } else {
                    MirrorState::NotCloned
                };
                warn!("Backup of {} failed: {}", self.repo, e);
            },
        }
        result
    }

    fn backup_blocking(
        repo_name: String,
        config: &MirrorConfig,
        policy: &dyn DivergencePolicy,
    ) -> Result<BackupReport, MirrorError> {
        let _lock = MirrorLock::acquire(config.local_path(), config.lock_timeout())?;

        let mirror = LocalMirror::new(config);
        let (repo, created) = mirror.open_or_init()?;

        let advertised = enumerate(&repo, config.url())?;
        let filtered = advertised.filtered();
        let discarded = advertised.discarded_names();
        if !discarded.is_empty() {
            debug!("Ignoring {} refs outside heads and tags", discarded.len());
        }

        let writer = MirrorWriter::new(&repo, config.staging());
        let received_pack = writer.fetch(&filtered)?;
        let updates = writer.update_refs(&filtered, policy)?;
        updates.ensure_resolved()?;

        Ok(BackupReport {
            repo: repo_name,
            path: config.local_path().to_path_buf(),
            created,
            received_pack,
            discarded,
            updates,
        })
    }

    /// Runs `f` on the blocking pool, tracking the mirror state.
    async fn run_blocking<T, F>(&self, f: F) -> Result<T, MirrorError>
    where
        T: Send + 'static,
        F: FnOnce() -> Result<T, MirrorError> + Send + 'static,
    {
        let result = tokio::task::spawn_blocking(f).await?;
        if result.is_ok() && self.path().exists() {
            let mut state = self.state.write();
            if *state == MirrorState::NotCloned {
                *state = MirrorState::Ready;
            }
        }
        result
    }
}

impl std::fmt::Debug for LocalBackup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalBackup")
            .field("repo", &self.repo.full_name())
            .field("url", &self.config.url())
            .field("path", &self.config.local_path())
            .field("state", &self.state())
            .finish()
    }
}

/// Returns `base_dir/<full_name>.git`, rejecting names that escape `base_dir`.
pub fn mirror_path(base_dir: &Path, full_name: &str) -> Result<PathBuf, MirrorError> {
    let relative = Path::new(full_name);
    let valid = !full_name.is_empty()
        && relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)));

    if !valid {
        return Err(MirrorError::InvalidPath(format!(
            "repository name {:?} must be a relative path without '.' or '..'",
            full_name
        )));
    }

    Ok(base_dir.join(format!("{}.git", full_name)))
}
