//! Error types for the mirroring engine.

use std::path::PathBuf;

/// Errors that can occur while mirroring a remote repository.
#[derive(Debug, thiserror::Error)]
pub enum MirrorError {
    /// Connecting to the remote or negotiating with it failed.
    #[error("transport error for {url}: {reason}")]
    Transport { url: String, reason: String },

    /// Transferring objects from the remote failed.
    #[error("fetch error for {url}: {reason}")]
    Fetch { url: String, reason: String },

    /// Fetched refs whose target could not be peeled to a commit.
    #[error("cannot resolve {} refs to a commit: {}", refs.len(), refs.join(", "))]
    Resolution { refs: Vec<String> },

    /// Refs that could not be created because a local ref of a clashing
    /// name is in the way.
    #[error("cannot create {} refs blocked by existing local refs: {}", refs.len(), refs.join(", "))]
    Blocked { refs: Vec<String> },

    /// The local mirror has no `origin` remote.
    #[error("mirror at {} does not have an 'origin' remote", path.display())]
    MissingOrigin { path: PathBuf },

    /// The local mirror's `origin` points somewhere else.
    #[error("'origin' remote at {} has URL {actual} instead of {expected}", path.display())]
    OriginMismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },

    /// The mirror path derived from a repository name is not acceptable.
    #[error("invalid mirror path: {0}")]
    InvalidPath(String),

    /// Another backup holds the mirror.
    #[error("mirror at {} is locked by another backup: {reason}", path.display())]
    Locked { path: PathBuf, reason: String },

    /// A local Git operation failed.
    #[error("git error: {0}")]
    Git(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A blocking task panicked or was cancelled.
    #[error("task failed: {0}")]
    Task(String),
}

impl MirrorError {
    /// Creates a new Git error.
    pub fn git(msg: impl Into<String>) -> Self {
        Self::Git(msg.into())
    }

    /// Creates a new transport error.
    pub fn transport(url: impl Into<String>, reason: impl ToString) -> Self {
        Self::Transport {
            url: url.into(),
            reason: reason.to_string(),
        }
    }

    /// Creates a new fetch error.
    pub fn fetch(url: impl Into<String>, reason: impl ToString) -> Self {
        Self::Fetch {
            url: url.into(),
            reason: reason.to_string(),
        }
    }

    /// Returns true if this is a transient error that might succeed on retry.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Transport { .. } | Self::Fetch { .. } | Self::Locked { .. }
        )
    }
}

impl From<tokio::task::JoinError> for MirrorError {
    fn from(e: tokio::task::JoinError) -> Self {
        Self::Task(e.to_string())
    }
}
