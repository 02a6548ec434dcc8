//! Mirror configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use gitbackup_core::Credentials;

use crate::refs::StagingNamespace;

/// Configuration of a single local mirror.
#[derive(Debug, Clone)]
pub struct MirrorConfig {
    /// The remote repository URL (path, SSH or HTTPS).
    url: String,

    /// Path of the bare mirror repository.
    local_path: PathBuf,

    /// Where fetched tips are staged before being applied.
    staging: StagingNamespace,

    /// How long to wait for a mirror locked by another backup.
    lock_timeout: Duration,

    /// Credentials for the remote transport.
    credentials: Credentials,
}

fn default_lock_timeout() -> Duration {
    Duration::from_secs(60)
}

impl MirrorConfig {
    /// Creates a new builder for MirrorConfig.
    pub fn builder() -> MirrorConfigBuilder {
        MirrorConfigBuilder::default()
    }

    /// Returns the remote URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Returns the mirror path.
    pub fn local_path(&self) -> &Path {
        &self.local_path
    }

    /// Returns the staging namespace.
    pub fn staging(&self) -> &StagingNamespace {
        &self.staging
    }

    /// Returns the lock timeout.
    pub fn lock_timeout(&self) -> Duration {
        self.lock_timeout
    }

    /// Returns the transport credentials.
    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }
}

/// Builder for MirrorConfig.
#[derive(Debug, Default)]
pub struct MirrorConfigBuilder {
    url: Option<String>,
    local_path: Option<PathBuf>,
    staging_prefix: Option<String>,
    lock_timeout: Option<Duration>,
    credentials: Credentials,
}

impl MirrorConfigBuilder {
    /// Sets the remote URL.
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Sets the mirror path.
    pub fn local_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.local_path = Some(path.into());
        self
    }

    /// Sets the staging namespace prefix.
    pub fn staging_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.staging_prefix = Some(prefix.into());
        self
    }

    /// Sets the lock timeout.
    pub fn lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = Some(timeout);
        self
    }

    /// Sets the transport credentials.
    pub fn credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = credentials;
        self
    }

    /// Builds the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if required fields are missing or the staging prefix
    /// would overlap the mirrored namespaces.
    pub fn build(self) -> Result<MirrorConfig, &'static str> {
        let url = self.url.ok_or("url is required")?;
        let local_path = self.local_path.ok_or("local_path is required")?;

        let staging = match self.staging_prefix {
            Some(prefix) => StagingNamespace::new(prefix),
            None => StagingNamespace::default(),
        };
        if !staging.prefix().starts_with("refs/")
            || staging.prefix().starts_with("refs/heads/")
            || staging.prefix().starts_with("refs/tags/")
        {
            return Err("staging prefix must be under refs/ and outside refs/heads/ and refs/tags/");
        }

        Ok(MirrorConfig {
            url,
            local_path,
            staging,
            lock_timeout: self.lock_timeout.unwrap_or_else(default_lock_timeout),
            credentials: self.credentials,
        })
    }
}
