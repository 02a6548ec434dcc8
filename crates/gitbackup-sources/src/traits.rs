//! Repository source trait definition.

use async_trait::async_trait;
use gitbackup_core::{Credentials, GitRepo};

use crate::error::SourceError;

/// A place that lists repositories to back up.
///
/// # Implementors
///
/// - `PlainGitSource` - a fixed list of URLs from the configuration
/// - `GithubSource` - repositories of a GitHub account
/// - `GitlabSource` - projects owned by a GitLab account
#[async_trait]
pub trait RepoSource: Send + Sync {
    /// Lists the repositories of this source.
    ///
    /// # Errors
    ///
    /// - `SourceError::Http` if the hosting API cannot be reached
    /// - `SourceError::Api` if it rejects the request
    async fn list_repos(&self) -> Result<Vec<GitRepo>, SourceError>;

    /// Returns the credentials to use for the repositories of this source.
    ///
    /// The default implementation relies on the environment.
    async fn credentials(&self) -> Result<Credentials, SourceError> {
        Ok(Credentials::None)
    }

    /// Returns the kind tag used in the configuration (`plain_git`, ...).
    fn kind(&self) -> &'static str;

    /// Returns the configured name of this source.
    fn name(&self) -> &str;
}
