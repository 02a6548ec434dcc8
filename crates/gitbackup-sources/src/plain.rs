//! Plain Git URLs listed in the configuration.

use std::path::PathBuf;

use async_trait::async_trait;
use gitbackup_core::config::expand_home;
use gitbackup_core::{Credentials, GitRepo};
use indexmap::IndexMap;
use serde::Deserialize;

use crate::error::SourceError;
use crate::traits::RepoSource;

/// Parameters of a `plain_git` source.
///
/// ```yaml
/// plain_git:
///   repos:
///     dotfiles: git@example.com:me/dotfiles.git
///     notes: https://example.com/me/notes.git
///   key_path: ~/.ssh/backup_ed25519
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlainGitParams {
    /// Repository name to URL, in configuration order.
    pub repos: IndexMap<String, String>,

    /// SSH private key for all repositories.
    #[serde(default)]
    pub key_path: Option<PathBuf>,
}

/// A fixed list of repositories.
#[derive(Debug, Clone)]
pub struct PlainGitSource {
    name: String,
    params: PlainGitParams,
}

impl PlainGitSource {
    /// Creates a source from its parameters.
    pub fn new(name: impl Into<String>, params: PlainGitParams) -> Self {
        Self {
            name: name.into(),
            params,
        }
    }
}

#[async_trait]
impl RepoSource for PlainGitSource {
    async fn list_repos(&self) -> Result<Vec<GitRepo>, SourceError> {
        Ok(self
            .params
            .repos
            .iter()
            .map(|(name, url)| GitRepo::named(url, name))
            .collect())
    }

    async fn credentials(&self) -> Result<Credentials, SourceError> {
        Ok(match &self.params.key_path {
            Some(path) => Credentials::ssh_key(expand_home(path)),
            None => Credentials::None,
        })
    }

    fn kind(&self) -> &'static str {
        "plain_git"
    }

    fn name(&self) -> &str {
        &self.name
    }
}
