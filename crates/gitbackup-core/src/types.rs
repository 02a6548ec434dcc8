//! Common type definitions for git-backup.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// A remote repository to back up.
///
/// `full_name` identifies the repository inside its source (for example
/// `owner/project`) and decides where the local mirror lives; `name` is the
/// short display name.
///
/// # Example
///
/// ```
/// use gitbackup_core::GitRepo;
///
/// let repo = GitRepo::new("https://github.com/org/tool.git", "org/tool", "tool");
/// assert_eq!(repo.full_name(), "org/tool");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GitRepo {
    url: String,
    full_name: String,
    name: String,
}

impl GitRepo {
    /// Creates a new repository description.
    pub fn new(url: impl Into<String>, full_name: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            full_name: full_name.into(),
            name: name.into(),
        }
    }

    /// Creates a repository whose full name and short name are the same.
    pub fn named(url: impl Into<String>, name: impl Into<String>) -> Self {
        let name = name.into();
        Self::new(url, name.clone(), name)
    }

    /// Returns the transport URL (local path, SSH or HTTPS).
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Returns the full name, unique within a source.
    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    /// Returns the short name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for GitRepo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.full_name)
    }
}

/// How to authenticate against a repository transport.
#[derive(Clone, PartialEq, Eq, Default)]
pub enum Credentials {
    /// Use whatever the environment provides (ssh-agent, credential helpers).
    #[default]
    None,

    /// Use a specific SSH private key.
    SshKey {
        /// Path to the private key.
        private_key: PathBuf,
    },

    /// Use a username and token over HTTPS for a single host.
    Token {
        /// Host the token is valid for (e.g. `github.com`).
        host: String,
        /// Username sent with the token.
        username: String,
        /// The secret token.
        token: String,
    },
}

impl Credentials {
    /// Creates token credentials.
    pub fn token(
        host: impl Into<String>,
        username: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        Self::Token {
            host: host.into(),
            username: username.into(),
            token: token.into(),
        }
    }

    /// Creates SSH key credentials.
    pub fn ssh_key(private_key: impl Into<PathBuf>) -> Self {
        Self::SshKey {
            private_key: private_key.into(),
        }
    }

    /// Returns true if no explicit credentials are configured.
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::SshKey { private_key } => f
                .debug_struct("SshKey")
                .field("private_key", private_key)
                .finish(),
            Self::Token { host, username, .. } => f
                .debug_struct("Token")
                .field("host", host)
                .field("username", username)
                .field("token", &"<redacted>")
                .finish(),
        }
    }
}
