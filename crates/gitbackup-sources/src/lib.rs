//! git-backup Sources - where the repositories to back up come from
//!
//! Each entry of the `sources` configuration list names one kind:
//!
//! - `plain_git`: a fixed map of names to URLs, with an optional SSH key
//! - `github`: the repositories of a GitHub account
//! - `gitlab`: the projects owned by a GitLab account
//!
//! [`from_spec`] turns an entry into a [`RepoSource`].

pub mod api;
pub mod error;
pub mod github;
pub mod gitlab;
pub mod plain;
pub mod registry;
pub mod traits;

pub use error::SourceError;
pub use github::{GithubParams, GithubSource};
pub use gitlab::{GitlabParams, GitlabSource};
pub use plain::{PlainGitParams, PlainGitSource};
pub use registry::{SourceKind, from_spec, from_specs, kind_of};
pub use traits::RepoSource;
