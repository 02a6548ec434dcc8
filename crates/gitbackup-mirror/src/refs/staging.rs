//! The namespace fetched tips land in before being applied.

/// Default prefix for staged references.
pub const DEFAULT_STAGING_PREFIX: &str = "refs/git-backup/origin/";

/// Maps mirrored reference names into a private staging namespace.
///
/// `refs/heads/master` is fetched into `refs/git-backup/origin/heads/master`
/// and only then copied onto `refs/heads/master`, so a fetch can never move a
/// local ref by itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagingNamespace {
    prefix: String,
}

impl StagingNamespace {
    /// Creates a namespace; a missing trailing `/` is added.
    pub fn new(prefix: impl Into<String>) -> Self {
        let mut prefix = prefix.into();
        if !prefix.ends_with('/') {
            prefix.push('/');
        }
        Self { prefix }
    }

    /// Returns the prefix, always ending in `/`.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Returns the staged name of a full reference name under `refs/`.
    pub fn stage(&self, full_name: &str) -> Option<String> {
        full_name
            .strip_prefix("refs/")
            .map(|rest| format!("{}{}", self.prefix, rest))
    }

    /// Maps a staged name back to the reference it stands for.
    pub fn unstage(&self, staged_name: &str) -> Option<String> {
        staged_name
            .strip_prefix(&self.prefix)
            .map(|rest| format!("refs/{}", rest))
    }

    /// Returns true if `name` lies inside the namespace.
    pub fn contains(&self, name: &str) -> bool {
        name.starts_with(&self.prefix)
    }

    /// Returns a forced fetch refspec from `full_name` into the namespace.
    pub fn refspec(&self, full_name: &str) -> Option<String> {
        self.stage(full_name)
            .map(|staged| format!("+{}:{}", full_name, staged))
    }
}

impl Default for StagingNamespace {
    fn default() -> Self {
        Self::new(DEFAULT_STAGING_PREFIX)
    }
}
