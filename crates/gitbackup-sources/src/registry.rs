//! Building sources from configuration entries.

use std::fmt;

use gitbackup_core::SourceSpec;
use serde::de::DeserializeOwned;

use crate::error::SourceError;
use crate::github::GithubSource;
use crate::gitlab::GitlabSource;
use crate::plain::PlainGitSource;
use crate::traits::RepoSource;

/// The kinds of source a configuration entry can name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    PlainGit,
    Github,
    Gitlab,
}

impl SourceKind {
    /// All kinds, in lookup order.
    pub const ALL: [SourceKind; 3] = [Self::PlainGit, Self::Github, Self::Gitlab];

    /// Returns the configuration key of this kind.
    pub fn tag(self) -> &'static str {
        match self {
            Self::PlainGit => "plain_git",
            Self::Github => "github",
            Self::Gitlab => "gitlab",
        }
    }

    /// Looks up a kind by configuration key.
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.tag() == tag)
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Returns the kind named by `spec`.
///
/// Exactly one key of the entry, besides `name`, must be a known kind.
pub fn kind_of(spec: &SourceSpec) -> Result<SourceKind, SourceError> {
    let kinds: Vec<SourceKind> = spec.keys().filter_map(SourceKind::from_tag).collect();

    match kinds.as_slice() {
        [kind] => Ok(*kind),
        [] => Err(SourceError::UnknownSourceType {
            source_name: spec.name.clone(),
            known: SourceKind::ALL.iter().map(|k| k.tag().to_string()).collect(),
        }),
        _ => Err(SourceError::AmbiguousSourceType {
            source_name: spec.name.clone(),
            kinds: kinds.iter().map(|k| k.tag().to_string()).collect(),
        }),
    }
}

/// Builds the source described by a configuration entry.
pub fn from_spec(spec: &SourceSpec) -> Result<Box<dyn RepoSource>, SourceError> {
    let kind = kind_of(spec)?;
    let name = spec.name.as_str();

    let source: Box<dyn RepoSource> = match kind {
        SourceKind::PlainGit => Box::new(PlainGitSource::new(name, params(spec, kind)?)),
        SourceKind::Github => Box::new(GithubSource::new(name, params(spec, kind)?)?),
        SourceKind::Gitlab => Box::new(GitlabSource::new(name, params(spec, kind)?)?),
    };
    Ok(source)
}

/// Builds every source, failing on the first invalid entry.
pub fn from_specs(specs: &[SourceSpec]) -> Result<Vec<Box<dyn RepoSource>>, SourceError> {
    specs.iter().map(from_spec).collect()
}

fn params<T: DeserializeOwned>(spec: &SourceSpec, kind: SourceKind) -> Result<T, SourceError> {
    let value = spec
        .params
        .get(kind.tag())
        .cloned()
        .unwrap_or(serde_yaml::Value::Null);

    serde_yaml::from_value(value).map_err(|e| SourceError::invalid_spec(&spec.name, format!("{}: {}", kind, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_yaml::Value;

    fn spec(yaml: &str) -> SourceSpec {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_kind_tags() {
        for kind in SourceKind::ALL {
            assert_eq!(SourceKind::from_tag(kind.tag()), Some(kind));
        }
        assert_eq!(SourceKind::from_tag("bitbucket"), None);
        assert_eq!(SourceKind::Github.to_string(), "github");
    }

    #[test]
    fn test_plain_git_from_spec() {
        let source = from_spec(&spec(
            r#"
name: mine
plain_git:
  repos:
    tool: /srv/git/tool.git
"#,
        ))
        .unwrap();

        assert_eq!(source.kind(), "plain_git");
        assert_eq!(source.name(), "mine");
    }

    #[test]
    fn test_github_from_spec() {
        let source = from_spec(&SourceSpec::new(
            "hub",
            "github",
            serde_yaml::from_str("token: ghp_x").unwrap(),
        ))
        .unwrap();
        assert_eq!(source.kind(), "github");
    }

    #[test]
    fn test_gitlab_from_spec() {
        let source = from_spec(&spec("name: lab\ngitlab:\n  token: glpat-x\n  url: https://git.example.com")).unwrap();
        assert_eq!(source.kind(), "gitlab");
    }

    #[test]
    fn test_unknown_source_type() {
        let err = from_spec(&spec("name: mine\nbitbucket: {token: x}")).err().unwrap();
        assert!(matches!(err, SourceError::UnknownSourceType { .. }), "{err}");

        let err = kind_of(&spec("name: empty")).unwrap_err();
        assert!(matches!(err, SourceError::UnknownSourceType { .. }), "{err}");
    }

    #[test]
    fn test_ambiguous_source_type() {
        let err = kind_of(&spec(
            "name: mine\ngithub: {token: x}\ngitlab: {token: y}",
        ))
        .unwrap_err();

        match err {
            SourceError::AmbiguousSourceType { source_name, kinds } => {
                assert_eq!(source_name, "mine");
                assert_eq!(kinds.len(), 2);
            },
            other => panic!("unexpected {other}"),
        }
    }

    #[test]
    fn test_invalid_params() {
        let err = from_spec(&SourceSpec::new("hub", "github", Value::Null))
            .err()
            .unwrap();
        assert!(matches!(err, SourceError::InvalidSpec { .. }), "{err}");

        let err = from_spec(&spec("name: mine\nplain_git: {repos: {}, typo: 1}"))
            .err()
            .unwrap();
        assert!(matches!(err, SourceError::InvalidSpec { .. }), "{err}");
    }

    #[test]
    fn test_from_specs() {
        let specs = vec![
            spec("name: a\nplain_git: {repos: {}}"),
            spec("name: b\ngithub: {token: x}"),
        ];
        let sources = from_specs(&specs).unwrap();
        assert_eq!(
            sources.iter().map(|s| s.name()).collect::<Vec<_>>(),
            vec!["a", "b"]
        );
    }
}
