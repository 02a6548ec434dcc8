//! A single advertised reference.

use std::fmt;

use gix::ObjectId;

const HEADS_PREFIX: &str = "refs/heads/";
const TAGS_PREFIX: &str = "refs/tags/";

/// The namespace a full reference name belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RefKind {
    /// `refs/heads/*`
    Branch,
    /// `refs/tags/*`
    Tag,
    /// Anything else, including `HEAD`.
    Other,
}

impl RefKind {
    /// Classifies a full reference name.
    pub fn of(full_name: &str) -> Self {
        if full_name.starts_with(HEADS_PREFIX) {
            Self::Branch
        } else if full_name.starts_with(TAGS_PREFIX) {
            Self::Tag
        } else {
            Self::Other
        }
    }

    /// Returns true if refs of this kind are mirrored.
    pub fn is_mirrorable(self) -> bool {
        !matches!(self, Self::Other)
    }
}

/// Returns true if the full reference name is under `refs/heads/` or `refs/tags/`.
pub fn is_mirrorable(full_name: &str) -> bool {
    RefKind::of(full_name).is_mirrorable()
}

/// A reference as advertised by a remote.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RemoteRef {
    name: String,
    target: ObjectId,
    peeled: Option<ObjectId>,
}

impl RemoteRef {
    /// Creates a reference pointing directly at `target`.
    pub fn new(name: impl Into<String>, target: ObjectId) -> Self {
        Self {
            name: name.into(),
            target,
            peeled: None,
        }
    }

    /// Creates an annotated tag reference: `target` is the tag object,
    /// `peeled` the object it ultimately points at.
    pub fn peeled(name: impl Into<String>, target: ObjectId, peeled: ObjectId) -> Self {
        Self {
            name: name.into(),
            target,
            peeled: Some(peeled),
        }
    }

    /// Returns the full reference name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the object the reference points at.
    pub fn target(&self) -> ObjectId {
        self.target
    }

    /// Returns the peeled object, if the remote advertised one.
    pub fn peeled_target(&self) -> Option<ObjectId> {
        self.peeled
    }

    /// Returns the namespace of this reference.
    pub fn kind(&self) -> RefKind {
        RefKind::of(&self.name)
    }

    /// Returns the name without its namespace prefix (`master` for
    /// `refs/heads/master`); other refs are returned unchanged.
    pub fn short_name(&self) -> &str {
        self.name
            .strip_prefix(HEADS_PREFIX)
            .or_else(|| self.name.strip_prefix(TAGS_PREFIX))
            .unwrap_or(&self.name)
    }
}

impl fmt::Display for RemoteRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.target.to_hex_with_len(8), self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn oid(byte: u8) -> ObjectId {
        ObjectId::from_bytes_or_panic(&[byte; 20])
    }

    #[test]
    fn test_kind_of() {
        assert_eq!(RefKind::of("refs/heads/main"), RefKind::Branch);
        assert_eq!(RefKind::of("refs/heads/feature/test"), RefKind::Branch);
        assert_eq!(RefKind::of("refs/tags/v1.0.0"), RefKind::Tag);
        assert_eq!(RefKind::of("HEAD"), RefKind::Other);
        assert_eq!(RefKind::of("refs/notes/commits"), RefKind::Other);
        assert_eq!(RefKind::of("refs/stash"), RefKind::Other);
        assert_eq!(RefKind::of("refs/pull/1/head"), RefKind::Other);
        assert_eq!(RefKind::of("refs/direct_README"), RefKind::Other);
    }

    #[test]
    fn test_prefix_must_be_exact() {
        assert!(!is_mirrorable("refs/headsx/main"));
        assert!(!is_mirrorable("refs/tagsv1"));
        assert!(!is_mirrorable("refs/remotes/origin/heads/main"));
        assert!(!is_mirrorable("heads/main"));
        assert!(is_mirrorable("refs/heads/main"));
        assert!(is_mirrorable("refs/tags/list_of_refs"));
    }

    #[test]
    fn test_short_name() {
        assert_eq!(RemoteRef::new("refs/heads/fork1", oid(1)).short_name(), "fork1");
        assert_eq!(RemoteRef::new("refs/tags/v1", oid(1)).short_name(), "v1");
        assert_eq!(RemoteRef::new("HEAD", oid(1)).short_name(), "HEAD");
    }

    #[test]
    fn test_peeled() {
        let tag = RemoteRef::peeled("refs/tags/v1", oid(1), oid(2));
        assert_eq!(tag.target(), oid(1));
        assert_eq!(tag.peeled_target(), Some(oid(2)));
        assert_eq!(tag.kind(), RefKind::Tag);

        let branch = RemoteRef::new("refs/heads/main", oid(3));
        assert_eq!(branch.peeled_target(), None);
    }

    #[test]
    fn test_display() {
        let r = RemoteRef::new("refs/heads/main", oid(0xab));
        assert_eq!(r.to_string(), "abababab refs/heads/main");
    }
}
