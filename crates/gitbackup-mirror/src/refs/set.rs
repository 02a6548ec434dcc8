//! Partitioned reference sets.

use std::collections::BTreeMap;

use super::{RefKind, RemoteRef};

/// A set of remote references partitioned into `heads`, `tags` and `other`.
///
/// Each partition is keyed and iterated by full reference name, so anything
/// derived from a set (refspecs, update order, reports) is deterministic.
/// Inserting a name twice keeps the last reference.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefSet {
    heads: BTreeMap<String, RemoteRef>,
    tags: BTreeMap<String, RemoteRef>,
    other: BTreeMap<String, RemoteRef>,
}

impl RefSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a reference to the partition matching its name.
    pub fn insert(&mut self, remote_ref: RemoteRef) {
        let partition = match remote_ref.kind() {
            RefKind::Branch => &mut self.heads,
            RefKind::Tag => &mut self.tags,
            RefKind::Other => &mut self.other,
        };
        partition.insert(remote_ref.name().to_string(), remote_ref);
    }

    /// Returns the branch references.
    pub fn heads(&self) -> impl Iterator<Item = &RemoteRef> {
        self.heads.values()
    }

    /// Returns the tag references.
    pub fn tags(&self) -> impl Iterator<Item = &RemoteRef> {
        self.tags.values()
    }

    /// Returns the references outside `refs/heads/` and `refs/tags/`.
    pub fn other(&self) -> impl Iterator<Item = &RemoteRef> {
        self.other.values()
    }

    /// Returns branches then tags; never the `other` partition.
    pub fn mirrorable(&self) -> impl Iterator<Item = &RemoteRef> {
        self.heads().chain(self.tags())
    }

    /// Looks up a reference by full name in any partition.
    pub fn get(&self, name: &str) -> Option<&RemoteRef> {
        self.heads
            .get(name)
            .or_else(|| self.tags.get(name))
            .or_else(|| self.other.get(name))
    }

    /// Returns the total number of references.
    pub fn len(&self) -> usize {
        self.heads.len() + self.tags.len() + self.other.len()
    }

    /// Returns true if the set holds no references.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The ref filter: a copy holding only `refs/heads/*` and `refs/tags/*`.
    ///
    /// Pure and infallible; the result's `other` partition is always empty.
    pub fn filtered(&self) -> RefSet {
        RefSet {
            heads: self.heads.clone(),
            tags: self.tags.clone(),
            other: BTreeMap::new(),
        }
    }

    /// Returns the names the filter drops.
    pub fn discarded_names(&self) -> Vec<String> {
        self.other.keys().cloned().collect()
    }
}

impl FromIterator<RemoteRef> for RefSet {
    fn from_iter<I: IntoIterator<Item = RemoteRef>>(iter: I) -> Self {
        let mut set = RefSet::new();
        for r in iter {
            set.insert(r);
        }
        set
    }
}

impl Extend<RemoteRef> for RefSet {
    fn extend<I: IntoIterator<Item = RemoteRef>>(&mut self, iter: I) {
        for r in iter {
            self.insert(r);
        }
    }
}
