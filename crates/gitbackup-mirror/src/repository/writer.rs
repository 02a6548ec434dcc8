//! Fetching into the staging namespace and applying staged tips.

use std::collections::{BTreeMap, HashSet};

use gix::ObjectId;
use gix::refs::Target;
use gix::refs::transaction::{Change, LogChange, PreviousValue, RefEdit, RefLog};
use gix::remote::Direction;
use tracing::{debug, info, warn};

use super::mirror::{LocalMirror, ORIGIN, describe_target};
use super::update::{Divergence, DivergencePolicy, RefUpdate, UpdateReport};
use crate::error::MirrorError;
use crate::refs::{RefSet, StagingNamespace};

/// Writes fetched state into a mirror.
///
/// Fetched tips are first stored under the staging namespace; only
/// [`update_refs`](Self::update_refs) moves `refs/heads/*` and
/// `refs/tags/*`. Every ref write is a compare-and-swap against the value
/// read just before, so a concurrent writer makes the update fail rather
/// than be overwritten.
pub struct MirrorWriter<'repo> {
    repo: &'repo gix::Repository,
    staging: &'repo StagingNamespace,
}

impl<'repo> MirrorWriter<'repo> {
    /// Creates a writer for `repo`.
    pub fn new(repo: &'repo gix::Repository, staging: &'repo StagingNamespace) -> Self {
        Self { repo, staging }
    }

    /// Fetches every ref of `filtered` from `origin` into the staging
    /// namespace, along with the objects they need.
    ///
    /// Only the listed refs are requested and tags are not auto-followed.
    /// Staged refs the remote no longer advertises are deleted first.
    /// Returns whether a pack was received. An empty set fetches nothing.
    pub fn fetch(&self, filtered: &RefSet) -> Result<bool, MirrorError> {
        self.prune_staging(filtered)?;

        let specs: Vec<String> = filtered
            .mirrorable()
            .filter_map(|r| self.staging.refspec(r.name()))
            .collect();

        if specs.is_empty() {
            debug!("Nothing to fetch");
            return Ok(false);
        }

        let mut remote = self
            .repo
            .find_remote(ORIGIN)
            .map_err(|e| MirrorError::git(format!("Failed to find origin remote: {}", e)))?;
        let url = remote
            .url(Direction::Fetch)
            .map(|url| url.to_bstring().to_string())
            .unwrap_or_default();

        remote
            .replace_refspecs(specs.iter().map(String::as_str), Direction::Fetch)
            .map_err(|e| MirrorError::git(format!("Invalid refspec: {}", e)))?;
        let remote = remote.with_fetch_tags(gix::remote::fetch::Tags::None);

        let outcome = remote
            .connect(Direction::Fetch)
            .map_err(|e| MirrorError::transport(url.as_str(), e))?
            .prepare_fetch(gix::progress::Discard, Default::default())
            .map_err(|e| MirrorError::transport(url.as_str(), e))?
            .receive(gix::progress::Discard, &gix::interrupt::IS_INTERRUPTED)
            .map_err(|e| MirrorError::fetch(url.as_str(), e))?;

        let received =
            !matches!(outcome.status, gix::remote::fetch::Status::NoPackReceived { .. });
        debug!(
            "Fetched {} refs from {} (pack received: {})",
            specs.len(),
            url,
            received
        );
        Ok(received)
    }

    /// Applies the staged tip of every ref in `filtered` to the local ref of
    /// the same name.
    ///
    /// Refs are processed independently, branches before tags. A ref whose
    /// staged tip is not a commit is reported as unresolved and left as it
    /// was; the caller decides whether that fails the run (see
    /// [`UpdateReport::ensure_resolved`]). Errors from the repository itself
    /// abort the pass.
    pub fn update_refs(
        &self,
        filtered: &RefSet,
        policy: &dyn DivergencePolicy,
    ) -> Result<UpdateReport, MirrorError> {
        let existing = LocalMirror::local_refs(self.repo)?;
        let mut report = UpdateReport::new();
        for remote_ref in filtered.mirrorable() {
            report.push(self.update_ref(remote_ref.name(), &existing, policy)?);
        }
        Ok(report)
    }

    /// Deletes staged refs that are not in `filtered`.
    ///
    /// A stale staged `heads/x` would keep `heads/x/y` from ever being
    /// fetched.
    pub fn prune_staging(&self, filtered: &RefSet) -> Result<usize, MirrorError> {
        let wanted: HashSet<String> = filtered
            .mirrorable()
            .filter_map(|r| self.staging.stage(r.name()))
            .collect();

        let edits = LocalMirror::snapshot(self.repo)?
            .into_keys()
            .filter(|name| self.staging.contains(name) && !wanted.contains(name))
            .map(|name| {
                Ok(RefEdit {
                    change: Change::Delete {
                        expected: PreviousValue::Any,
                        log: RefLog::AndReference,
                    },
                    name: name.as_str().try_into().map_err(|e| {
                        MirrorError::git(format!("Invalid ref name {}: {}", name, e))
                    })?,
                    deref: false,
                })
            })
            .collect::<Result<Vec<_>, MirrorError>>()?;

        if edits.is_empty() {
            return Ok(0);
        }

        let pruned = edits.len();
        self.repo
            .edit_references(edits)
            .map_err(|e| MirrorError::git(format!("Failed to prune staged refs: {}", e)))?;
        debug!("Pruned {} stale staged refs", pruned);
        Ok(pruned)
    }

    fn update_ref(
        &self,
        name: &str,
        existing: &BTreeMap<String, String>,
        policy: &dyn DivergencePolicy,
    ) -> Result<RefUpdate, MirrorError> {
        let missing = || RefUpdate::Missing {
            name: name.to_string(),
        };

        if !existing.contains_key(name)
            && let Some(by) = clashing_ref(existing, name)
        {
            warn!("Cannot create {}: local ref {} is in the way", name, by);
            return Ok(RefUpdate::Blocked {
                name: name.to_string(),
                by: by.to_string(),
            });
        }

        let Some(staged_name) = self.staging.stage(name) else {
            return Ok(missing());
        };
        let Some(staged) = self.find(&staged_name)? else {
            debug!("No staged tip for {}", name);
            return Ok(missing());
        };
        let Some(remote_id) = staged.inner.target.try_id().map(ToOwned::to_owned) else {
            return Ok(RefUpdate::Unresolved {
                name: name.to_string(),
                reason: format!("{} is symbolic", staged_name),
            });
        };

        let remote_commit = match self.peel_to_commit(remote_id) {
            Ok(id) => id,
            Err(reason) => {
                warn!("Cannot resolve {}: {}", name, reason);
                return Ok(RefUpdate::Unresolved {
                    name: name.to_string(),
                    reason,
                });
            },
        };

        let Some(local) = self.find(name)? else {
            self.write_ref(
                name,
                Target::Object(remote_id),
                PreviousValue::MustNotExist,
                format!("git-backup: created from {}", staged_name),
            )?;
            info!("Created {} at {}", name, remote_id);
            return Ok(RefUpdate::Created {
                name: name.to_string(),
                target: remote_id.to_string(),
            });
        };

        let local_target = local.inner.target.clone();
        if let Target::Object(local_id) = &local_target {
            let local_id = *local_id;
            if local_id == remote_id {
                return Ok(RefUpdate::Unchanged {
                    name: name.to_string(),
                });
            }
            if let Ok(local_commit) = self.peel_to_commit(local_id)
                && self.is_ancestor(local_commit, remote_commit)?
            {
                self.write_ref(
                    name,
                    Target::Object(remote_id),
                    PreviousValue::MustExistAndMatch(local_target.clone()),
                    format!("git-backup: fast-forward from {}", staged_name),
                )?;
                info!("Fast-forwarded {} from {} to {}", name, local_id, remote_id);
                return Ok(RefUpdate::FastForward {
                    name: name.to_string(),
                    from: local_id.to_string(),
                    to: remote_id.to_string(),
                });
            }
        }

        let divergence = Divergence {
            name: name.to_string(),
            local: describe_target(&local_target),
            remote: remote_id.to_string(),
            backup_name: self.backup_ref_name(name)?,
        };
        debug!(
            "Remote ref {} ({}) has diverged from local ({})",
            name, divergence.remote, divergence.local
        );

        if !policy.accept(&divergence) {
            info!("Skipping diverged {}", name);
            return Ok(RefUpdate::Skipped {
                name: divergence.name,
                local: divergence.local,
                remote: divergence.remote,
            });
        }

        self.write_ref(
            &divergence.backup_name,
            local_target.clone(),
            PreviousValue::MustNotExist,
            format!("git-backup: saved {} before replacing it", name),
        )?;
        self.write_ref(
            name,
            Target::Object(remote_id),
            PreviousValue::MustExistAndMatch(local_target),
            format!("git-backup: replaced from {}", staged_name),
        )?;
        info!(
            "Replaced {}, previous target kept as {}",
            name, divergence.backup_name
        );

        Ok(RefUpdate::Replaced {
            name: divergence.name,
            from: divergence.local,
            to: divergence.remote,
            backup: divergence.backup_name,
        })
    }

    /// Returns `<name>_replaced_<UTC timestamp>`, suffixed with `_1`, `_2`,
    /// ... until no ref of that name exists.
    fn backup_ref_name(&self, name: &str) -> Result<String, MirrorError> {
        let stamp = chrono::Utc::now().format("%Y-%m-%d_%H-%M-%S");
        let base = format!("{}_replaced_{}", name, stamp);

        let mut candidate = base.clone();
        let mut n = 0;
        while self.find(&candidate)?.is_some() {
            n += 1;
            candidate = format!("{}_{}", base, n);
        }
        Ok(candidate)
    }

    /// Peels `id` through any tags; fails unless a commit is reached.
    fn peel_to_commit(&self, id: ObjectId) -> Result<ObjectId, String> {
        let object = self
            .repo
            .find_object(id)
            .map_err(|e| format!("object {} not found: {}", id, e))?;
        let peeled = object
            .peel_tags_to_end()
            .map_err(|e| format!("cannot peel {}: {}", id, e))?;

        if peeled.kind == gix::object::Kind::Commit {
            Ok(peeled.id)
        } else {
            Err(format!("{} points to a {}", id, peeled.kind))
        }
    }

    /// Returns true if `ancestor` is reachable from `descendant`.
    fn is_ancestor(&self, ancestor: ObjectId, descendant: ObjectId) -> Result<bool, MirrorError> {
        if ancestor == descendant {
            return Ok(true);
        }

        let walk = self
            .repo
            .rev_walk([descendant])
            .all()
            .map_err(|e| MirrorError::git(format!("Failed to walk history: {}", e)))?;

        for info in walk {
            let info = info.map_err(|e| MirrorError::git(format!("Failed to walk history: {}", e)))?;
            if info.id == ancestor {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn find(&self, name: &str) -> Result<Option<gix::Reference<'repo>>, MirrorError> {
        self.repo
            .try_find_reference(name)
            .map_err(|e| MirrorError::git(format!("Failed to look up {}: {}", name, e)))
    }

    fn write_ref(
        &self,
        name: &str,
        new: Target,
        expected: PreviousValue,
        message: String,
    ) -> Result<(), MirrorError> {
        let edit = RefEdit {
            change: Change::Update {
                log: LogChange {
                    mode: RefLog::AndReference,
                    force_create_reflog: false,
                    message: message.into(),
                },
                expected,
                new,
            },
            name: name
                .try_into()
                .map_err(|e| MirrorError::git(format!("Invalid ref name {}: {}", name, e)))?,
            deref: false,
        };

        self.repo
            .edit_reference(edit)
            .map_err(|e| MirrorError::git(format!("Failed to update {}: {}", name, e)))?;
        Ok(())
    }
}

/// Returns a ref of `existing` that cannot coexist with `name`: one whose
/// name is a directory of `name`, or one inside the directory `name` would
/// need to be.
fn clashing_ref<'a>(existing: &'a BTreeMap<String, String>, name: &str) -> Option<&'a str> {
    let below = format!("{}/", name);
    existing
        .keys()
        .map(String::as_str)
        .find(|other| {
            other.starts_with(&below)
                || name
                    .strip_prefix(other)
                    .is_some_and(|rest| rest.starts_with('/'))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn refs(names: &[&str]) -> BTreeMap<String, String> {
        names
            .iter()
            .map(|name| (name.to_string(), "a".repeat(40)))
            .collect()
    }

    #[test]
    fn test_clashing_ref() {
        let existing = refs(&["refs/heads/fork1", "refs/heads/topic/a", "refs/tags/v1"]);

        assert_eq!(
            clashing_ref(&existing, "refs/heads/fork1/sub"),
            Some("refs/heads/fork1")
        );
        assert_eq!(
            clashing_ref(&existing, "refs/heads/topic"),
            Some("refs/heads/topic/a")
        );
        assert_eq!(clashing_ref(&existing, "refs/heads/fork10"), None);
        assert_eq!(clashing_ref(&existing, "refs/heads/topic/b"), None);
        assert_eq!(clashing_ref(&existing, "refs/tags/v1.1"), None);
    }
}
