//! Outcomes of applying staged tips to local refs.

use serde::Serialize;
use tracing::{info, warn};

use crate::error::MirrorError;

/// What happened to one local ref during an update.
///
/// Object ids are rendered as full hex strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum RefUpdate {
    /// The ref did not exist locally and was created.
    Created { name: String, target: String },

    /// The ref already had the remote's target.
    Unchanged { name: String },

    /// The ref moved forward to a descendant.
    FastForward {
        name: String,
        from: String,
        to: String,
    },

    /// The ref diverged; the old target was kept under `backup`.
    Replaced {
        name: String,
        from: String,
        to: String,
        backup: String,
    },

    /// The ref diverged and the policy kept the local target.
    Skipped {
        name: String,
        local: String,
        remote: String,
    },

    /// The staged tip could not be peeled to a commit; nothing was written.
    Unresolved { name: String, reason: String },

    /// No staged tip exists for the ref.
    Missing { name: String },

    /// The ref does not exist locally and `by`, a local ref whose name is
    /// a path prefix of it or lies below it, prevents creating it.
    Blocked { name: String, by: String },
}

impl RefUpdate {
    /// Returns the full name of the local ref.
    pub fn name(&self) -> &str {
        match self {
            Self::Created { name, .. }
            | Self::Unchanged { name }
            | Self::FastForward { name, .. }
            | Self::Replaced { name, .. }
            | Self::Skipped { name, .. }
            | Self::Unresolved { name, .. }
            | Self::Missing { name }
            | Self::Blocked { name, .. } => name,
        }
    }

    /// Returns true if the update wrote to the repository.
    pub fn is_write(&self) -> bool {
        matches!(
            self,
            Self::Created { .. } | Self::FastForward { .. } | Self::Replaced { .. }
        )
    }
}

/// The per-ref outcomes of one update pass, in update order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UpdateReport {
    updates: Vec<RefUpdate>,
}

impl UpdateReport {
    /// Creates an empty report.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an outcome.
    pub fn push(&mut self, update: RefUpdate) {
        self.updates.push(update);
    }

    /// Returns all outcomes.
    pub fn updates(&self) -> &[RefUpdate] {
        &self.updates
    }

    /// Returns the outcome for a ref.
    pub fn get(&self, name: &str) -> Option<&RefUpdate> {
        self.updates.iter().find(|u| u.name() == name)
    }

    /// Returns the number of refs written.
    pub fn writes(&self) -> usize {
        self.updates.iter().filter(|u| u.is_write()).count()
    }

    /// Returns true if nothing was written.
    pub fn is_noop(&self) -> bool {
        self.writes() == 0
    }

    /// Returns the names of refs that could not be resolved.
    pub fn unresolved(&self) -> Vec<String> {
        self.updates
            .iter()
            .filter(|u| matches!(u, RefUpdate::Unresolved { .. }))
            .map(|u| u.name().to_string())
            .collect()
    }

    /// Returns the names of refs blocked by a clashing local ref.
    pub fn blocked(&self) -> Vec<String> {
        self.updates
            .iter()
            .filter(|u| matches!(u, RefUpdate::Blocked { .. }))
            .map(|u| u.name().to_string())
            .collect()
    }

    /// Fails with [`MirrorError::Resolution`] if any ref was unresolved,
    /// else with [`MirrorError::Blocked`] if any ref was blocked.
    pub fn ensure_resolved(&self) -> Result<(), MirrorError> {
        let refs = self.unresolved();
        if !refs.is_empty() {
            return Err(MirrorError::Resolution { refs });
        }

        let refs = self.blocked();
        if !refs.is_empty() {
            return Err(MirrorError::Blocked { refs });
        }
        Ok(())
    }
}

/// A local ref whose target is not an ancestor of the remote's.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Divergence {
    /// Full name of the local ref.
    pub name: String,
    /// Current local target.
    pub local: String,
    /// Target the remote advertises.
    pub remote: String,
    /// Name the local target would be preserved under.
    pub backup_name: String,
}

/// Decides whether a diverged ref is replaced by the remote's target.
///
/// Returning `true` preserves the local target under the backup name and
/// moves the ref; `false` leaves the ref alone. Any
/// `Fn(&Divergence) -> bool` closure is a policy.
pub trait DivergencePolicy: Send + Sync {
    /// Returns true to replace the local ref.
    fn accept(&self, divergence: &Divergence) -> bool;
}

impl<F> DivergencePolicy for F
where
    F: Fn(&Divergence) -> bool + Send + Sync,
{
    fn accept(&self, divergence: &Divergence) -> bool {
        self(divergence)
    }
}

/// Replaces diverged refs, keeping a backup ref. The default.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReplaceDiverged;

impl DivergencePolicy for ReplaceDiverged {
    fn accept(&self, divergence: &Divergence) -> bool {
        warn!(
            "Replacing {} ({}) with {}, old target kept as {}",
            divergence.name, divergence.local, divergence.remote, divergence.backup_name
        );
        true
    }
}

/// Never touches diverged refs.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeepDiverged;

impl DivergencePolicy for KeepDiverged {
    fn accept(&self, divergence: &Divergence) -> bool {
        info!("Keeping diverged {} at {}", divergence.name, divergence.local);
        false
    }
}
