//! Exclusive access to a mirror across processes.

use std::path::{Path, PathBuf};
use std::time::Duration;

use gix::lock::acquire::Fail;
use tracing::debug;

use crate::error::MirrorError;

/// A held lock on a mirror, released on drop.
///
/// The lock is the file `<mirror path>.lock` next to the mirror, created
/// exclusively. A lock left behind by a crashed process has to be removed
/// by hand.
pub struct MirrorLock {
    _marker: gix::lock::Marker,
    mirror_path: PathBuf,
}

impl MirrorLock {
    /// Acquires the lock for `mirror_path`, retrying with backoff for up to
    /// `timeout`. A zero timeout tries once.
    pub fn acquire(mirror_path: &Path, timeout: Duration) -> Result<Self, MirrorError> {
        if let Some(parent) = mirror_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mode = if timeout.is_zero() {
            Fail::Immediately
        } else {
            Fail::AfterDurationWithBackoff(timeout)
        };

        let marker = gix::lock::Marker::acquire_to_hold_resource(mirror_path, mode, None)
            .map_err(|e| MirrorError::Locked {
                path: mirror_path.to_path_buf(),
                reason: e.to_string(),
            })?;

        debug!("Locked mirror {:?}", mirror_path);
        Ok(Self {
            _marker: marker,
            mirror_path: mirror_path.to_path_buf(),
        })
    }

    /// Returns the path of the locked mirror.
    pub fn mirror_path(&self) -> &Path {
        &self.mirror_path
    }
}

impl std::fmt::Debug for MirrorLock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MirrorLock")
            .field("mirror_path", &self.mirror_path)
            .finish()
    }
}

impl Drop for MirrorLock {
    fn drop(&mut self) {
        debug!("Unlocked mirror {:?}", self.mirror_path);
    }
}
