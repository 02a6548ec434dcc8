//! Listing the references a remote advertises.

use gix::protocol::handshake::Ref;
use gix::remote::Direction;
use tracing::debug;

use crate::error::MirrorError;
use crate::refs::{RefSet, RemoteRef};

/// Asks the remote at `url` for all of its references.
///
/// Only the handshake and ref listing take place: no objects are
/// transferred and `repo` is not modified. Unborn refs are left out.
pub fn enumerate(repo: &gix::Repository, url: &str) -> Result<RefSet, MirrorError> {
    let remote = repo
        .remote_at(url)
        .map_err(|e| MirrorError::InvalidConfig(format!("Invalid URL {}: {}", url, e)))?
        .with_refspecs(["+refs/*:refs/*"], Direction::Fetch)
        .map_err(|e| MirrorError::git(format!("Invalid refspec: {}", e)))?;

    let prepare = remote
        .connect(Direction::Fetch)
        .map_err(|e| MirrorError::transport(url, e))?
        .prepare_fetch(
            gix::progress::Discard,
            gix::remote::ref_map::Options {
                prefix_from_spec_as_filter_on_remote: false,
                ..Default::default()
            },
        )
        .map_err(|e| MirrorError::transport(url, e))?;

    let refs: RefSet = prepare
        .ref_map()
        .remote_refs
        .iter()
        .filter_map(to_remote_ref)
        .collect();

    debug!("Remote {} advertised {} refs", url, refs.len());
    Ok(refs)
}

fn to_remote_ref(advertised: &Ref) -> Option<RemoteRef> {
    match advertised {
        Ref::Direct {
            full_ref_name,
            object,
        } => Some(RemoteRef::new(full_ref_name.to_string(), *object)),
        Ref::Peeled {
            full_ref_name,
            tag,
            object,
        } => Some(RemoteRef::peeled(full_ref_name.to_string(), *tag, *object)),
        Ref::Symbolic {
            full_ref_name,
            object,
            ..
        } => Some(RemoteRef::new(full_ref_name.to_string(), *object)),
        Ref::Unborn { .. } => None,
    }
}
