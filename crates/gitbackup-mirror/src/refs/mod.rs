//! Remote references and the ref filter.
//!
//! Only `refs/heads/*` and `refs/tags/*` are ever mirrored; everything else a
//! remote advertises (notes, stashes, pull request heads, custom refs) lands
//! in the `other` partition of a [`RefSet`] and is dropped by
//! [`RefSet::filtered`].

mod remote_ref;
mod set;
mod staging;

pub use remote_ref::{RefKind, RemoteRef, is_mirrorable};
pub use set::RefSet;
pub use staging::StagingNamespace;
