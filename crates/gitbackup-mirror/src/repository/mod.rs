//! Mirror repository operations.

mod config;
mod enumerate;
mod mirror;
mod update;
mod writer;

pub use config::{MirrorConfig, MirrorConfigBuilder};
pub use enumerate::enumerate;
pub use mirror::{LocalMirror, ORIGIN};
pub use update::{Divergence, DivergencePolicy, KeepDiverged, RefUpdate, ReplaceDiverged, UpdateReport};
pub use writer::MirrorWriter;
