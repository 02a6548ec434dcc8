//! Configuration file handling.
//!
//! The configuration is a YAML document merged over built-in defaults
//! (`default_config.yml`) and then deserialized into [`Settings`].

mod loader;
mod merge;
mod settings;

pub use loader::{expand_home, load_config, load_config_with_overrides, parse_override};
pub use merge::{deep_merge, get_deep, set_deep};
pub use settings::{BackupSettings, LoggingSettings, Settings, SourceSpec};
