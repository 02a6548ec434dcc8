//! Error types for git-backup configuration handling.
//!
//! Functions that can fail return `Result<T, BackupError>`. Errors raised by
//! the mirroring engine and by repository sources live in their own crates;
//! this enum covers everything that happens before a backup starts.
//!
//! # Example
//!
//! ```
//! use gitbackup_core::{BackupError, Result};
//!
//! fn check_name(name: &str) -> Result<()> {
//!     if name.is_empty() {
//!         return Err(BackupError::validation_error("sources.name", "cannot be empty"));
//!     }
//!     Ok(())
//! }
//!
//! assert!(check_name("").unwrap_err().is_validation_error());
//! ```

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for git-backup configuration.
#[derive(Debug, Error)]
pub enum BackupError {
    /// The configuration file does not exist.
    #[error("configuration file not found: {}", path.display())]
    ConfigNotFound {
        /// Path that was looked up
        path: PathBuf,
    },

    /// Error parsing configuration content.
    #[error("failed to parse configuration from '{source_name}': {message}")]
    ParseError {
        /// Source of the configuration (filename, `defaults`, ...)
        source_name: String,
        /// Description of the parse error
        message: String,
        /// Underlying error, if any
        #[source]
        cause: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A configuration value is present but not acceptable.
    #[error("validation error for field '{field}': {message}")]
    ValidationError {
        /// Field that failed validation
        field: String,
        /// Description of the validation failure
        message: String,
    },

    /// I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl BackupError {
    /// Creates a ParseError without a cause.
    pub fn parse_error(source: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ParseError {
            source_name: source.into(),
            message: message.into(),
            cause: None,
        }
    }

    /// Creates a ParseError with a cause.
    pub fn parse_error_with_cause<E>(
        source: impl Into<String>,
        message: impl Into<String>,
        cause: E,
    ) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::ParseError {
            source_name: source.into(),
            message: message.into(),
            cause: Some(Box::new(cause)),
        }
    }

    /// Creates a ValidationError.
    pub fn validation_error(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ValidationError {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Returns true if this is a validation error.
    pub fn is_validation_error(&self) -> bool {
        matches!(self, Self::ValidationError { .. })
    }

    /// Returns true if this is a parse error.
    pub fn is_parse_error(&self) -> bool {
        matches!(self, Self::ParseError { .. })
    }

    /// Returns true if the configuration file was missing.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::ConfigNotFound { .. })
    }
}

/// Type alias for Results with BackupError.
pub type Result<T> = std::result::Result<T, BackupError>;
