//! Error types for repository sources.

/// Errors that can occur while building or querying a repository source.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// The HTTP request could not be made or its body not decoded.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The hosting API answered with an error status.
    #[error("{url} returned HTTP {status}: {message}")]
    Api {
        url: String,
        status: u16,
        message: String,
    },

    /// The parameters of a source are not valid for its kind.
    #[error("invalid source '{source_name}': {message}")]
    InvalidSpec {
        source_name: String,
        message: String,
    },

    /// The source names no known kind.
    #[error("source '{source_name}' has an unknown source type (expected one of {})", known.join(", "))]
    UnknownSourceType {
        source_name: String,
        known: Vec<String>,
    },

    /// The source names more than one kind.
    #[error("source '{source_name}' has multiple source types: {}", kinds.join(", "))]
    AmbiguousSourceType {
        source_name: String,
        kinds: Vec<String>,
    },
}

impl SourceError {
    /// Creates a new invalid spec error.
    pub fn invalid_spec(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidSpec {
            source_name: source_name.into(),
            message: message.into(),
        }
    }

    /// Returns true if this is a transient error that might succeed on retry.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http(e) => e.is_timeout() || e.is_connect(),
            Self::Api { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}
