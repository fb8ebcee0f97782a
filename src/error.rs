//! Custom error types for rustcitewatch.
//!
//! All fallible operations return `Result<T, CiteError>`. Callers that need to react
//! differently per failure class (an invalid id vs. a transient upstream failure) match
//! on [`CiteError::kind`] instead of the concrete variant.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for rustcitewatch operations.
#[derive(Debug, Error)]
pub enum CiteError {
    /// Malformed paper identifier or other bad input
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Record or tracked paper does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Network/HTTP transport error
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Literature API returned a non-success status
    #[error("API error: {code} - {message}")]
    Api {
        /// HTTP status code
        code: u16,
        /// Error message from API
        message: String,
    },

    /// Literature API response could not be decoded
    #[error("Parse error: {0}")]
    Parse(String),

    /// Persisted state could not be read, written or decoded
    #[error("Storage error at {path:?}: {message}")]
    Storage {
        /// File that failed
        path: PathBuf,
        /// What went wrong
        message: String,
    },

    /// Configuration error
    #[error("Config error: {0}")]
    Config(String),
}

/// Coarse classification of [`CiteError`] used for user-facing reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidArgument,
    NotFound,
    Upstream,
    Network,
    Storage,
    Config,
}

impl CiteError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Network(_) => ErrorKind::Network,
            Self::Api { .. } | Self::Parse(_) => ErrorKind::Upstream,
            Self::Storage { .. } => ErrorKind::Storage,
            Self::Config(_) => ErrorKind::Config,
        }
    }

    pub(crate) fn storage(path: impl Into<PathBuf>, message: impl std::fmt::Display) -> Self {
        Self::Storage {
            path: path.into(),
            message: message.to_string(),
        }
    }
}

/// Result type alias using `CiteError`
pub type Result<T> = std::result::Result<T, CiteError>;

/// Extension trait for adding context to Option types
pub trait OptionExt<T> {
    /// Convert Option to Result with a parse error message
    fn ok_or_parse(self, msg: &str) -> Result<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_parse(self, msg: &str) -> Result<T> {
        self.ok_or_else(|| CiteError::Parse(msg.to_string()))
    }
}
