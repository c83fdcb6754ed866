//! Error types for feedbundle.
//!
//! Library crates use [`FeedBundleError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all feedbundle operations.
#[derive(Debug, thiserror::Error)]
pub enum FeedBundleError {
    /// Markup is not well-formed XML.
    #[error("XML parsing error: {message}")]
    Parse { message: String },

    /// Well-formed document that does not have the OPML shape.
    #[error(transparent)]
    Structure(#[from] StructureError),

    /// Project config or bundle specification unreadable or malformed.
    #[error("config error: {message}")]
    Config { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Writing a document back out as XML failed.
    #[error("serialization error: {0}")]
    Serialize(String),

    /// Anything not covered above.
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

/// Structural problems found in a well-formed document.
///
/// The display text doubles as the validation reason, so it is kept short.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StructureError {
    #[error("wrong root element: found <{found}>, expected <opml>")]
    WrongRoot { found: String },

    #[error("missing head")]
    MissingHead,

    #[error("missing body")]
    MissingBody,

    #[error("no feeds found")]
    NoFeeds,
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, FeedBundleError>;

impl FeedBundleError {
    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
            message: msg.into(),
        }
    }

    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a catch-all error from any displayable message.
    pub fn unexpected(msg: impl Into<String>) -> Self {
        Self::Unexpected(msg.into())
    }
}
