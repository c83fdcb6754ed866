//! OPML validator.
//!
//! A document is valid when it parses, its root is `<opml>`, it has direct
//! `<head>` and `<body>` children, and at least one `<outline type="rss">`
//! sits somewhere under `<body>`.

use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument};

use feedbundle_opml::{Document, ROOT_TAG};
use feedbundle_shared::{FeedBundleError, Result, StructureError};

/// Result of validating one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationOutcome {
    /// The file that was checked.
    pub path: PathBuf,
    /// Whether every check passed.
    pub is_valid: bool,
    /// Why validation failed; empty when valid.
    pub reason: String,
    /// Feed entries under `<body>`; zero when invalid.
    pub feed_count: usize,
}

impl ValidationOutcome {
    /// File name for display, falling back to the full path.
    pub fn display_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

/// Validate the document at `path`, never failing: errors become the reason.
pub fn validate(path: &Path) -> ValidationOutcome {
    match validate_document(path) {
        Ok(feed_count) => {
            info!(path = %path.display(), feed_count, "valid OPML");
            ValidationOutcome {
                path: path.to_path_buf(),
                is_valid: true,
                reason: String::new(),
                feed_count,
            }
        }
        Err(e) => {
            debug!(path = %path.display(), error = %e, "invalid OPML");
            ValidationOutcome {
                path: path.to_path_buf(),
                is_valid: false,
                reason: e.to_string(),
                feed_count: 0,
            }
        }
    }
}

/// Validate the document at `path` and return its feed count.
///
/// Malformed markup is a parse error, shape problems are
/// [`StructureError`]s, and anything else (unreadable file, ...) is reported
/// as [`FeedBundleError::Unexpected`].
#[instrument(skip_all, fields(path = %path.display()))]
pub fn validate_document(path: &Path) -> Result<usize> {
    let doc = Document::from_path(path).map_err(|e| match e {
        FeedBundleError::Parse { .. } => e,
        other => FeedBundleError::unexpected(other.to_string()),
    })?;

    check_structure(&doc)
}

/// Structural checks on an already parsed document.
pub fn check_structure(doc: &Document) -> Result<usize> {
    if doc.root.name != ROOT_TAG {
        return Err(StructureError::WrongRoot {
            found: doc.root.name.clone(),
        }
        .into());
    }

    if doc.head().is_none() {
        return Err(StructureError::MissingHead.into());
    }

    let body = doc.body().ok_or(StructureError::MissingBody)?;

    match body.feed_count() {
        0 => Err(StructureError::NoFeeds.into()),
        n => Ok(n),
    }
}
