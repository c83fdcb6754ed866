//! Input discovery: which documents to validate and which bundles to build.
//!
//! Input documents live at the repository root (`*.opml.xml`); bundle
//! specifications live in the bundles directory (`*.yaml`). Matching is
//! non-recursive and results are sorted so runs are reproducible.

use std::path::{Path, PathBuf};

use feedbundle_shared::{FeedBundleError, Result};
use tracing::{debug, info, instrument, warn};

// ---------------------------------------------------------------------------
// DiscoveryResult
// ---------------------------------------------------------------------------

/// Outcome of scanning a directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscoveryResult {
    /// The directory exists; these files matched (possibly none).
    Found(Vec<PathBuf>),
    /// The directory itself does not exist.
    MissingDirectory(PathBuf),
}

impl DiscoveryResult {
    /// Matched files, or an empty slice when the directory is missing.
    pub fn files(&self) -> &[PathBuf] {
        match self {
            Self::Found(files) => files,
            Self::MissingDirectory(_) => &[],
        }
    }
}

// ---------------------------------------------------------------------------
// Main entry points
// ---------------------------------------------------------------------------

/// Find input documents matching `pattern` directly inside `root`.
pub fn discover_documents(root: &Path, pattern: &str) -> Result<DiscoveryResult> {
    discover(root, pattern)
}

/// Find bundle specifications matching `pattern` directly inside `bundles_dir`.
pub fn discover_bundle_specs(bundles_dir: &Path, pattern: &str) -> Result<DiscoveryResult> {
    discover(bundles_dir, pattern)
}

#[instrument(skip_all, fields(dir = %dir.display(), pattern = %pattern))]
fn discover(dir: &Path, pattern: &str) -> Result<DiscoveryResult> {
    if !dir.is_dir() {
        debug!("directory not found");
        return Ok(DiscoveryResult::MissingDirectory(dir.to_path_buf()));
    }

    let full_pattern = dir_pattern(dir, pattern)?;
    let entries = glob::glob(&full_pattern).map_err(|e| {
        FeedBundleError::config(format!("invalid discovery pattern '{pattern}': {e}"))
    })?;

    let mut files = Vec::new();
    for entry in entries {
        match entry {
            Ok(path) if path.is_file() => files.push(path),
            Ok(path) => debug!(path = %path.display(), "skipping non-file match"),
            Err(e) => warn!(error = %e, "skipping unreadable entry"),
        }
    }
    files.sort();

    info!(count = files.len(), "discovery complete");
    Ok(DiscoveryResult::Found(files))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Join an escaped directory path with a file pattern.
fn dir_pattern(dir: &Path, pattern: &str) -> Result<String> {
    if pattern.contains('/') || pattern.contains('\\') {
        return Err(FeedBundleError::config(format!(
            "discovery pattern '{pattern}' must match file names only"
        )));
    }

    let dir = dir.to_str().ok_or_else(|| {
        FeedBundleError::config(format!("directory path is not valid UTF-8: {}", dir.display()))
    })?;

    let escaped = glob::Pattern::escape(dir);
    Ok(format!("{}/{pattern}", escaped.trim_end_matches('/')))
}
