//! Project configuration for feedbundle.
//!
//! An optional `feedbundle.toml` at the repository root can relocate the
//! bundle and output directories or change the discovery patterns.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{FeedBundleError, Result};

/// Default configuration file name, looked up in the repository root.
pub const CONFIG_FILE_NAME: &str = "feedbundle.toml";

// ---------------------------------------------------------------------------
// Config structs (matching feedbundle.toml schema)
// ---------------------------------------------------------------------------

/// Top-level project config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Repository root. Not read from the file; set by the caller.
    #[serde(skip)]
    pub root: PathBuf,

    /// Directory and pattern settings.
    #[serde(default)]
    pub paths: PathsConfig,
}

/// `[paths]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Directory holding bundle specifications, relative to the root.
    #[serde(default = "default_bundles_dir")]
    pub bundles_dir: String,

    /// Directory bundle outputs are written to, relative to the root.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// Glob matched against the root to find input documents.
    #[serde(default = "default_document_pattern")]
    pub document_pattern: String,

    /// Glob matched inside `bundles_dir` to find bundle specifications.
    #[serde(default = "default_bundle_pattern")]
    pub bundle_pattern: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            bundles_dir: default_bundles_dir(),
            output_dir: default_output_dir(),
            document_pattern: default_document_pattern(),
            bundle_pattern: default_bundle_pattern(),
        }
    }
}

fn default_bundles_dir() -> String {
    "bundles".into()
}
fn default_output_dir() -> String {
    "dist".into()
}
fn default_document_pattern() -> String {
    "*.opml.xml".into()
}
fn default_bundle_pattern() -> String {
    "*.yaml".into()
}

impl ProjectConfig {
    /// Defaults rooted at `root`.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            paths: PathsConfig::default(),
        }
    }

    /// Absolute bundle specification directory.
    pub fn bundles_dir(&self) -> PathBuf {
        self.root.join(&self.paths.bundles_dir)
    }

    /// Absolute output directory.
    pub fn output_dir(&self) -> PathBuf {
        self.root.join(&self.paths.output_dir)
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Load the project config for `root`.
///
/// Uses `explicit` when given (it must exist), otherwise `<root>/feedbundle.toml`
/// if present, otherwise defaults.
pub fn load_config(root: &Path, explicit: Option<&Path>) -> Result<ProjectConfig> {
    let path = match explicit {
        Some(p) => p.to_path_buf(),
        None => {
            let default_path = root.join(CONFIG_FILE_NAME);
            if !default_path.exists() {
                tracing::debug!(path = ?default_path, "config file not found, using defaults");
                return Ok(ProjectConfig::with_root(root));
            }
            default_path
        }
    };

    let mut config = load_config_from(&path)?;
    config.root = root.to_path_buf();
    Ok(config)
}

/// Load the project config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<ProjectConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| FeedBundleError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        FeedBundleError::config(format!("failed to parse {}: {e}", path.display()))
    })
}
