//! Bundle specification: the YAML files under `bundles/`.

use std::path::{Component, Path};

use serde::Deserialize;

use crate::error::{FeedBundleError, Result};

/// Name used when a bundle specification omits `name`.
pub const DEFAULT_BUNDLE_NAME: &str = "Unnamed Bundle";

/// Output filename used when a bundle specification omits `output`.
pub const DEFAULT_BUNDLE_OUTPUT: &str = "bundle.opml.xml";

/// A declarative bundle: which source documents to merge and where to put the result.
///
/// ```yaml
/// name: Tech
/// description: Programming and infrastructure blogs
/// output: tech.opml.xml
/// sources:
///   - rust.opml.xml
///   - devops.opml.xml
/// ```
///
/// `description` is read but never written into the bundle output.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BundleSpec {
    /// Bundle title, written as the output document's `<title>`.
    #[serde(default = "default_name")]
    pub name: String,

    /// Free-form description (not serialized into the output).
    #[serde(default)]
    pub description: String,

    /// Output filename, relative to the output directory.
    #[serde(default = "default_output")]
    pub output: String,

    /// Source documents, relative to the repository root, in merge order.
    #[serde(default)]
    pub sources: Vec<String>,
}

impl Default for BundleSpec {
    fn default() -> Self {
        Self {
            name: default_name(),
            description: String::new(),
            output: default_output(),
            sources: Vec::new(),
        }
    }
}

fn default_name() -> String {
    DEFAULT_BUNDLE_NAME.into()
}
fn default_output() -> String {
    DEFAULT_BUNDLE_OUTPUT.into()
}

impl BundleSpec {
    /// Load and validate a bundle specification from a YAML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content =
            std::fs::read_to_string(path).map_err(|e| FeedBundleError::io(path, e))?;

        Self::from_yaml_str(&content).map_err(|e| match e {
            FeedBundleError::Config { message } => {
                FeedBundleError::config(format!("{}: {message}", path.display()))
            }
            other => other,
        })
    }

    /// Parse and validate a bundle specification from YAML text.
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Err(FeedBundleError::config("bundle specification is empty"));
        }

        let spec: BundleSpec = serde_yaml::from_str(content)
            .map_err(|e| FeedBundleError::config(format!("invalid bundle specification: {e}")))?;

        spec.validate()?;
        Ok(spec)
    }

    /// Reject output paths that are empty or would escape the output directory.
    fn validate(&self) -> Result<()> {
        if self.output.trim().is_empty() {
            return Err(FeedBundleError::config("`output` must not be empty"));
        }

        let output = Path::new(&self.output);
        let escapes = output
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        let names_a_file = output
            .components()
            .any(|c| matches!(c, Component::Normal(_)));
        if escapes || !names_a_file {
            return Err(FeedBundleError::config(format!(
                "`output` must be a relative path inside the output directory, got '{}'",
                self.output
            )));
        }

        Ok(())
    }
}
