//! Bundle merger.
//!
//! Builds one output document per bundle specification by concatenating the
//! `<body>` entries of its source documents, in source order.

use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument, warn};

use feedbundle_opml::{Document, Element};
use feedbundle_shared::{BundleSpec, FeedBundleError, ProjectConfig, Result};

use crate::pipeline::ProgressReporter;

/// A source that existed but could not be merged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFailure {
    /// Source path as written in the bundle specification.
    pub source: String,
    /// Display text of the error.
    pub error: String,
}

/// In-memory result of merging a bundle's sources.
#[derive(Debug)]
pub struct MergeResult {
    /// The assembled bundle document.
    pub document: Document,
    /// Sources whose entries were merged.
    pub merged_sources: Vec<String>,
    /// Sources that do not exist on disk.
    pub missing_sources: Vec<String>,
    /// Sources that failed to read or parse.
    pub failed_sources: Vec<SourceFailure>,
}

/// Outcome of building one bundle.
#[derive(Debug, Clone)]
pub struct BundleReport {
    /// Bundle title.
    pub name: String,
    /// Description from the specification (not written to the output).
    pub description: String,
    /// Where the output was written.
    pub output_path: PathBuf,
    /// Number of sources listed in the specification.
    pub source_count: usize,
    /// Sources whose entries were merged.
    pub merged_sources: Vec<String>,
    /// Sources skipped because they do not exist.
    pub missing_sources: Vec<String>,
    /// Sources skipped because they could not be read or parsed.
    pub failed_sources: Vec<SourceFailure>,
    /// Top-level entries in the output `<body>`.
    pub entry_count: usize,
    /// Feed entries at any depth in the output `<body>`.
    pub feed_count: usize,
}

/// Merges source documents into bundle outputs.
#[derive(Debug, Clone)]
pub struct BundleBuilder {
    base_dir: PathBuf,
    output_dir: PathBuf,
}

impl BundleBuilder {
    /// Sources resolve against `base_dir`; outputs land in `output_dir`.
    pub fn new(base_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            output_dir: output_dir.into(),
        }
    }

    /// Builder for the directories named by a project config.
    pub fn from_config(config: &ProjectConfig) -> Self {
        Self::new(config.root.clone(), config.output_dir())
    }

    /// Load the specification at `config_path` and build its bundle.
    pub fn build_bundle(
        &self,
        config_path: &Path,
        progress: &dyn ProgressReporter,
    ) -> Result<BundleReport> {
        let spec = BundleSpec::load(config_path)?;
        progress.bundle_started(&spec);
        self.build_spec(&spec, progress)
    }

    /// Build the bundle described by `spec` and write it to the output directory.
    ///
    /// Missing or broken sources are skipped with a warning; only failures to
    /// create the output directory or write the file are returned as errors.
    #[instrument(skip_all, fields(bundle = %spec.name, output = %spec.output))]
    pub fn build_spec(
        &self,
        spec: &BundleSpec,
        progress: &dyn ProgressReporter,
    ) -> Result<BundleReport> {
        debug!(description = %spec.description, "bundle description is not written to the output");

        let merged = self.merge_sources(&spec.sources, &spec.name, progress);

        let output_path = self.output_dir.join(&spec.output);
        let parent = output_path.parent().unwrap_or(self.output_dir.as_path());
        std::fs::create_dir_all(parent).map_err(|e| FeedBundleError::io(parent, e))?;

        merged.document.write_to(&output_path)?;

        let body = merged.document.body();
        let entry_count = body.map_or(0, |b| b.elements().count());
        let feed_count = merged.document.feed_count();

        info!(
            path = %output_path.display(),
            entry_count,
            feed_count,
            "bundle written"
        );

        Ok(BundleReport {
            name: spec.name.clone(),
            description: spec.description.clone(),
            output_path,
            source_count: spec.sources.len(),
            merged_sources: merged.merged_sources,
            missing_sources: merged.missing_sources,
            failed_sources: merged.failed_sources,
            entry_count,
            feed_count,
        })
    }

    /// Merge the `<body>` entries of every source into a new document titled `name`.
    ///
    /// Each skipped source is reported to `progress` as it is encountered.
    pub fn merge_sources(
        &self,
        sources: &[String],
        name: &str,
        progress: &dyn ProgressReporter,
    ) -> MergeResult {
        let mut document = Document::new_bundle(name);
        let mut merged_sources = Vec::new();
        let mut missing_sources = Vec::new();
        let mut failed_sources = Vec::new();

        for source in sources {
            let source_path = self.base_dir.join(source);

            if !source_path.exists() {
                warn!(source = %source, "source file not found, skipping");
                progress.source_missing(source);
                missing_sources.push(source.clone());
                continue;
            }

            match load_entries(&source_path) {
                Ok(entries) => {
                    debug!(source = %source, entries = entries.len(), "merging source");
                    if let Some(body) = document.body_mut() {
                        for entry in entries {
                            body.push(entry);
                        }
                    }
                    merged_sources.push(source.clone());
                }
                Err(e) => {
                    warn!(source = %source, error = %e, "failed to process source, skipping");
                    let failure = SourceFailure {
                        source: source.clone(),
                        error: e.to_string(),
                    };
                    progress.source_failed(&failure);
                    failed_sources.push(failure);
                }
            }
        }

        MergeResult {
            document,
            merged_sources,
            missing_sources,
            failed_sources,
        }
    }
}

/// Parse a source document and move out its `<body>` entries.
///
/// A source without `<body>` contributes nothing.
fn load_entries(path: &Path) -> Result<Vec<Element>> {
    let doc = Document::from_path(path)?;
    match doc.into_body_entries() {
        Some(entries) => Ok(entries),
        None => {
            debug!(path = %path.display(), "source has no body");
            Ok(Vec::new())
        }
    }
}
