//! End-to-end run: discover → validate every document → build every bundle.

use std::path::PathBuf;

use tracing::{info, instrument, warn};

use feedbundle_discovery::{DiscoveryResult, discover_bundle_specs, discover_documents};
use feedbundle_shared::{BundleSpec, ProjectConfig, Result};

use crate::merger::{BundleBuilder, BundleReport, SourceFailure};
use crate::validator::{self, ValidationOutcome};

/// Which phases to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    /// Check every input document before building.
    pub validate: bool,
    /// Build every bundle.
    pub build: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            validate: true,
            build: true,
        }
    }
}

/// Why a run did not succeed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RunFailure {
    #[error("no OPML files found in {}", .0.display())]
    NoDocuments(PathBuf),

    #[error("{invalid} of {total} OPML file(s) failed validation")]
    ValidationFailed { invalid: usize, total: usize },

    #[error("bundles directory not found: {}", .0.display())]
    MissingBundlesDir(PathBuf),

    #[error("no bundle configuration files found in {}", .0.display())]
    NoBundleSpecs(PathBuf),

    #[error("{failed} of {total} bundle(s) failed to build")]
    BundlesFailed { failed: usize, total: usize },
}

/// A bundle that could not be built.
#[derive(Debug, Clone)]
pub struct BundleFailure {
    /// The bundle specification file.
    pub spec_path: PathBuf,
    /// Display text of the error.
    pub error: String,
}

/// Everything a run did.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    /// One outcome per discovered document, in discovery order.
    pub validated: Vec<ValidationOutcome>,
    /// Bundles built successfully.
    pub built: Vec<BundleReport>,
    /// Bundles that failed.
    pub failed: Vec<BundleFailure>,
    /// Directory bundle outputs were written to.
    pub output_dir: PathBuf,
    /// Set when the run did not succeed.
    pub failure: Option<RunFailure>,
}

impl RunReport {
    /// Whether every requested phase succeeded.
    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }

    /// Process exit status: 0 on success, 1 otherwise.
    pub fn exit_code(&self) -> u8 {
        if self.is_success() { 0 } else { 1 }
    }
}

/// Progress callback for reporting run status.
pub trait ProgressReporter {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called after each document is validated.
    fn document_validated(&self, outcome: &ValidationOutcome);
    /// Called once every document passed validation.
    fn validation_passed(&self, count: usize);
    /// Called when a bundle specification was loaded and building starts.
    fn bundle_started(&self, spec: &BundleSpec);
    /// Called when a bundle source does not exist and is skipped.
    fn source_missing(&self, source: &str);
    /// Called when a bundle source could not be read or parsed and is skipped.
    fn source_failed(&self, failure: &SourceFailure);
    /// Called when a bundle was written.
    fn bundle_built(&self, report: &BundleReport);
    /// Called when a bundle could not be built.
    fn bundle_failed(&self, failure: &BundleFailure);
    /// Called when the run completes.
    fn done(&self, report: &RunReport);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn document_validated(&self, _outcome: &ValidationOutcome) {}
    fn validation_passed(&self, _count: usize) {}
    fn bundle_started(&self, _spec: &BundleSpec) {}
    fn source_missing(&self, _source: &str) {}
    fn source_failed(&self, _failure: &SourceFailure) {}
    fn bundle_built(&self, _report: &BundleReport) {}
    fn bundle_failed(&self, _failure: &BundleFailure) {}
    fn done(&self, _report: &RunReport) {}
}

/// Run the requested phases.
///
/// 1. Validation: every `*.opml.xml` in the root must be valid, and there
///    must be at least one; otherwise nothing is built.
/// 2. Build: every bundle specification is built independently; one failing
///    bundle does not stop the others.
///
/// Errors are returned only for setup problems such as an invalid discovery
/// pattern; per-document and per-bundle problems end up in the report.
#[instrument(skip_all, fields(root = %config.root.display(), validate = options.validate, build = options.build))]
pub fn run(
    config: &ProjectConfig,
    options: &RunOptions,
    progress: &dyn ProgressReporter,
) -> Result<RunReport> {
    let mut report = RunReport {
        output_dir: config.output_dir(),
        ..RunReport::default()
    };

    if options.validate {
        progress.phase("Validating OPML files");
        if let Some(failure) = validate_all(config, &mut report, progress)? {
            report.failure = Some(failure);
            progress.done(&report);
            return Ok(report);
        }
    }

    if options.build {
        report.failure = build_all(config, &mut report, progress)?;
    }

    progress.done(&report);
    Ok(report)
}

/// Validate every input document; any invalid one fails the run.
fn validate_all(
    config: &ProjectConfig,
    report: &mut RunReport,
    progress: &dyn ProgressReporter,
) -> Result<Option<RunFailure>> {
    let documents = discover_documents(&config.root, &config.paths.document_pattern)?;

    let files = documents.files();
    if files.is_empty() {
        return Ok(Some(RunFailure::NoDocuments(config.root.clone())));
    }

    for path in files {
        let outcome = validator::validate(path);
        progress.document_validated(&outcome);
        report.validated.push(outcome);
    }

    let invalid = report.validated.iter().filter(|o| !o.is_valid).count();
    if invalid > 0 {
        return Ok(Some(RunFailure::ValidationFailed {
            invalid,
            total: files.len(),
        }));
    }

    info!(count = files.len(), "all documents valid");
    progress.validation_passed(files.len());
    Ok(None)
}

/// Build every bundle specification.
fn build_all(
    config: &ProjectConfig,
    report: &mut RunReport,
    progress: &dyn ProgressReporter,
) -> Result<Option<RunFailure>> {
    let bundles_dir = config.bundles_dir();
    let specs = match discover_bundle_specs(&bundles_dir, &config.paths.bundle_pattern)? {
        DiscoveryResult::Found(files) => files,
        DiscoveryResult::MissingDirectory(dir) => {
            return Ok(Some(RunFailure::MissingBundlesDir(dir)));
        }
    };

    if specs.is_empty() {
        return Ok(Some(RunFailure::NoBundleSpecs(bundles_dir)));
    }

    progress.phase(&format!("Building {} bundle(s)", specs.len()));
    let builder = BundleBuilder::from_config(config);

    for spec_path in &specs {
        match builder.build_bundle(spec_path, progress) {
            Ok(bundle) => {
                progress.bundle_built(&bundle);
                report.built.push(bundle);
            }
            Err(e) => {
                warn!(spec = %spec_path.display(), error = %e, "bundle failed");
                let failure = BundleFailure {
                    spec_path: spec_path.clone(),
                    error: e.to_string(),
                };
                progress.bundle_failed(&failure);
                report.failed.push(failure);
            }
        }
    }

    if !report.failed.is_empty() {
        return Ok(Some(RunFailure::BundlesFailed {
            failed: report.failed.len(),
            total: specs.len(),
        }));
    }

    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    const VALID: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<opml version="2.0">
    <head><title>Rust</title></head>
    <body>
        <outline text="This Week in Rust" type="rss" xmlUrl="https://this-week-in-rust.org/rss.xml"/>
        <outline text="Rust Blog" type="rss" xmlUrl="https://blog.rust-lang.org/feed.xml"/>
    </body>
</opml>
"#;

    fn write(path: PathBuf, content: &str) {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, content).unwrap();
    }

    fn repo() -> (tempfile::TempDir, ProjectConfig) {
        let dir = tempfile::tempdir().unwrap();
        let config = ProjectConfig::with_root(dir.path());
        (dir, config)
    }

    /// Records reporter calls so tests can check the sequence.
    #[derive(Default)]
    struct Recorder {
        events: RefCell<Vec<String>>,
    }

    impl ProgressReporter for Recorder {
        fn phase(&self, name: &str) {
            self.events.borrow_mut().push(format!("phase:{name}"));
        }
        fn document_validated(&self, outcome: &ValidationOutcome) {
            self.events
                .borrow_mut()
                .push(format!("doc:{}:{}", outcome.display_name(), outcome.is_valid));
        }
        fn validation_passed(&self, count: usize) {
            self.events.borrow_mut().push(format!("valid:{count}"));
        }
        fn bundle_started(&self, spec: &BundleSpec) {
            self.events.borrow_mut().push(format!("start:{}", spec.name));
        }
        fn source_missing(&self, source: &str) {
            self.events.borrow_mut().push(format!("missing:{source}"));
        }
        fn source_failed(&self, failure: &SourceFailure) {
            self.events
                .borrow_mut()
                .push(format!("source-failed:{}", failure.source));
        }
        fn bundle_built(&self, report: &BundleReport) {
            self.events
                .borrow_mut()
                .push(format!("built:{}:{}", report.name, report.feed_count));
        }
        fn bundle_failed(&self, failure: &BundleFailure) {
            let name = failure.spec_path.file_name().unwrap().to_string_lossy();
            self.events.borrow_mut().push(format!("failed:{name}"));
        }
        fn done(&self, report: &RunReport) {
            self.events
                .borrow_mut()
                .push(format!("done:{}", report.exit_code()));
        }
    }

    #[test]
    fn full_run_succeeds() {
        let (dir, config) = repo();
        write(dir.path().join("rust.opml.xml"), VALID);
        write(
            dir.path().join("bundles/rust.yaml"),
            "name: Rust\noutput: rust-bundle.opml.xml\nsources: [rust.opml.xml]\n",
        );

        let recorder = Recorder::default();
        let report = run(&config, &RunOptions::default(), &recorder).unwrap();

        assert!(report.is_success());
        assert_eq!(report.exit_code(), 0);
        assert_eq!(report.validated.len(), 1);
        assert_eq!(report.built.len(), 1);
        assert_eq!(report.built[0].feed_count, 2);
        assert!(dir.path().join("dist/rust-bundle.opml.xml").is_file());
        assert_eq!(
            *recorder.events.borrow(),
            [
                "phase:Validating OPML files",
                "doc:rust.opml.xml:true",
                "valid:1",
                "phase:Building 1 bundle(s)",
                "start:Rust",
                "built:Rust:2",
                "done:0",
            ]
        );
    }

    #[test]
    fn no_documents_fails_validation() {
        let (_dir, config) = repo();
        let report = run(&config, &RunOptions::default(), &SilentProgress).unwrap();
        assert!(matches!(report.failure, Some(RunFailure::NoDocuments(_))));
        assert_eq!(report.exit_code(), 1);
    }

    #[test]
    fn invalid_document_stops_before_build() {
        let (dir, config) = repo();
        write(dir.path().join("good.opml.xml"), VALID);
        write(dir.path().join("bad.opml.xml"), "<opml><head/></opml>");
        write(dir.path().join("bundles/all.yaml"), "sources: [good.opml.xml]\n");

        let report = run(&config, &RunOptions::default(), &SilentProgress).unwrap();
        assert_eq!(
            report.failure,
            Some(RunFailure::ValidationFailed {
                invalid: 1,
                total: 2
            })
        );
        assert_eq!(report.validated.len(), 2);
        assert_eq!(report.validated[0].reason, "missing body");
        assert!(report.built.is_empty());
        assert!(!dir.path().join("dist").exists());
    }

    #[test]
    fn build_only_skips_validation() {
        let (dir, config) = repo();
        write(dir.path().join("bad.opml.xml"), "<notopml/>");
        write(dir.path().join("bundles/x.yaml"), "name: X\nsources: [missing.opml.xml]\n");

        let options = RunOptions {
            validate: false,
            build: true,
        };
        let report = run(&config, &options, &SilentProgress).unwrap();
        assert!(report.is_success());
        assert!(report.validated.is_empty());
        assert_eq!(report.built[0].missing_sources, ["missing.opml.xml"]);
    }

    #[test]
    fn validate_only_skips_build() {
        let (dir, config) = repo();
        write(dir.path().join("rust.opml.xml"), VALID);

        let options = RunOptions {
            validate: true,
            build: false,
        };
        let report = run(&config, &options, &SilentProgress).unwrap();
        assert!(report.is_success());
        assert_eq!(report.validated.len(), 1);
        assert!(report.built.is_empty());
    }

    #[test]
    fn neither_phase_is_a_no_op_success() {
        let (_dir, config) = repo();
        let options = RunOptions {
            validate: false,
            build: false,
        };
        let report = run(&config, &options, &SilentProgress).unwrap();
        assert!(report.is_success());
    }

    #[test]
    fn missing_bundles_dir_fails() {
        let (dir, config) = repo();
        write(dir.path().join("rust.opml.xml"), VALID);

        let report = run(&config, &RunOptions::default(), &SilentProgress).unwrap();
        assert!(matches!(
            report.failure,
            Some(RunFailure::MissingBundlesDir(_))
        ));
    }

    #[test]
    fn empty_bundles_dir_fails() {
        let (dir, config) = repo();
        write(dir.path().join("rust.opml.xml"), VALID);
        std::fs::create_dir(dir.path().join("bundles")).unwrap();

        let report = run(&config, &RunOptions::default(), &SilentProgress).unwrap();
        assert!(matches!(report.failure, Some(RunFailure::NoBundleSpecs(_))));
    }

    #[test]
    fn one_bad_bundle_does_not_stop_the_others() {
        let (dir, config) = repo();
        write(dir.path().join("rust.opml.xml"), VALID);
        write(
            dir.path().join("bundles/a.yaml"),
            "name: A\noutput: a.opml.xml\nsources: [rust.opml.xml]\n",
        );
        write(dir.path().join("bundles/b.yaml"), "");
        write(
            dir.path().join("bundles/c.yaml"),
            "name: C\noutput: c.opml.xml\nsources: [rust.opml.xml]\n",
        );

        let recorder = Recorder::default();
        let report = run(&config, &RunOptions::default(), &recorder).unwrap();

        assert_eq!(
            report.failure,
            Some(RunFailure::BundlesFailed {
                failed: 1,
                total: 3
            })
        );
        assert_eq!(report.built.len(), 2);
        assert_eq!(report.failed.len(), 1);
        assert!(report.failed[0].error.contains("empty"));
        assert!(dir.path().join("dist/a.opml.xml").is_file());
        assert!(dir.path().join("dist/c.opml.xml").is_file());
        assert!(recorder.events.borrow().contains(&"failed:b.yaml".to_string()));
    }

    #[test]
    fn source_problems_are_reported_before_the_bundle_finishes() {
        let (dir, config) = repo();
        write(dir.path().join("rust.opml.xml"), VALID);
        write(dir.path().join("broken.opml.xml"), "<opml><body></opml>");
        write(
            dir.path().join("bundles/mix.yaml"),
            "name: Mix\noutput: mix.opml.xml\nsources: [nope.opml.xml, broken.opml.xml, rust.opml.xml]\n",
        );

        let recorder = Recorder::default();
        let options = RunOptions {
            validate: false,
            build: true,
        };
        run(&config, &options, &recorder).unwrap();

        assert_eq!(
            *recorder.events.borrow(),
            [
                "phase:Building 1 bundle(s)",
                "start:Mix",
                "missing:nope.opml.xml",
                "source-failed:broken.opml.xml",
                "built:Mix:2",
                "done:0",
            ]
        );
    }

    #[test]
    fn source_warnings_survive_a_failed_write() {
        let (dir, config) = repo();
        write(
            dir.path().join("bundles/x.yaml"),
            "name: X\noutput: x.opml.xml\nsources: [nope.opml.xml]\n",
        );
        // A directory where the output file should go makes the write fail.
        std::fs::create_dir_all(dir.path().join("dist/x.opml.xml")).unwrap();

        let recorder = Recorder::default();
        let options = RunOptions {
            validate: false,
            build: true,
        };
        let report = run(&config, &options, &recorder).unwrap();

        assert_eq!(report.failed.len(), 1);
        assert_eq!(
            *recorder.events.borrow(),
            [
                "phase:Building 1 bundle(s)",
                "start:X",
                "missing:nope.opml.xml",
                "failed:x.yaml",
                "done:1",
            ]
        );
    }

    #[test]
    fn custom_paths_from_config() {
        let (dir, mut config) = repo();
        config.paths.bundles_dir = "specs".into();
        config.paths.output_dir = "public".into();
        config.paths.bundle_pattern = "*.yml".into();
        write(dir.path().join("rust.opml.xml"), VALID);
        write(
            dir.path().join("specs/r.yml"),
            "output: r.opml.xml\nsources: [rust.opml.xml]\n",
        );

        let report = run(&config, &RunOptions::default(), &SilentProgress).unwrap();
        assert!(report.is_success());
        assert_eq!(report.output_dir, dir.path().join("public"));
        assert!(dir.path().join("public/r.opml.xml").is_file());
    }

    #[test]
    fn bad_pattern_is_a_setup_error() {
        let (_dir, mut config) = repo();
        config.paths.document_pattern = "[".into();
        assert!(run(&config, &RunOptions::default(), &SilentProgress).is_err());
    }
}
