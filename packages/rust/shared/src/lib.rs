//! Shared types, error model, and configuration for feedbundle.
//!
//! This crate is the foundation depended on by all other feedbundle crates.
//! It provides:
//! - [`FeedBundleError`] — the unified error type
//! - [`BundleSpec`] — a bundle specification loaded from YAML
//! - Configuration ([`ProjectConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{CONFIG_FILE_NAME, PathsConfig, ProjectConfig, load_config, load_config_from};
pub use error::{FeedBundleError, Result, StructureError};
pub use types::{BundleSpec, DEFAULT_BUNDLE_NAME, DEFAULT_BUNDLE_OUTPUT};
