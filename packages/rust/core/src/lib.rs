//! Core domain logic for feedbundle.
//!
//! This crate validates input OPML documents, merges them into bundles, and
//! ties both into an end-to-end run (`pipeline::run`).

pub mod merger;
pub mod pipeline;
pub mod validator;
