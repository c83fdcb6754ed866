//! In-memory OPML documents.
//!
//! A small owned element tree is enough for everything feedbundle does:
//! structural checks, counting feed outlines, moving outline subtrees from
//! one document into another, and writing the result back out.
//!
//! - [`Document::parse`] / [`Document::from_path`] read markup via `quick-xml`
//! - [`Element`] query helpers ([`Element::child`], [`Element::descendants`], ...)
//! - [`Document::to_xml_string`] / [`Document::write_to`] produce indented output

mod document;
mod reader;
mod writer;

pub use document::{Descendants, Document, Element, Node};

/// Root tag of every OPML document.
pub const ROOT_TAG: &str = "opml";

/// Metadata section tag.
pub const HEAD_TAG: &str = "head";

/// Content section tag.
pub const BODY_TAG: &str = "body";

/// Title tag inside `<head>`.
pub const TITLE_TAG: &str = "title";

/// Tag of every entry in the content section.
pub const OUTLINE_TAG: &str = "outline";

/// `type` attribute value marking an outline as a feed subscription.
pub const FEED_TYPE: &str = "rss";

/// OPML version written on generated documents.
pub const OPML_VERSION: &str = "2.0";
