//! Element tree types and query helpers.

use std::path::Path;

use feedbundle_shared::{FeedBundleError, Result};
use tracing::debug;

use crate::{BODY_TAG, FEED_TYPE, HEAD_TAG, OPML_VERSION, OUTLINE_TAG, ROOT_TAG, TITLE_TAG};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A child of an [`Element`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    /// Unescaped character data. Whitespace-only runs are not kept.
    Text(String),
}

/// An XML element with its attributes (in source order) and children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Node>,
}

/// A parsed or generated OPML document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub root: Element,
}

// ---------------------------------------------------------------------------
// Element
// ---------------------------------------------------------------------------

impl Element {
    /// Create an element with no attributes or children.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Builder-style attribute setter.
    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attr(key, value);
        self
    }

    /// Set an attribute, replacing an existing value in place.
    pub fn set_attr(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((key, value)),
        }
    }

    /// Value of the attribute `key`, if present.
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Append a child element.
    pub fn push(&mut self, child: Element) {
        self.children.push(Node::Element(child));
    }

    /// Append a text node.
    pub fn push_text(&mut self, text: impl Into<String>) {
        self.children.push(Node::Text(text.into()));
    }

    /// Direct child elements, in document order.
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(el) => Some(el),
            Node::Text(_) => None,
        })
    }

    /// First direct child element named `name`.
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.elements().find(|el| el.name == name)
    }

    /// Mutable access to the first direct child element named `name`.
    pub fn child_mut(&mut self, name: &str) -> Option<&mut Element> {
        self.children.iter_mut().find_map(|node| match node {
            Node::Element(el) if el.name == name => Some(el),
            _ => None,
        })
    }

    /// Every element below this one, depth-first in document order.
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants {
            stack: vec![self.children.iter()],
        }
    }

    /// Concatenated direct text content.
    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|node| match node {
                Node::Text(t) => Some(t.as_str()),
                Node::Element(_) => None,
            })
            .collect()
    }

    /// Whether this element is an `<outline type="rss">` feed entry.
    pub fn is_feed(&self) -> bool {
        self.name == OUTLINE_TAG && self.attr("type") == Some(FEED_TYPE)
    }

    /// Number of feed entries at any depth below this element.
    pub fn feed_count(&self) -> usize {
        self.descendants().filter(|el| el.is_feed()).count()
    }

    /// Consume the element and move out its direct child elements in order.
    ///
    /// Text between children is dropped; each returned subtree is intact.
    pub fn take_child_elements(self) -> Vec<Element> {
        self.children
            .into_iter()
            .filter_map(|node| match node {
                Node::Element(el) => Some(el),
                Node::Text(_) => None,
            })
            .collect()
    }
}

/// Depth-first iterator returned by [`Element::descendants`].
pub struct Descendants<'a> {
    stack: Vec<std::slice::Iter<'a, Node>>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a Element;

    fn next(&mut self) -> Option<&'a Element> {
        while let Some(level) = self.stack.last_mut() {
            match level.next() {
                Some(Node::Element(el)) => {
                    self.stack.push(el.children.iter());
                    return Some(el);
                }
                Some(Node::Text(_)) => continue,
                None => {
                    self.stack.pop();
                }
            }
        }
        None
    }
}

// ---------------------------------------------------------------------------
// Document
// ---------------------------------------------------------------------------

impl Document {
    /// Parse a document from markup.
    pub fn parse(content: &str) -> Result<Self> {
        let root = crate::reader::parse_root(content)?;
        Ok(Self { root })
    }

    /// Read and parse a document from disk.
    pub fn from_path(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path).map_err(|e| FeedBundleError::io(path, e))?;
        let content = crate::reader::decode(&bytes)?;
        let doc = Self::parse(&content)?;
        debug!(path = %path.display(), root = %doc.root.name, "parsed document");
        Ok(doc)
    }

    /// A fresh bundle document: `<opml version="2.0">` with a titled head and an empty body.
    pub fn new_bundle(title: &str) -> Self {
        let mut title_el = Element::new(TITLE_TAG);
        if !title.is_empty() {
            title_el.push_text(title);
        }

        let mut head = Element::new(HEAD_TAG);
        head.push(title_el);

        let mut root = Element::new(ROOT_TAG).with_attr("version", OPML_VERSION);
        root.push(head);
        root.push(Element::new(BODY_TAG));

        Self { root }
    }

    /// The `<head>` section, if present.
    pub fn head(&self) -> Option<&Element> {
        self.root.child(HEAD_TAG)
    }

    /// The `<body>` section, if present.
    pub fn body(&self) -> Option<&Element> {
        self.root.child(BODY_TAG)
    }

    /// Mutable `<body>` section, if present.
    pub fn body_mut(&mut self) -> Option<&mut Element> {
        self.root.child_mut(BODY_TAG)
    }

    /// Text of `<head><title>`, if present.
    pub fn title(&self) -> Option<String> {
        self.head()?.child(TITLE_TAG).map(Element::text)
    }

    /// Feed entries at any depth under `<body>`; zero when there is no body.
    pub fn feed_count(&self) -> usize {
        self.body().map_or(0, Element::feed_count)
    }

    /// Consume the document and move out the direct children of `<body>`.
    ///
    /// Returns `None` when the root has no `<body>` child.
    pub fn into_body_entries(self) -> Option<Vec<Element>> {
        let Document { root } = self;
        root.take_child_elements()
            .into_iter()
            .find(|el| el.name == BODY_TAG)
            .map(Element::take_child_elements)
    }

    /// Serialize with an XML declaration and 4-space indentation.
    pub fn to_xml_string(&self) -> Result<String> {
        crate::writer::to_xml_string(&self.root)
    }

    /// Serialize and write to `path`.
    pub fn write_to(&self, path: &Path) -> Result<()> {
        let xml = self.to_xml_string()?;
        std::fs::write(path, xml).map_err(|e| FeedBundleError::io(path, e))?;
        debug!(path = %path.display(), "wrote document");
        Ok(())
    }
}
