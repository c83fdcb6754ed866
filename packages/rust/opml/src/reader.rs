//! Markup → element tree, using the `quick-xml` pull parser.

use std::borrow::Cow;
use std::fmt::Display;

use encoding_rs::{Encoding, UTF_8, UTF_16BE, UTF_16LE};
use feedbundle_shared::{FeedBundleError, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use crate::document::Element;

/// Decode raw file bytes to text.
///
/// A byte order mark wins; otherwise the `encoding` named in the XML
/// declaration is used, defaulting to UTF-8. Bytes that are invalid in the
/// chosen encoding are a parse error.
pub(crate) fn decode(bytes: &[u8]) -> Result<Cow<'_, str>> {
    let (encoding, bom_len) = match Encoding::for_bom(bytes) {
        Some(found) => found,
        None => (declared_encoding(bytes)?, 0),
    };

    encoding
        .decode_without_bom_handling_and_without_replacement(&bytes[bom_len..])
        .ok_or_else(|| {
            FeedBundleError::parse(format!("document is not valid {}", encoding.name()))
        })
}

fn declared_encoding(bytes: &[u8]) -> Result<&'static Encoding> {
    let mut reader = Reader::from_reader(bytes);
    let label = match reader.read_event() {
        Ok(Event::Decl(decl)) => match decl.encoding() {
            Some(label) => label
                .map_err(|e| FeedBundleError::parse(format!("bad XML declaration: {e}")))?
                .into_owned(),
            None => return Ok(UTF_8),
        },
        // Anything else is left to the parser to diagnose.
        _ => return Ok(UTF_8),
    };

    let encoding = Encoding::for_label(&label).ok_or_else(|| {
        FeedBundleError::parse(format!(
            "unsupported encoding '{}'",
            String::from_utf8_lossy(&label)
        ))
    })?;

    // Without a BOM the declaration was read as single bytes, so the
    // content cannot be UTF-16 whatever the label says.
    if encoding == UTF_16LE || encoding == UTF_16BE {
        return Ok(UTF_8);
    }
    Ok(encoding)
}

/// Parse `content` and return its single root element.
///
/// Comments, processing instructions and the doctype are skipped;
/// whitespace-only text is dropped.
pub(crate) fn parse_root(content: &str) -> Result<Element> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let mut reader = Reader::from_str(content);

    // Open elements, innermost last.
    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        let event = reader.read_event().map_err(|e| {
            FeedBundleError::parse(format!("{e} (at byte {})", reader.buffer_position()))
        })?;

        match event {
            Event::Start(start) => {
                ensure_single_root(&root, reader.buffer_position())?;
                stack.push(element_from_start(&start)?);
            }
            Event::Empty(start) => {
                ensure_single_root(&root, reader.buffer_position())?;
                let el = element_from_start(&start)?;
                close(el, &mut stack, &mut root);
            }
            Event::End(end) => {
                let name = utf8(end.name().into_inner())?;
                let el = stack.pop().ok_or_else(|| {
                    FeedBundleError::parse(format!(
                        "unexpected closing tag </{name}> (at byte {})",
                        reader.buffer_position()
                    ))
                })?;
                if el.name != name {
                    return Err(FeedBundleError::parse(format!(
                        "mismatched tag: expected </{}>, found </{name}> (at byte {})",
                        el.name,
                        reader.buffer_position()
                    )));
                }
                close(el, &mut stack, &mut root);
            }
            Event::Text(text) => {
                let text = text
                    .unescape()
                    .map_err(|e| FeedBundleError::parse(e.to_string()))?;
                push_text(&text, &mut stack, reader.buffer_position())?;
            }
            Event::CData(cdata) => {
                let text = utf8(&cdata)?;
                push_text(text, &mut stack, reader.buffer_position())?;
            }
            Event::Eof => break,
            // Declaration, comments, processing instructions, doctype.
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(FeedBundleError::parse(format!(
            "unclosed element <{}> at end of input",
            open.name
        )));
    }

    root.ok_or_else(|| FeedBundleError::parse("no element found"))
}

fn element_from_start(start: &BytesStart<'_>) -> Result<Element> {
    let mut el = Element::new(utf8(start.name().as_ref())?);

    for attr in start.attributes() {
        let attr = attr.map_err(|e| FeedBundleError::parse(format!("bad attribute: {e}")))?;
        let key = utf8(attr.key.as_ref())?.to_string();
        if attr.value.contains(&b'<') {
            return Err(FeedBundleError::parse(format!(
                "'<' not allowed in value of attribute '{key}'"
            )));
        }
        let value = attr
            .unescape_value()
            .map_err(|e| FeedBundleError::parse(format!("bad value for attribute '{key}': {e}")))?;
        el.attributes.push((key, value.into_owned()));
    }

    Ok(el)
}

/// Attach a finished element to its parent, or make it the root.
fn close(el: Element, stack: &mut [Element], root: &mut Option<Element>) {
    match stack.last_mut() {
        Some(parent) => parent.push(el),
        None => *root = Some(el),
    }
}

fn push_text(text: &str, stack: &mut [Element], position: impl Display) -> Result<()> {
    if text.trim().is_empty() {
        return Ok(());
    }
    match stack.last_mut() {
        Some(parent) => {
            parent.push_text(text);
            Ok(())
        }
        None => Err(FeedBundleError::parse(format!(
            "text outside the root element (at byte {position})"
        ))),
    }
}

fn ensure_single_root(root: &Option<Element>, position: impl Display) -> Result<()> {
    if root.is_some() {
        return Err(FeedBundleError::parse(format!(
            "junk after document element (at byte {position})"
        )));
    }
    Ok(())
}

fn utf8(bytes: &[u8]) -> Result<&str> {
    std::str::from_utf8(bytes).map_err(|e| FeedBundleError::parse(format!("invalid UTF-8: {e}")))
}
