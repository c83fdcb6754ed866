//! Element tree → indented markup, using the `quick-xml` writer.

use feedbundle_shared::{FeedBundleError, Result};
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};

use crate::document::{Element, Node};

/// Spaces per nesting level.
const INDENT_WIDTH: usize = 4;

/// Serialize `root` with a UTF-8 XML declaration.
///
/// Childless elements are self-closed and an element whose only child is
/// text stays on one line. Output ends with a newline.
pub(crate) fn to_xml_string(root: &Element) -> Result<String> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', INDENT_WIDTH);

    emit(
        &mut writer,
        Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)),
    )?;
    write_element(&mut writer, root)?;

    let mut bytes = writer.into_inner();
    bytes.push(b'\n');

    String::from_utf8(bytes).map_err(|e| FeedBundleError::Serialize(e.to_string()))
}

fn write_element(writer: &mut Writer<Vec<u8>>, el: &Element) -> Result<()> {
    let mut start = BytesStart::new(el.name.as_str());
    for (key, value) in &el.attributes {
        start.push_attribute((key.as_str(), value.as_str()));
    }

    if el.children.is_empty() {
        return emit(writer, Event::Empty(start));
    }

    emit(writer, Event::Start(start))?;
    for child in &el.children {
        match child {
            Node::Element(child) => write_element(writer, child)?,
            Node::Text(text) => emit(writer, Event::Text(BytesText::new(text)))?,
        }
    }
    emit(writer, Event::End(BytesEnd::new(el.name.as_str())))
}

fn emit(writer: &mut Writer<Vec<u8>>, event: Event<'_>) -> Result<()> {
    writer
        .write_event(event)
        .map_err(|e| FeedBundleError::Serialize(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Document;

    #[test]
    fn empty_bundle_layout() {
        let xml = Document::new_bundle("Tech").to_xml_string().unwrap();
        let expected = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
<opml version=\"2.0\">\n    <head>\n        <title>Tech</title>\n    </head>\n    <body/>\n</opml>\n";
        assert_eq!(xml, expected);
    }

    #[test]
    fn empty_title_is_self_closed() {
        let xml = Document::new_bundle("").to_xml_string().unwrap();
        assert!(xml.contains("\n        <title/>\n"));
        assert!(!xml.contains("<title></title>"));
    }

    #[test]
    fn nested_entries_indent_by_four() {
        let mut doc = Document::new_bundle("Nested");
        let mut group = Element::new("outline").with_attr("text", "Group");
        group.push(
            Element::new("outline")
                .with_attr("text", "Feed")
                .with_attr("type", "rss"),
        );
        doc.body_mut().unwrap().push(group);

        let xml = doc.to_xml_string().unwrap();
        assert!(xml.contains("\n        <outline text=\"Group\">\n"));
        assert!(xml.contains("\n            <outline text=\"Feed\" type=\"rss\"/>\n"));
    }

    #[test]
    fn escapes_text_and_attributes() {
        let mut doc = Document::new_bundle("News & <Views>");
        doc.body_mut()
            .unwrap()
            .push(Element::new("outline").with_attr("text", "\"quoted\" & co"));

        let xml = doc.to_xml_string().unwrap();
        assert!(xml.contains("<title>News &amp; &lt;Views&gt;</title>"));
        assert!(!xml.contains("\"quoted\" & co"));

        let reparsed = Document::parse(&xml).unwrap();
        assert_eq!(reparsed, doc);
    }

    #[test]
    fn output_is_deterministic() {
        let doc = Document::parse(
            r#"<opml version="2.0"><head><title>T</title></head><body><outline text="a" type="rss" xmlUrl="https://a.example/feed"/></body></opml>"#,
        )
        .unwrap();
        assert_eq!(doc.to_xml_string().unwrap(), doc.to_xml_string().unwrap());
    }

    #[test]
    fn write_to_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.opml.xml");
        Document::new_bundle("Disk").write_to(&path).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert_eq!(Document::parse(&written).unwrap().title().as_deref(), Some("Disk"));
    }
}
