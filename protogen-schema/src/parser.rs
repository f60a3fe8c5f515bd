//! XML loader for structure definitions.
//!
//! This module reads an already normalized structure description into an
//! immutable [`Tree`]. Namespace prefixes are stripped from element and
//! attribute names; attribute values are unescaped.

use crate::error::ParseError;
use crate::tree::{NodeId, Tree};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

/// Parses a structure description from a string.
///
/// # Arguments
/// * `xml` - XML document content
///
/// # Returns
/// The loaded tree, rooted at the document element.
///
/// # Errors
/// Returns `ParseError` if the XML is malformed or holds no element.
pub fn parse_tree(xml: &str) -> Result<Tree, ParseError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut tree = Tree::new();
    let mut stack: Vec<NodeId> = Vec::new();
    let mut buf = Vec::new();

    loop {
        let position = reader.buffer_position() as usize;
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                if let Some(id) = push_element(&mut tree, &stack, e, position)? {
                    stack.push(id);
                }
            }
            Ok(Event::Empty(ref e)) => {
                push_element(&mut tree, &stack, e, position)?;
            }
            Ok(Event::End(_)) => {
                stack.pop();
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(ParseError::Xml(e)),
            _ => {}
        }
        buf.clear();
    }

    if tree.is_empty() {
        return Err(ParseError::InvalidStructure {
            message: "No root element found".to_string(),
        });
    }
    Ok(tree)
}

/// Parses a structure description from a file.
///
/// # Errors
/// Returns `ParseError` if the file cannot be read or is not a valid description.
pub fn parse_tree_file(path: impl AsRef<std::path::Path>) -> Result<Tree, ParseError> {
    let content = std::fs::read_to_string(path)?;
    parse_tree(&content)
}

/// Adds an element to the tree. Elements following the closed root are skipped.
fn push_element(
    tree: &mut Tree,
    stack: &[NodeId],
    e: &BytesStart<'_>,
    position: usize,
) -> Result<Option<NodeId>, ParseError> {
    let parent = stack.last().copied();
    if parent.is_none() && !tree.is_empty() {
        return Ok(None);
    }

    let local = e.local_name();
    let tag = std::str::from_utf8(local.as_ref())?;
    let attributes = parse_attributes(e, tag)?;
    Ok(Some(tree.push(parent, tag, attributes, position)))
}

/// Reads the attributes of an element, keyed by local name.
fn parse_attributes(e: &BytesStart<'_>, tag: &str) -> Result<Vec<(String, String)>, ParseError> {
    let mut attributes = Vec::new();
    for attr in e.attributes().flatten() {
        let raw_key = std::str::from_utf8(attr.key.as_ref())?;
        // namespace declarations carry no structure information
        if raw_key == "xmlns" || raw_key.starts_with("xmlns:") {
            continue;
        }
        let local = attr.key.local_name();
        let key = std::str::from_utf8(local.as_ref())?;
        let raw_value = std::str::from_utf8(&attr.value)?;
        let value = quick_xml::escape::unescape(raw_value)
            .map_err(|_| ParseError::invalid_attr(tag, key, raw_value))?;
        attributes.push((key.to_string(), value.into_owned()));
    }
    Ok(attributes)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0"?>
<ld:data-definition xmlns:ld="http://github.com/peterix/dfhack/lowered-data-definition">
  <ld:global-type ld:meta="struct-type" ld:level="0" type-name="campfire" comment="a &amp; b">
    <ld:field type-name="coord" name="pos" ld:level="1" ld:meta="global"/>
    <ld:field name="timer" ld:level="1" ld:meta="number" ld:subtype="int32_t" ld:bits="32"/>
  </ld:global-type>
  <ld:global-type ld:meta="enum-type" ld:level="0" type-name="mode">
    <enum-item name="Default" value="0"/>
  </ld:global-type>
</ld:data-definition>
"#;

    #[test]
    fn test_parse_tree() {
        let tree = parse_tree(SAMPLE).expect("Failed to parse");
        let root = tree.root().expect("root");
        assert_eq!(tree.tag(root), "data-definition");
        assert_eq!(tree.children(root).len(), 2);
        assert!(tree.node(root).attributes().is_empty());
    }

    #[test]
    fn test_parse_strips_prefixes() {
        let tree = parse_tree(SAMPLE).expect("Failed to parse");
        let root = tree.root().expect("root");
        let campfire = tree.children(root)[0];
        assert_eq!(tree.tag(campfire), "global-type");
        assert_eq!(tree.attr(campfire, "meta"), Some("struct-type"));
        assert_eq!(tree.attr(campfire, "type-name"), Some("campfire"));

        let timer = tree.children(campfire)[1];
        assert_eq!(tree.attr(timer, "subtype"), Some("int32_t"));
        assert_eq!(tree.parent(timer), Some(campfire));
    }

    #[test]
    fn test_parse_unescapes_attributes() {
        let tree = parse_tree(SAMPLE).expect("Failed to parse");
        let campfire = tree.children(tree.root().expect("root"))[0];
        assert_eq!(tree.attr(campfire, "comment"), Some("a & b"));
    }

    #[test]
    fn test_parse_records_positions() {
        let tree = parse_tree(SAMPLE).expect("Failed to parse");
        let root = tree.root().expect("root");
        let first = tree.children(root)[0];
        let second = tree.children(root)[1];
        assert!(tree.node(first).position() > tree.node(root).position());
        assert!(tree.node(second).position() > tree.node(first).position());
    }

    #[test]
    fn test_parse_empty_document() {
        let result = parse_tree("<?xml version=\"1.0\"?>");
        assert!(matches!(result, Err(ParseError::InvalidStructure { .. })));
    }

    #[test]
    fn test_parse_malformed() {
        let result = parse_tree("<a><b></a>");
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_invalid_escape() {
        let result = parse_tree(r#"<a><b name="x &bogus; y"/></a>"#);
        assert!(matches!(result, Err(ParseError::InvalidAttribute { .. })));
    }

    #[test]
    fn test_parse_tree_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("df.xml");
        std::fs::write(&path, SAMPLE).expect("write");
        let tree = parse_tree_file(&path).expect("Failed to parse");
        assert_eq!(tree.len(), 6);
    }
}
