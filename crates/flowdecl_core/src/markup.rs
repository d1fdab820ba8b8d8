//! Generic XML element tree.
//!
//! Declaration files are read into a small owned tree of [`Element`]s and
//! written back from it. Only what the document model needs survives a round
//! trip: element names, attributes in their original order, merged text
//! content and nested elements. Comments, processing instructions and
//! insignificant whitespace are dropped.

use indexmap::IndexMap;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use serde::{Deserialize, Serialize};

use crate::error::{FlowdeclError, Result};

/// A single XML element.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Element {
    /// Tag name, including any namespace prefix.
    pub name: String,
    /// Attributes in document order.
    pub attributes: IndexMap<String, String>,
    /// Text and CDATA content, merged and trimmed. `None` when empty.
    pub text: Option<String>,
    /// Nested elements in document order.
    pub children: Vec<Element>,
}

impl Element {
    /// Create an empty element with the given tag name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// First direct child with the given tag name.
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }
}

/// Returns true if `name` can be used as an XML tag or attribute name.
///
/// This is the ASCII subset of the XML `Name` production plus any non-ASCII
/// character, which is what declaration files use in practice.
pub fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if !(first.is_alphabetic() || first == '_' || first == ':') {
        return false;
    }
    chars.all(|c| c.is_alphanumeric() || matches!(c, '_' | ':' | '-' | '.') || !c.is_ascii())
}

fn parse_error(position: usize, message: impl Into<String>) -> FlowdeclError {
    FlowdeclError::Parse {
        position,
        message: message.into(),
    }
}

fn start_element(start: &BytesStart, position: usize) -> Result<Element> {
    let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
    let mut element = Element::new(name);

    for attr in start.attributes() {
        let attr = attr.map_err(|e| parse_error(position, format!("attribute error: {e}")))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|e| parse_error(position, format!("attribute '{key}': {e}")))?
            .into_owned();
        element.attributes.insert(key, value);
    }

    Ok(element)
}

fn push_text(element: &mut Element, text: &str) {
    let text = text.trim();
    if text.is_empty() {
        return;
    }
    match &mut element.text {
        Some(existing) => existing.push_str(text),
        None => element.text = Some(text.to_string()),
    }
}

/// Parse XML text into its root element.
pub fn parse(xml: &str) -> Result<Element> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        let position = reader.buffer_position();
        let event = reader
            .read_event()
            .map_err(|e| parse_error(position, e.to_string()))?;

        match event {
            Event::Start(ref e) => {
                if root.is_some() {
                    return Err(parse_error(position, "content after the root element"));
                }
                stack.push(start_element(e, position)?);
            }
            Event::Empty(ref e) => {
                let element = start_element(e, position)?;
                match stack.last_mut() {
                    Some(parent) => parent.children.push(element),
                    None if root.is_none() => root = Some(element),
                    None => return Err(parse_error(position, "content after the root element")),
                }
            }
            Event::End(_) => {
                let Some(element) = stack.pop() else {
                    return Err(parse_error(position, "unexpected closing tag"));
                };
                match stack.last_mut() {
                    Some(parent) => parent.children.push(element),
                    None => root = Some(element),
                }
            }
            Event::Text(ref e) => {
                let text = e
                    .unescape()
                    .map_err(|err| parse_error(position, err.to_string()))?;
                match stack.last_mut() {
                    Some(current) => push_text(current, &text),
                    None => return Err(parse_error(position, "text outside the root element")),
                }
            }
            Event::CData(e) => {
                let raw = e.into_inner();
                let text = String::from_utf8_lossy(&raw);
                match stack.last_mut() {
                    Some(current) => push_text(current, &text),
                    None => return Err(parse_error(position, "CDATA outside the root element")),
                }
            }
            Event::Eof => break,
            // Declarations, comments, processing instructions and doctypes
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(parse_error(
            reader.buffer_position(),
            format!("unclosed element '{}'", open.name),
        ));
    }

    root.ok_or_else(|| parse_error(0, "document has no root element"))
}

fn write_element<W: std::io::Write>(writer: &mut Writer<W>, element: &Element) -> Result<()> {
    let mut start = BytesStart::new(element.name.as_str());
    for (key, value) in &element.attributes {
        start.push_attribute((key.as_str(), value.as_str()));
    }

    if element.text.is_none() && element.children.is_empty() {
        writer.write_event(Event::Empty(start))?;
        return Ok(());
    }

    writer.write_event(Event::Start(start))?;
    if let Some(text) = &element.text {
        writer.write_event(Event::Text(BytesText::new(text)))?;
    }
    for child in &element.children {
        write_element(writer, child)?;
    }
    writer.write_event(Event::End(BytesEnd::new(element.name.as_str())))?;
    Ok(())
}

/// Serialize a root element to XML text with a declaration and the given
/// indentation width.
pub fn serialize(root: &Element, indent: usize) -> Result<String> {
    let mut writer = if indent == 0 {
        Writer::new(Vec::new())
    } else {
        Writer::new_with_indent(Vec::new(), b' ', indent)
    };

    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    write_element(&mut writer, root)?;

    let mut out = String::from_utf8_lossy(&writer.into_inner()).into_owned();
    out.push('\n');
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_nested_elements() {
        let xml = r#"<?xml version="1.0"?>
<Object kind="flow">
  <ElementFields>
    <Name>Mover</Name>
    <Folder Editor="inline" Default="out"/>
  </ElementFields>
</Object>"#;
        let root = parse(xml).unwrap();
        assert_eq!(root.name, "Object");
        assert_eq!(root.attributes.get("kind").map(String::as_str), Some("flow"));

        let fields = root.child("ElementFields").unwrap();
        assert_eq!(fields.children.len(), 2);
        assert_eq!(fields.children[0].text.as_deref(), Some("Mover"));
        let folder = &fields.children[1];
        let keys: Vec<_> = folder.attributes.keys().collect();
        assert_eq!(keys, vec!["Editor", "Default"]);
        assert!(folder.text.is_none());
    }

    #[test]
    fn test_parse_unescapes_attributes_and_text() {
        let root = parse(r#"<A tip="a &lt; b &amp; &quot;c&quot;">x &gt; y<![CDATA[ <raw> ]]></A>"#)
            .unwrap();
        assert_eq!(root.attributes["tip"], r#"a < b & "c""#);
        assert_eq!(root.text.as_deref(), Some("x > y<raw>"));
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(matches!(parse("<A><B></A>"), Err(FlowdeclError::Parse { .. })));
        assert!(matches!(parse("<A><B>"), Err(FlowdeclError::Parse { .. })));
        assert!(matches!(parse(""), Err(FlowdeclError::Parse { .. })));
        assert!(matches!(parse(r#"<A x="1" x="2"/>"#), Err(FlowdeclError::Parse { .. })));
        assert!(matches!(parse("<A/><B/>"), Err(FlowdeclError::Parse { .. })));
    }

    #[test]
    fn test_serialize_escapes_and_reparses() {
        let mut root = Element::new("Object");
        let mut child = Element::new("Prop");
        child
            .attributes
            .insert("Tooltip".into(), r#"use "quotes" & <tags>"#.into());
        child.text = Some("1 < 2".into());
        root.children.push(child);
        root.children.push(Element::new("Empty"));

        let xml = serialize(&root, 2).unwrap();
        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(xml.contains("<Empty/>"));

        let back = parse(&xml).unwrap();
        assert_eq!(back, root);
    }

    #[test]
    fn test_is_valid_name() {
        assert!(is_valid_name("Folder"));
        assert!(is_valid_name("_private"));
        assert!(is_valid_name("Folder-2.b"));
        assert!(!is_valid_name(""));
        assert!(!is_valid_name("2fast"));
        assert!(!is_valid_name("has space"));
        assert!(is_valid_name("xmlThing"));
        assert!(is_valid_name("XMLOutput"));
        assert!(!is_valid_name("a<b"));
    }
}
