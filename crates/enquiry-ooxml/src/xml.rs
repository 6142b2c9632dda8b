/*
 * xml.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Owned XML trees for package parts
 */

//! Owned XML trees for package parts.
//!
//! Parts are parsed into a plain tree that keeps everything needed to write
//! them back faithfully: the declaration, element order, qualified names,
//! attribute order, whitespace text, comments and processing instructions.
//! Names keep their namespace prefix (`w:p`, `x14ac:dyDescent`); OOXML
//! producers use fixed prefixes, so matching on them is reliable.

use std::borrow::Cow;

use quick_xml::Reader;
use quick_xml::Writer;
use quick_xml::events::{BytesCData, BytesEnd, BytesPI, BytesStart, BytesText, Event};

use crate::error::{OoxmlError, OoxmlResult};

/// A node of an element's content.
#[derive(Debug, Clone, PartialEq)]
pub enum XmlNode {
    Element(XmlElement),
    Text(String),
    CData(String),
    Comment(String),
    ProcessingInstruction(String),
}

/// An element with its qualified name, attributes and content.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct XmlElement {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<XmlNode>,
}

impl XmlElement {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn with_attr(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set_attr(name, value);
        self
    }

    pub fn with_child(mut self, child: XmlElement) -> Self {
        self.children.push(XmlNode::Element(child));
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.children.push(XmlNode::Text(text.into()));
        self
    }

    /// The name without its namespace prefix.
    pub fn local_name(&self) -> &str {
        self.name.rsplit(':').next().unwrap_or(&self.name)
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Set an attribute, keeping its position when it already exists.
    pub fn set_attr(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attributes.iter_mut().find(|(key, _)| key == name) {
            Some((_, existing)) => *existing = value,
            None => self.attributes.push((name.to_string(), value)),
        }
    }

    pub fn remove_attr(&mut self, name: &str) {
        self.attributes.retain(|(key, _)| key != name);
    }

    /// Child elements, skipping text and other nodes.
    pub fn elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(|node| match node {
            XmlNode::Element(e) => Some(e),
            _ => None,
        })
    }

    pub fn elements_mut(&mut self) -> impl Iterator<Item = &mut XmlElement> {
        self.children.iter_mut().filter_map(|node| match node {
            XmlNode::Element(e) => Some(e),
            _ => None,
        })
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlElement> {
        self.elements().filter(move |e| e.name == name)
    }

    pub fn child(&self, name: &str) -> Option<&XmlElement> {
        self.elements().find(|e| e.name == name)
    }

    pub fn child_mut(&mut self, name: &str) -> Option<&mut XmlElement> {
        self.elements_mut().find(|e| e.name == name)
    }

    /// The child named `name`, appended when missing.
    pub fn child_or_insert(&mut self, name: &str) -> &mut XmlElement {
        let position = self
            .children
            .iter()
            .position(|node| matches!(node, XmlNode::Element(e) if e.name == name));
        let index = match position {
            Some(index) => index,
            None => {
                self.children.push(XmlNode::Element(XmlElement::new(name)));
                self.children.len() - 1
            }
        };
        match &mut self.children[index] {
            XmlNode::Element(e) => e,
            _ => unreachable!("index points at an element"),
        }
    }

    /// Remove every child element named `name`.
    pub fn remove_children(&mut self, name: &str) {
        self.children
            .retain(|node| !matches!(node, XmlNode::Element(e) if e.name == name));
    }

    /// Insert `child` before the first sibling that `order` ranks after it.
    /// Names missing from `order` are appended.
    pub fn insert_ordered(&mut self, child: XmlElement, order: &[&str]) {
        let rank = |name: &str| order.iter().position(|n| *n == name);
        let position = rank(&child.name).and_then(|own| {
            self.children.iter().position(|node| match node {
                XmlNode::Element(e) => rank(&e.name).is_some_and(|r| r > own),
                _ => false,
            })
        });
        let node = XmlNode::Element(child);
        match position {
            Some(index) => self.children.insert(index, node),
            None => self.children.push(node),
        }
    }

    /// The child named `name`, inserted in schema order when missing.
    pub fn child_or_insert_ordered(&mut self, name: &str, order: &[&str]) -> &mut XmlElement {
        if self.child(name).is_none() {
            self.insert_ordered(XmlElement::new(name), order);
        }
        self.child_or_insert(name)
    }

    /// Concatenated text of this element and its descendants.
    pub fn text(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        for node in &self.children {
            match node {
                XmlNode::Text(t) | XmlNode::CData(t) => out.push_str(t),
                XmlNode::Element(e) => e.collect_text(out),
                _ => {}
            }
        }
    }

    /// The first descendant named `name`, depth first.
    pub fn find(&self, name: &str) -> Option<&XmlElement> {
        for child in self.elements() {
            if child.name == name {
                return Some(child);
            }
            if let Some(found) = child.find(name) {
                return Some(found);
            }
        }
        None
    }

    /// Replace all content with a single text node.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.children = vec![XmlNode::Text(text.into())];
    }
}

/// A parsed part: optional declaration, nodes around the root, and the root.
#[derive(Debug, Clone, PartialEq)]
pub struct XmlDocument {
    /// Declaration content between `<?` and `?>`, e.g. `xml version="1.0"`.
    pub declaration: Option<String>,
    pub prolog: Vec<XmlNode>,
    pub root: XmlElement,
}

impl XmlDocument {
    pub fn new(root: XmlElement) -> Self {
        Self {
            declaration: Some(
                r#"xml version="1.0" encoding="UTF-8" standalone="yes""#.to_string(),
            ),
            prolog: vec![XmlNode::Text("\r\n".to_string())],
            root,
        }
    }

    /// Parse a part. `part` names it in errors.
    pub fn parse(content: &str, part: &str) -> OoxmlResult<Self> {
        let mut reader = Reader::from_str(content);
        reader.config_mut().trim_text_start = false;
        reader.config_mut().trim_text_end = false;

        let mut declaration = None;
        let mut prolog = Vec::new();
        let mut stack: Vec<XmlElement> = Vec::new();
        let mut root = None;

        loop {
            let event = reader.read_event().map_err(|e| OoxmlError::xml(part, e))?;
            let node = match event {
                Event::Decl(e) => {
                    declaration = Some(String::from_utf8_lossy(e.as_ref()).into_owned());
                    continue;
                }
                Event::Start(e) => {
                    stack.push(start_element(&e, part)?);
                    continue;
                }
                Event::End(_) => {
                    let element = stack
                        .pop()
                        .ok_or_else(|| OoxmlError::xml(part, "unexpected closing tag"))?;
                    XmlNode::Element(element)
                }
                Event::Empty(e) => XmlNode::Element(start_element(&e, part)?),
                Event::Text(e) => {
                    let text = e.unescape().map_err(|err| OoxmlError::xml(part, err))?;
                    XmlNode::Text(text.into_owned())
                }
                Event::CData(e) => XmlNode::CData(String::from_utf8_lossy(e.as_ref()).into_owned()),
                Event::Comment(e) => {
                    XmlNode::Comment(String::from_utf8_lossy(e.as_ref()).into_owned())
                }
                Event::PI(e) => {
                    XmlNode::ProcessingInstruction(String::from_utf8_lossy(e.as_ref()).into_owned())
                }
                Event::DocType(_) => continue,
                Event::Eof => break,
            };

            match stack.last_mut() {
                Some(parent) => parent.children.push(node),
                None => match node {
                    XmlNode::Element(element) if root.is_none() => root = Some(element),
                    XmlNode::Element(_) => {
                        return Err(OoxmlError::xml(part, "multiple root elements"));
                    }
                    other if root.is_none() => prolog.push(other),
                    _ => {}
                },
            }
        }

        if let Some(open) = stack.last() {
            return Err(OoxmlError::xml(
                part,
                format!("unclosed element <{}>", open.name),
            ));
        }
        let root = root.ok_or_else(|| OoxmlError::xml(part, "empty document"))?;

        Ok(Self {
            declaration,
            prolog,
            root,
        })
    }

    pub fn parse_bytes(bytes: &[u8], part: &str) -> OoxmlResult<Self> {
        let content = std::str::from_utf8(bytes).map_err(|e| OoxmlError::xml(part, e))?;
        Self::parse(content.strip_prefix('\u{feff}').unwrap_or(content), part)
    }

    /// Serialize the part.
    pub fn to_bytes(&self) -> OoxmlResult<Vec<u8>> {
        let mut out = Vec::new();
        if let Some(declaration) = &self.declaration {
            out.extend_from_slice(b"<?");
            out.extend_from_slice(declaration.as_bytes());
            out.extend_from_slice(b"?>");
        }
        let mut writer = Writer::new(out);
        for node in &self.prolog {
            write_node(&mut writer, node)?;
        }
        write_element(&mut writer, &self.root)?;
        Ok(writer.into_inner())
    }

    pub fn to_xml_string(&self) -> OoxmlResult<String> {
        let bytes = self.to_bytes()?;
        String::from_utf8(bytes).map_err(|e| OoxmlError::xml("(output)", e))
    }
}

fn start_element(e: &BytesStart<'_>, part: &str) -> OoxmlResult<XmlElement> {
    let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
    let mut attributes = Vec::new();
    for attr in e.attributes() {
        let attr = attr.map_err(|err| OoxmlError::xml(part, err))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|err| OoxmlError::xml(part, err))?;
        attributes.push((key, value.into_owned()));
    }
    Ok(XmlElement {
        name,
        attributes,
        children: Vec::new(),
    })
}

fn write_element(writer: &mut Writer<Vec<u8>>, element: &XmlElement) -> OoxmlResult<()> {
    let mut start = BytesStart::new(element.name.as_str());
    for (key, value) in &element.attributes {
        start.push_attribute((key.as_str(), value.as_str()));
    }

    if element.children.is_empty() {
        return emit(writer, Event::Empty(start));
    }

    emit(writer, Event::Start(start))?;
    for child in &element.children {
        write_node(writer, child)?;
    }
    emit(writer, Event::End(BytesEnd::new(element.name.as_str())))
}

fn write_node(writer: &mut Writer<Vec<u8>>, node: &XmlNode) -> OoxmlResult<()> {
    match node {
        XmlNode::Element(e) => write_element(writer, e),
        XmlNode::Text(t) => emit(writer, Event::Text(BytesText::new(t))),
        XmlNode::CData(t) => emit(writer, Event::CData(BytesCData::new(t.as_str()))),
        XmlNode::Comment(t) => emit(
            writer,
            Event::Comment(BytesText::from_escaped(Cow::Borrowed(t.as_str()))),
        ),
        XmlNode::ProcessingInstruction(t) => emit(writer, Event::PI(BytesPI::new(t.as_str()))),
    }
}

fn emit(writer: &mut Writer<Vec<u8>>, event: Event<'_>) -> OoxmlResult<()> {
    writer
        .write_event(event)
        .map_err(|e| OoxmlError::xml("(output)", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="urn:w"><!-- note --><w:body><w:p><w:r><w:t xml:space="preserve"> a &amp; b </w:t></w:r></w:p><w:sectPr/></w:body></w:document>"#;

    #[test]
    fn test_round_trip_keeps_structure() {
        let doc = XmlDocument::parse(SAMPLE, "word/document.xml").unwrap();
        assert_eq!(doc.root.name, "w:document");
        assert_eq!(doc.root.local_name(), "document");
        assert_eq!(doc.root.attr("xmlns:w"), Some("urn:w"));
        assert_eq!(doc.root.text(), " a & b ");

        let written = doc.to_xml_string().unwrap();
        insta::assert_snapshot!(written, @r#"
        <?xml version="1.0" encoding="UTF-8" standalone="yes"?>
        <w:document xmlns:w="urn:w"><!-- note --><w:body><w:p><w:r><w:t xml:space="preserve"> a &amp; b </w:t></w:r></w:p><w:sectPr/></w:body></w:document>
        "#);
    }

    #[test]
    fn test_find_and_child_or_insert() {
        let mut doc = XmlDocument::parse(SAMPLE, "word/document.xml").unwrap();
        assert!(doc.root.find("w:t").is_some());
        let body = doc.root.child_mut("w:body").unwrap();
        body.child_or_insert("w:sectPr").set_attr("w:rsidR", "00");
        assert_eq!(body.children_named("w:sectPr").count(), 1);
        body.remove_children("w:p");
        assert_eq!(body.elements().count(), 1);
    }

    #[test]
    fn test_insert_ordered() {
        let order = ["a", "b", "c"];
        let mut root = XmlElement::new("root")
            .with_child(XmlElement::new("a"))
            .with_child(XmlElement::new("c"));
        root.insert_ordered(XmlElement::new("b"), &order);
        root.child_or_insert_ordered("z", &order);
        let names: Vec<&str> = root.elements().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c", "z"]);
    }

    #[test]
    fn test_malformed_part() {
        let err = XmlDocument::parse("<a><b></a>", "xl/workbook.xml").unwrap_err();
        assert!(matches!(err, OoxmlError::XmlSyntax { .. }));
    }
}
