//! Owned XML element tree for package parts that get rewritten.
//!
//! Text, CDATA, comments and processing instructions are kept raw (still
//! escaped) so untouched content is written back as it was read.

use deckstyle_core::{Error, Result};
use quick_xml::events::attributes::Attribute;
use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::name::QName;
use quick_xml::{Reader, Writer};
use std::borrow::Cow;

/// DrawingML main namespace.
pub const NS_DRAWINGML: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";

/// A node inside an element.
#[derive(Debug, Clone, PartialEq)]
pub enum XmlNode {
    Element(XmlElement),
    /// Escaped character data.
    Text(String),
    CData(String),
    Comment(String),
    ProcessingInstruction(String),
}

/// An attribute with its unescaped value.
///
/// `raw` holds the value exactly as it appeared in the part and is dropped
/// once the value is replaced, so unedited attributes are written back
/// byte for byte.
#[derive(Debug, Clone)]
pub struct XmlAttribute {
    pub key: String,
    pub value: String,
    raw: Option<String>,
}

impl XmlAttribute {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            raw: None,
        }
    }

    /// The value in its escaped, writable form.
    pub fn escaped_value(&self) -> Cow<'_, str> {
        match &self.raw {
            // Values read from single-quoted attributes may hold a bare `"`.
            Some(raw) if !raw.contains('"') => Cow::Borrowed(raw.as_str()),
            _ => escape_attribute(&self.value),
        }
    }
}

impl PartialEq for XmlAttribute {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key && self.value == other.value
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct XmlElement {
    /// Qualified name as written, e.g. `a:rPr`.
    pub name: String,
    /// Attributes in document order.
    pub attributes: Vec<XmlAttribute>,
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

    /// Builder-style attribute.
    pub fn with_attr(mut self, key: &str, value: impl Into<String>) -> Self {
        self.set_attr(key, value);
        self
    }

    /// Builder-style child element.
    pub fn with_child(mut self, child: XmlElement) -> Self {
        self.children.push(XmlNode::Element(child));
        self
    }

    pub fn local_name(&self) -> &str {
        local_name(&self.name)
    }

    /// Namespace prefix including the colon (`"a:"`), or `""`.
    pub fn prefix(&self) -> &str {
        match self.name.find(':') {
            Some(pos) => &self.name[..=pos],
            None => "",
        }
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.key == key)
            .map(|a| a.value.as_str())
    }

    pub fn set_attr(&mut self, key: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attributes.iter_mut().find(|a| a.key == key) {
            Some(slot) if slot.value == value => {}
            Some(slot) => {
                slot.value = value;
                slot.raw = None;
            }
            None => self.attributes.push(XmlAttribute::new(key, value)),
        }
    }

    pub fn remove_attr(&mut self, key: &str) {
        self.attributes.retain(|a| a.key != key);
    }

    /// Child elements in document order.
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

    /// First child element with the given local name.
    pub fn child(&self, local: &str) -> Option<&XmlElement> {
        self.elements().find(|e| e.local_name() == local)
    }

    pub fn child_mut(&mut self, local: &str) -> Option<&mut XmlElement> {
        self.elements_mut().find(|e| e.local_name() == local)
    }

    /// Index into `children` of the first element with the given local name.
    pub fn child_position(&self, local: &str) -> Option<usize> {
        self.children
            .iter()
            .position(|node| matches!(node, XmlNode::Element(e) if e.local_name() == local))
    }

    /// Remove every child element whose local name is in `locals`.
    pub fn remove_children(&mut self, locals: &[&str]) {
        self.children.retain(|node| match node {
            XmlNode::Element(e) => !locals.contains(&e.local_name()),
            _ => true,
        });
    }

    pub fn insert_child(&mut self, index: usize, child: XmlElement) {
        let index = index.min(self.children.len());
        self.children.insert(index, XmlNode::Element(child));
    }

    /// Unescaped concatenation of the direct text and CDATA children.
    pub fn text(&self) -> Result<String> {
        let mut out = String::new();
        for node in &self.children {
            match node {
                XmlNode::Text(raw) => {
                    let text = quick_xml::escape::unescape(raw)
                        .map_err(|e| Error::XmlError(format!("Bad escape in text: {}", e)))?;
                    out.push_str(&text);
                }
                XmlNode::CData(raw) => out.push_str(raw),
                _ => {}
            }
        }
        Ok(out)
    }

    /// Prefix (with colon) declared for `namespace` on this element.
    pub fn namespace_prefix(&self, namespace: &str) -> Option<String> {
        self.attributes.iter().find_map(|attr| {
            if attr.value != namespace {
                return None;
            }
            if attr.key == "xmlns" {
                Some(String::new())
            } else {
                attr.key.strip_prefix("xmlns:").map(|p| format!("{}:", p))
            }
        })
    }
}

/// XML declaration fields.
#[derive(Debug, Clone, PartialEq)]
pub struct XmlDeclaration {
    pub version: String,
    pub encoding: Option<String>,
    pub standalone: Option<String>,
}

/// A parsed XML part.
#[derive(Debug, Clone, PartialEq)]
pub struct XmlDocument {
    pub declaration: Option<XmlDeclaration>,
    /// Nodes between the declaration and the root element.
    pub prolog: Vec<XmlNode>,
    pub root: XmlElement,
}

impl XmlDocument {
    pub fn parse(content: &str) -> Result<Self> {
        let mut reader = Reader::from_str(content);

        let mut declaration = None;
        let mut prolog = Vec::new();
        let mut stack: Vec<XmlElement> = Vec::new();
        let mut root: Option<XmlElement> = None;

        loop {
            let event = reader.read_event().map_err(|e| {
                Error::XmlError(format!(
                    "Error at position {}: {}",
                    reader.buffer_position(),
                    e
                ))
            })?;

            match event {
                Event::Decl(ref d) => declaration = Some(read_declaration(d)?),
                Event::Start(ref e) => stack.push(read_start(e)?),
                Event::Empty(ref e) => {
                    let element = read_start(e)?;
                    attach(&mut stack, &mut root, &mut prolog, XmlNode::Element(element))?;
                }
                Event::End(_) => {
                    let element = stack
                        .pop()
                        .ok_or_else(|| Error::XmlError("Unbalanced end tag".to_string()))?;
                    attach(&mut stack, &mut root, &mut prolog, XmlNode::Element(element))?;
                }
                Event::Text(ref t) => {
                    let raw = String::from_utf8_lossy(t).into_owned();
                    attach(&mut stack, &mut root, &mut prolog, XmlNode::Text(raw))?;
                }
                Event::CData(ref t) => {
                    let raw = String::from_utf8_lossy(t).into_owned();
                    attach(&mut stack, &mut root, &mut prolog, XmlNode::CData(raw))?;
                }
                Event::Comment(ref t) => {
                    let raw = String::from_utf8_lossy(t).into_owned();
                    attach(&mut stack, &mut root, &mut prolog, XmlNode::Comment(raw))?;
                }
                Event::PI(ref t) => {
                    let raw = String::from_utf8_lossy(t).into_owned();
                    attach(
                        &mut stack,
                        &mut root,
                        &mut prolog,
                        XmlNode::ProcessingInstruction(raw),
                    )?;
                }
                Event::DocType(_) => {
                    log::warn!("Ignoring DOCTYPE in package part");
                }
                Event::Eof => break,
            }
        }

        if !stack.is_empty() {
            return Err(Error::XmlError(format!(
                "Unclosed element <{}>",
                stack[stack.len() - 1].name
            )));
        }
        let root = root.ok_or_else(|| Error::XmlError("Document has no root element".to_string()))?;

        Ok(Self {
            declaration,
            prolog,
            root,
        })
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut writer = Writer::new(Vec::new());

        if let Some(decl) = &self.declaration {
            writer
                .write_event(Event::Decl(BytesDecl::new(
                    &decl.version,
                    decl.encoding.as_deref(),
                    decl.standalone.as_deref(),
                )))
                .map_err(write_error)?;
        }
        for node in &self.prolog {
            write_node(&mut writer, node)?;
        }
        write_element(&mut writer, &self.root)?;

        Ok(writer.into_inner())
    }
}

fn write_error(e: quick_xml::Error) -> Error {
    Error::XmlError(format!("Failed to write XML: {}", e))
}

fn read_declaration(decl: &BytesDecl<'_>) -> Result<XmlDeclaration> {
    let text = |bytes: &[u8]| String::from_utf8_lossy(bytes).into_owned();
    let version = decl
        .version()
        .map_err(|e| Error::XmlError(format!("Bad XML declaration: {}", e)))?;

    Ok(XmlDeclaration {
        version: text(&version),
        encoding: decl.encoding().and_then(|r| r.ok()).map(|v| text(&v)),
        standalone: decl.standalone().and_then(|r| r.ok()).map(|v| text(&v)),
    })
}

fn read_start(start: &BytesStart<'_>) -> Result<XmlElement> {
    let mut element = XmlElement::new(String::from_utf8_lossy(start.name().as_ref()).into_owned());

    for attr in start.attributes() {
        let attr = attr.map_err(|e| Error::XmlError(format!("Bad attribute: {}", e)))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|e| Error::XmlError(format!("Bad attribute value for {}: {}", key, e)))?
            .into_owned();
        let raw = String::from_utf8_lossy(&attr.value).into_owned();
        element.attributes.push(XmlAttribute {
            key,
            value,
            raw: Some(raw),
        });
    }

    Ok(element)
}

/// Append a finished node to the open element, or to the document level.
fn attach(
    stack: &mut [XmlElement],
    root: &mut Option<XmlElement>,
    prolog: &mut Vec<XmlNode>,
    node: XmlNode,
) -> Result<()> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(node);
        return Ok(());
    }

    match node {
        XmlNode::Element(element) => {
            if root.is_some() {
                return Err(Error::XmlError(format!(
                    "Second root element <{}>",
                    element.name
                )));
            }
            *root = Some(element);
        }
        // Trailing whitespace after the root is dropped.
        other if root.is_none() => prolog.push(other),
        _ => {}
    }
    Ok(())
}

fn write_node<W: std::io::Write>(writer: &mut Writer<W>, node: &XmlNode) -> Result<()> {
    let event = match node {
        XmlNode::Element(element) => return write_element(writer, element),
        XmlNode::Text(raw) => Event::Text(BytesText::from_escaped(raw.as_str())),
        XmlNode::CData(raw) => Event::CData(BytesCData::new(raw.as_str())),
        XmlNode::Comment(raw) => Event::Comment(BytesText::from_escaped(raw.as_str())),
        XmlNode::ProcessingInstruction(raw) => Event::PI(BytesText::from_escaped(raw.as_str())),
    };
    writer.write_event(event).map_err(write_error)
}

fn write_element<W: std::io::Write>(writer: &mut Writer<W>, element: &XmlElement) -> Result<()> {
    let mut start = BytesStart::new(element.name.as_str());
    for attr in &element.attributes {
        let value = attr.escaped_value();
        start.push_attribute(Attribute {
            key: QName(attr.key.as_bytes()),
            value: Cow::Borrowed(value.as_bytes()),
        });
    }

    if element.children.is_empty() {
        return writer.write_event(Event::Empty(start)).map_err(write_error);
    }

    writer.write_event(Event::Start(start)).map_err(write_error)?;
    for child in &element.children {
        write_node(writer, child)?;
    }
    writer
        .write_event(Event::End(BytesEnd::new(element.name.as_str())))
        .map_err(write_error)
}

/// Escape an attribute value, including the whitespace characters that
/// attribute value normalization would otherwise turn into spaces.
fn escape_attribute(value: &str) -> Cow<'_, str> {
    if !value.contains(['<', '>', '&', '\'', '"', '\n', '\r', '\t']) {
        return Cow::Borrowed(value);
    }

    let mut out = String::with_capacity(value.len() + 8);
    for c in value.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            '\'' => out.push_str("&apos;"),
            '"' => out.push_str("&quot;"),
            '\n' => out.push_str("&#xA;"),
            '\r' => out.push_str("&#xD;"),
            '\t' => out.push_str("&#x9;"),
            c => out.push(c),
        }
    }
    Cow::Owned(out)
}

/// Extract the local name from a potentially namespaced XML element name.
pub fn local_name(name: &str) -> &str {
    match name.find(':') {
        Some(pos) => &name[pos + 1..],
        None => name,
    }
}
