//! Generic XML tree for SOAP envelopes.
//!
//! Responses from devices are decoded into an [`XmlElement`] tree with
//! namespace prefixes stripped, then queried with dotted paths such as
//! `Envelope.Body.Fault.Reason.Text`.  Namespace declarations are dropped;
//! other attributes are kept by local name.
//!
//! When several siblings share a name, path lookup follows the first one.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use thiserror::Error;

/// The document could not be decoded.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum XmlError {
    /// No root element was found.
    #[error("document contains no root element")]
    Empty,

    /// The XML is syntactically invalid.
    #[error("invalid XML at byte {position}: {message}")]
    Syntax { position: usize, message: String },

    /// The input ended while elements were still open.
    #[error("document ended inside <{0}>")]
    Unclosed(String),

    /// A second top-level element followed the root.
    #[error("unexpected second root element <{0}>")]
    MultipleRoots(String),
}

/// One element of a decoded document.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct XmlElement {
    /// Local name, without namespace prefix.
    pub name: String,
    /// Attributes as `(local name, unescaped value)`, in document order.
    pub attributes: Vec<(String, String)>,
    /// Concatenated character data, trimmed.
    pub text: String,
    pub children: Vec<XmlElement>,
}

impl XmlElement {
    /// First child element with the given local name.
    pub fn child(&self, name: &str) -> Option<&XmlElement> {
        self.children.iter().find(|c| c.name == name)
    }

    /// All child elements with the given local name.
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlElement> {
        self.children.iter().filter(move |c| c.name == name)
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// A decoded SOAP (or WS-Discovery) document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedEnvelope {
    root: XmlElement,
}

impl ParsedEnvelope {
    /// Decodes `bytes` into a tree.
    ///
    /// # Errors
    ///
    /// Returns [`XmlError`] if the input is not a single well-formed element tree.
    pub fn parse(bytes: &[u8]) -> Result<Self, XmlError> {
        let mut reader = Reader::from_reader(bytes);
        let mut buf = Vec::new();
        let mut stack: Vec<XmlElement> = Vec::new();
        let mut root: Option<XmlElement> = None;

        loop {
            let event = reader
                .read_event_into(&mut buf)
                .map_err(|e| syntax_error(&reader, e))?;

            match event {
                Event::Start(start) => {
                    let element = open_element(&reader, &start)?;
                    if stack.is_empty() && root.is_some() {
                        return Err(XmlError::MultipleRoots(element.name));
                    }
                    stack.push(element);
                }
                Event::Empty(start) => {
                    let element = open_element(&reader, &start)?;
                    close_element(element, &mut stack, &mut root)?;
                }
                Event::End(_) => {
                    let mut element = stack.pop().ok_or_else(|| XmlError::Syntax {
                        position: reader.buffer_position() as usize,
                        message: "closing tag without matching opening tag".to_string(),
                    })?;
                    element.text = element.text.trim().to_string();
                    close_element(element, &mut stack, &mut root)?;
                }
                Event::Text(text) => {
                    if let Some(current) = stack.last_mut() {
                        let text = text.unescape().map_err(|e| syntax_error(&reader, e))?;
                        current.text.push_str(&text);
                    }
                }
                Event::CData(data) => {
                    if let Some(current) = stack.last_mut() {
                        current.text.push_str(&String::from_utf8_lossy(&data.into_inner()));
                    }
                }
                Event::Eof => break,
                // Declarations, comments, processing instructions, doctype.
                _ => {}
            }
            buf.clear();
        }

        if let Some(open) = stack.pop() {
            return Err(XmlError::Unclosed(open.name));
        }
        root.map(|root| Self { root }).ok_or(XmlError::Empty)
    }

    pub fn root(&self) -> &XmlElement {
        &self.root
    }

    /// Follows a dotted path whose first segment names the root element.
    pub fn find(&self, path: &str) -> Option<&XmlElement> {
        let mut segments = path.split('.');
        if segments.next()? != self.root.name {
            return None;
        }
        segments.try_fold(&self.root, |node, segment| node.child(segment))
    }

    /// Text content at `path`, or `None` when the path does not exist.
    pub fn value_for_path(&self, path: &str) -> Option<&str> {
        self.find(path).map(|e| e.text.as_str())
    }
}

fn open_element<R>(reader: &Reader<R>, start: &BytesStart<'_>) -> Result<XmlElement, XmlError> {
    let name = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();
    let mut attributes = Vec::new();
    for attr in start.attributes() {
        let attr = attr.map_err(|e| XmlError::Syntax {
            position: reader.buffer_position() as usize,
            message: e.to_string(),
        })?;
        let key = attr.key.as_ref();
        if key == b"xmlns" || key.starts_with(b"xmlns:") {
            continue;
        }
        let value = attr
            .unescape_value()
            .map_err(|e| syntax_error(reader, e))?
            .into_owned();
        attributes.push((
            String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned(),
            value,
        ));
    }
    Ok(XmlElement {
        name,
        attributes,
        ..Default::default()
    })
}

fn close_element(
    element: XmlElement,
    stack: &mut [XmlElement],
    root: &mut Option<XmlElement>,
) -> Result<(), XmlError> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None if root.is_some() => return Err(XmlError::MultipleRoots(element.name)),
        None => *root = Some(element),
    }
    Ok(())
}

fn syntax_error<R>(reader: &Reader<R>, e: quick_xml::Error) -> XmlError {
    XmlError::Syntax {
        position: reader.buffer_position() as usize,
        message: e.to_string(),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
