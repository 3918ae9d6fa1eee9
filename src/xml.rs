use crate::{ExportError, Result};
use quick_xml::events::Event;
use quick_xml::Reader;
use std::collections::BTreeSet;

// ── XmlElement ───────────────────────────────────────────────────────────────

/// One element of a parsed XML document.
///
/// The element keeps its qualified name exactly as written (namespace prefix
/// included), its direct text, and its child elements in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlElement {
    name: String,
    text: String,
    children: Vec<XmlElement>,
}

impl XmlElement {
    fn new(name: String) -> Self {
        Self {
            name,
            text: String::new(),
            children: Vec::new(),
        }
    }

    /// The qualified tag name, prefix included when one was written.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The element's direct text: the character data between the start tag
    /// and the first child element (or the end tag), untrimmed.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Child elements in document order.
    pub fn children(&self) -> &[XmlElement] {
        &self.children
    }

    fn collect_names(&self, out: &mut BTreeSet<String>) {
        out.insert(self.name.clone());
        for child in &self.children {
            child.collect_names(out);
        }
    }

    fn collect_texts(&self, tag: &str, out: &mut Vec<String>) {
        if self.name == tag {
            out.push(self.text.trim().to_string());
        }
        for child in &self.children {
            child.collect_texts(tag, out);
        }
    }
}

// ── XmlDocument ──────────────────────────────────────────────────────────────

/// A well-formed XML document parsed into an in-memory element tree.
///
/// Parsing enforces exactly one root element, balanced tags, and nothing but
/// whitespace (or comments/PIs) outside the root, so a successful parse
/// doubles as the well-formedness check used for classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlDocument {
    root: XmlElement,
}

impl XmlDocument {
    /// Parse a byte buffer into a document tree.
    ///
    /// Any malformation — including empty and binary payloads — is reported
    /// as [`ExportError::XmlParse`].
    pub fn parse(data: &[u8]) -> Result<Self> {
        let mut reader = Reader::from_reader(data);
        let mut buf = Vec::new();
        let mut stack: Vec<XmlElement> = Vec::new();
        let mut root: Option<XmlElement> = None;

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) => {
                    let name = decode(&reader, e.name().as_ref())?;
                    if stack.is_empty() && root.is_some() {
                        return Err(parse_error("more than one root element"));
                    }
                    stack.push(XmlElement::new(name));
                }
                Ok(Event::Empty(e)) => {
                    let name = decode(&reader, e.name().as_ref())?;
                    if stack.is_empty() && root.is_some() {
                        return Err(parse_error("more than one root element"));
                    }
                    close(&mut stack, &mut root, XmlElement::new(name));
                }
                Ok(Event::End(_)) => {
                    // Mismatched names are already rejected by the reader.
                    let elem = stack
                        .pop()
                        .ok_or_else(|| parse_error("closing tag without an open element"))?;
                    close(&mut stack, &mut root, elem);
                }
                Ok(Event::Text(t)) => {
                    let text = t
                        .unescape()
                        .map_err(|e| parse_error(&e.to_string()))?;
                    append_text(&mut stack, &text)?;
                }
                Ok(Event::CData(t)) => {
                    let text = decode(&reader, &t)?;
                    append_text(&mut stack, &text)?;
                }
                Ok(Event::Decl(_) | Event::Comment(_) | Event::PI(_) | Event::DocType(_)) => {}
                Ok(Event::Eof) => break,
                Err(e) => return Err(parse_error(&e.to_string())),
            }
            buf.clear();
        }

        if !stack.is_empty() {
            return Err(parse_error("unclosed element at end of input"));
        }
        match root {
            Some(root) => Ok(Self { root }),
            None => Err(parse_error("no root element")),
        }
    }

    /// The document's root element.
    pub fn root(&self) -> &XmlElement {
        &self.root
    }

    /// Insert the qualified name of every element — root, interior nodes and
    /// leaves — into `out`.
    pub fn collect_tag_names(&self, out: &mut BTreeSet<String>) {
        self.root.collect_names(out);
    }

    /// The set of qualified names of every element in the document.
    pub fn tag_names(&self) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        self.collect_tag_names(&mut out);
        out
    }

    /// Trimmed direct text of every descendant of the root matching `tag`,
    /// at any depth, in document order.
    ///
    /// Matching is by qualified tag name only, not by structural path, and
    /// the root element itself is never a match.
    pub fn texts_below(&self, tag: &str) -> Vec<String> {
        let mut out = Vec::new();
        for child in &self.root.children {
            child.collect_texts(tag, &mut out);
        }
        out
    }
}

// ── Parse helpers ────────────────────────────────────────────────────────────

fn parse_error(message: &str) -> ExportError {
    ExportError::XmlParse(message.into())
}

fn decode(reader: &Reader<&[u8]>, bytes: &[u8]) -> Result<String> {
    reader
        .decoder()
        .decode(bytes)
        .map(|s| s.into_owned())
        .map_err(|e| parse_error(&e.to_string()))
}

/// A finished element joins its parent, or becomes the root at depth zero.
fn close(stack: &mut Vec<XmlElement>, root: &mut Option<XmlElement>, elem: XmlElement) {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(elem);
    } else {
        *root = Some(elem);
    }
}

/// Character data belongs to the innermost open element, but only before its
/// first child; non-whitespace text outside the root is a malformation.
fn append_text(stack: &mut Vec<XmlElement>, text: &str) -> Result<()> {
    match stack.last_mut() {
        Some(parent) => {
            if parent.children.is_empty() {
                parent.text.push_str(text);
            }
        }
        None => {
            if !text.trim().is_empty() {
                return Err(parse_error("text outside the root element"));
            }
        }
    }
    Ok(())
}
