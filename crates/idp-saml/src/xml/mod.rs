//! Namespace-aware XML element tree.
//!
//! SAML processing needs two things the streaming reader does not give
//! directly: lookups by namespace URI regardless of prefix, and a stable tree
//! to canonicalize for signatures. Documents here are small (a few KB), so the
//! whole document is materialized.

mod c14n;

pub use c14n::{canonicalize, canonicalize_excluding};

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::{SamlError, SamlResult};

/// The namespace bound to the reserved `xml` prefix.
pub const XML_NS: &str = "http://www.w3.org/XML/1998/namespace";

/// A namespace declaration (`xmlns` or `xmlns:prefix`) as written on an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceDecl {
    /// Declared prefix, `None` for the default namespace.
    pub prefix: Option<String>,
    /// Namespace URI. Empty undeclares the default namespace.
    pub uri: String,
}

/// An attribute with its resolved namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// Prefix as written.
    pub prefix: Option<String>,
    /// Local name.
    pub local_name: String,
    /// Resolved namespace. Unprefixed attributes have none.
    pub namespace: Option<String>,
    /// Unescaped value.
    pub value: String,
}

/// A child node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// Child element.
    Element(Element),
    /// Character data, unescaped.
    Text(String),
}

/// An element with its resolved namespace and children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    /// Prefix as written.
    pub prefix: Option<String>,
    /// Local name.
    pub local_name: String,
    /// Resolved namespace URI.
    pub namespace: Option<String>,
    /// Namespace declarations written on this element.
    pub namespace_decls: Vec<NamespaceDecl>,
    /// Ordinary attributes in document order.
    pub attributes: Vec<Attribute>,
    /// Children in document order.
    pub children: Vec<Node>,
}

impl Element {
    /// Returns true if this element has the given namespace and local name.
    #[must_use]
    pub fn is(&self, namespace: &str, local_name: &str) -> bool {
        self.local_name == local_name && self.namespace.as_deref() == Some(namespace)
    }

    /// Returns the value of an unqualified attribute.
    #[must_use]
    pub fn attribute(&self, local_name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.namespace.is_none() && a.local_name == local_name)
            .map(|a| a.value.as_str())
    }

    /// Iterates over child elements.
    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(e) => Some(e),
            Node::Text(_) => None,
        })
    }

    /// Returns the first child element with the given namespace and local name.
    #[must_use]
    pub fn child(&self, namespace: &str, local_name: &str) -> Option<&Element> {
        self.child_elements().find(|e| e.is(namespace, local_name))
    }

    /// Concatenated text of the direct text children.
    #[must_use]
    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|node| match node {
                Node::Text(t) => Some(t.as_str()),
                Node::Element(_) => None,
            })
            .collect()
    }

    /// Finds this element or a descendant whose `ID` attribute equals `id`.
    #[must_use]
    pub fn find_by_id(&self, id: &str) -> Option<&Element> {
        if self.attribute("ID") == Some(id) {
            return Some(self);
        }
        self.child_elements().find_map(|child| child.find_by_id(id))
    }

    /// Finds the first descendant (depth first, self included) matching the name.
    #[must_use]
    pub fn find(&self, namespace: &str, local_name: &str) -> Option<&Element> {
        if self.is(namespace, local_name) {
            return Some(self);
        }
        self.child_elements()
            .find_map(|child| child.find(namespace, local_name))
    }

    /// Returns the name as written, `prefix:local` or `local`.
    #[must_use]
    pub fn qualified_name(&self) -> String {
        qualified(self.prefix.as_deref(), &self.local_name)
    }
}

impl Attribute {
    /// Returns the name as written.
    #[must_use]
    pub fn qualified_name(&self) -> String {
        qualified(self.prefix.as_deref(), &self.local_name)
    }
}

fn qualified(prefix: Option<&str>, local_name: &str) -> String {
    match prefix {
        Some(p) => format!("{p}:{local_name}"),
        None => local_name.to_string(),
    }
}

/// In-scope namespace bindings while reading.
struct Scopes {
    frames: Vec<Vec<NamespaceDecl>>,
}

impl Scopes {
    fn new() -> Self {
        Self {
            frames: vec![vec![NamespaceDecl {
                prefix: Some("xml".to_string()),
                uri: XML_NS.to_string(),
            }]],
        }
    }

    fn resolve(&self, prefix: Option<&str>) -> Option<&str> {
        self.frames
            .iter()
            .rev()
            .flat_map(|frame| frame.iter().rev())
            .find(|decl| decl.prefix.as_deref() == prefix)
            .map(|decl| decl.uri.as_str())
            .filter(|uri| !uri.is_empty())
    }
}

/// Parses a document and returns its root element.
///
/// The XML declaration, comments and processing instructions are dropped.
/// Documents with a DTD are rejected. Line endings are normalized to `\n`
/// and literal whitespace in attribute values to spaces, as an XML processor
/// must before canonicalization.
///
/// # Errors
///
/// Returns [`SamlError::MalformedRequest`] for malformed XML, unbound prefixes
/// or a missing root element.
pub fn parse(xml: &str) -> SamlResult<Element> {
    let xml = normalize_line_endings(xml);
    let mut reader = Reader::from_str(&xml);
    let mut scopes = Scopes::new();
    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        match reader.read_event()? {
            Event::Start(start) => {
                let element = open_element(&start, &mut scopes)?;
                stack.push(element);
            }
            Event::Empty(start) => {
                let element = open_element(&start, &mut scopes)?;
                scopes.frames.pop();
                attach(element, &mut stack, &mut root)?;
            }
            Event::End(_) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| SamlError::MalformedRequest("unbalanced end tag".to_string()))?;
                scopes.frames.pop();
                attach(element, &mut stack, &mut root)?;
            }
            Event::Text(text) => {
                let text = text.unescape()?;
                push_text(&mut stack, &text)?;
            }
            Event::CData(cdata) => {
                let text = std::str::from_utf8(&cdata)
                    .map_err(|e| SamlError::MalformedRequest(e.to_string()))?;
                push_text(&mut stack, text)?;
            }
            Event::DocType(_) => {
                return Err(SamlError::MalformedRequest(
                    "document type declarations are not allowed".to_string(),
                ));
            }
            Event::Eof => break,
            Event::Decl(_) | Event::PI(_) | Event::Comment(_) => {}
        }
    }

    if !stack.is_empty() {
        return Err(SamlError::MalformedRequest("unclosed element".to_string()));
    }
    root.ok_or_else(|| SamlError::MalformedRequest("no root element".to_string()))
}

fn normalize_line_endings(xml: &str) -> std::borrow::Cow<'_, str> {
    if xml.contains('\r') {
        xml.replace("\r\n", "\n").replace('\r', "\n").into()
    } else {
        xml.into()
    }
}

fn open_element(start: &BytesStart<'_>, scopes: &mut Scopes) -> SamlResult<Element> {
    let (prefix, local_name) = split_name(start.name().as_ref())?;

    let mut namespace_decls = Vec::new();
    let mut raw_attributes = Vec::new();
    for attr in start.attributes() {
        let attr = attr.map_err(|e| SamlError::MalformedRequest(e.to_string()))?;
        let raw = std::str::from_utf8(&attr.value)
            .map_err(|e| SamlError::MalformedRequest(e.to_string()))?;
        let value = quick_xml::escape::unescape(&raw.replace(['\t', '\n'], " "))
            .map_err(|e| SamlError::MalformedRequest(e.to_string()))?
            .into_owned();
        let (attr_prefix, attr_local) = split_name(attr.key.as_ref())?;
        match (attr_prefix.as_deref(), attr_local.as_str()) {
            (None, "xmlns") => namespace_decls.push(NamespaceDecl {
                prefix: None,
                uri: value,
            }),
            (Some("xmlns"), declared) => namespace_decls.push(NamespaceDecl {
                prefix: Some(declared.to_string()),
                uri: value,
            }),
            _ => raw_attributes.push((attr_prefix, attr_local, value)),
        }
    }
    scopes.frames.push(namespace_decls.clone());

    let namespace = scopes.resolve(prefix.as_deref()).map(String::from);
    if prefix.is_some() && namespace.is_none() {
        return Err(SamlError::MalformedRequest(format!(
            "unbound prefix on element {}",
            qualified(prefix.as_deref(), &local_name)
        )));
    }

    let mut attributes = Vec::with_capacity(raw_attributes.len());
    for (attr_prefix, attr_local, value) in raw_attributes {
        let attr_namespace = match attr_prefix.as_deref() {
            None => None,
            Some(p) => Some(
                scopes
                    .resolve(Some(p))
                    .map(String::from)
                    .ok_or_else(|| {
                        SamlError::MalformedRequest(format!("unbound prefix on attribute {p}:{attr_local}"))
                    })?,
            ),
        };
        attributes.push(Attribute {
            prefix: attr_prefix,
            local_name: attr_local,
            namespace: attr_namespace,
            value,
        });
    }

    Ok(Element {
        prefix,
        local_name,
        namespace,
        namespace_decls,
        attributes,
        children: Vec::new(),
    })
}

fn split_name(raw: &[u8]) -> SamlResult<(Option<String>, String)> {
    let name = std::str::from_utf8(raw).map_err(|e| SamlError::MalformedRequest(e.to_string()))?;
    Ok(match name.split_once(':') {
        Some((prefix, local)) => (Some(prefix.to_string()), local.to_string()),
        None => (None, name.to_string()),
    })
}

fn attach(element: Element, stack: &mut [Element], root: &mut Option<Element>) -> SamlResult<()> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(Node::Element(element));
        return Ok(());
    }
    if root.is_some() {
        return Err(SamlError::MalformedRequest("multiple root elements".to_string()));
    }
    *root = Some(element);
    Ok(())
}

fn push_text(stack: &mut [Element], text: &str) -> SamlResult<()> {
    match stack.last_mut() {
        Some(parent) => {
            if let Some(Node::Text(existing)) = parent.children.last_mut() {
                existing.push_str(text);
            } else {
                parent.children.push(Node::Text(text.to_string()));
            }
            Ok(())
        }
        None if text.trim().is_empty() => Ok(()),
        None => Err(SamlError::MalformedRequest(
            "text outside the root element".to_string(),
        )),
    }
}

/// Escapes text or an attribute value for output in a generated document.
#[must_use]
pub fn escape(value: &str) -> std::borrow::Cow<'_, str> {
    quick_xml::escape::escape(value)
}
