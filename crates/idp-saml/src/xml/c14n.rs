//! Exclusive XML Canonicalization 1.0, without comments.
//!
//! The canonicalizer only sees documents, so a subtree is first written out
//! as a standalone document: namespaces it inherits from outside are declared
//! on its root, and the excluded descendant (the enveloped signature) is
//! left out.

use xml_canonicalization::Canonicalizer;

use super::{escape, Element, NamespaceDecl, Node};
use crate::error::{SamlError, SamlResult};

/// Canonicalizes `element` and its subtree.
///
/// # Errors
///
/// Returns [`SamlError::Canonicalization`] if the canonicalizer rejects the
/// serialized subtree.
pub fn canonicalize(element: &Element) -> SamlResult<String> {
    canonicalize_excluding(element, None)
}

/// Canonicalizes `element`, leaving out the `excluded` descendant.
///
/// This is the enveloped-signature transform followed by exclusive
/// canonicalization when `excluded` is the signature element.
///
/// # Errors
///
/// See [`canonicalize`].
pub fn canonicalize_excluding(element: &Element, excluded: Option<&Element>) -> SamlResult<String> {
    canonicalize_document(&standalone(element, excluded))
}

/// Runs a complete document through the canonicalizer.
fn canonicalize_document(xml: &str) -> SamlResult<String> {
    let mut output = Vec::new();
    Canonicalizer::read_from_str(xml)
        .write_to_writer(&mut output)
        .canonicalize(false)
        .map_err(|e| SamlError::Canonicalization(e.to_string()))?;

    String::from_utf8(output)
        .map_err(|e| SamlError::Canonicalization(format!("output is not UTF-8: {e}")))
}

/// Writes `element` as a document of its own.
fn standalone(element: &Element, excluded: Option<&Element>) -> String {
    let mut inherited = Vec::new();
    collect_inherited(element, &mut Vec::new(), excluded, &mut inherited);

    let mut out = String::new();
    write_element(&mut out, element, &inherited, excluded);
    out
}

/// Bindings used in the subtree but not declared inside it.
fn collect_inherited(
    element: &Element,
    declared: &mut Vec<Option<String>>,
    excluded: Option<&Element>,
    inherited: &mut Vec<NamespaceDecl>,
) {
    let mark = declared.len();
    declared.extend(element.namespace_decls.iter().map(|d| d.prefix.clone()));

    let mut used = vec![(element.prefix.clone(), element.namespace.clone())];
    used.extend(
        element
            .attributes
            .iter()
            .filter(|a| a.prefix.as_deref().is_some_and(|p| p != "xml"))
            .map(|a| (a.prefix.clone(), a.namespace.clone())),
    );
    for (prefix, namespace) in used {
        let Some(uri) = namespace else { continue };
        let known = declared.contains(&prefix) || inherited.iter().any(|d| d.prefix == prefix);
        if !known {
            inherited.push(NamespaceDecl { prefix, uri });
        }
    }

    for child in element.child_elements() {
        if !excluded.is_some_and(|x| std::ptr::eq(x, child)) {
            collect_inherited(child, declared, excluded, inherited);
        }
    }
    declared.truncate(mark);
}

fn write_element(
    out: &mut String,
    element: &Element,
    extra_decls: &[NamespaceDecl],
    excluded: Option<&Element>,
) {
    let name = element.qualified_name();
    out.push('<');
    out.push_str(&name);
    for decl in extra_decls.iter().chain(&element.namespace_decls) {
        match &decl.prefix {
            Some(prefix) => write_attribute(out, &format!("xmlns:{prefix}"), &decl.uri),
            None => write_attribute(out, "xmlns", &decl.uri),
        }
    }
    for attr in &element.attributes {
        write_attribute(out, &attr.qualified_name(), &attr.value);
    }
    out.push('>');

    for child in &element.children {
        match child {
            Node::Element(e) if excluded.is_some_and(|x| std::ptr::eq(x, e)) => {}
            Node::Element(e) => write_element(out, e, &[], excluded),
            Node::Text(text) => out.push_str(&escape_whitespace(&escape(text))),
        }
    }

    out.push_str("</");
    out.push_str(&name);
    out.push('>');
}

fn write_attribute(out: &mut String, name: &str, value: &str) {
    out.push(' ');
    out.push_str(name);
    out.push_str("=\"");
    out.push_str(&escape_whitespace(&escape(value)));
    out.push('"');
}

/// Tabs, newlines and carriage returns that survived parsing came from
/// character references and must stay references, or re-parsing would
/// normalize them away.
fn escape_whitespace(value: &str) -> String {
    value
        .replace('\t', "&#x9;")
        .replace('\n', "&#xA;")
        .replace('\r', "&#xD;")
}
