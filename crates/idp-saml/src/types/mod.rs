//! SAML 2.0 message types.
//!
//! Inbound requests are parsed into immutable records; outbound responses and
//! metadata are value objects serialized with `to_xml`.

mod authn_request;
mod constants;
mod logout;
mod metadata;
mod response;

pub use authn_request::*;
pub use constants::*;
pub use logout::*;
pub use metadata::*;
pub use response::*;

use crate::error::{SamlError, SamlResult};
use crate::xml::Element;

/// Returns a required root attribute.
pub(crate) fn required_attribute(element: &Element, name: &str) -> SamlResult<String> {
    element
        .attribute(name)
        .map(str::to_string)
        .ok_or_else(|| {
            SamlError::MalformedRequest(format!(
                "missing {name} attribute on {}",
                element.local_name
            ))
        })
}

/// Returns a required root attribute that must be an absolute URL.
pub(crate) fn required_url(element: &Element, name: &str) -> SamlResult<String> {
    let value = required_attribute(element, name)?;
    url::Url::parse(&value)
        .map_err(|e| SamlError::MalformedRequest(format!("invalid {name} {value:?}: {e}")))?;
    Ok(value)
}

/// Returns the trimmed text of the first child with the given name.
pub(crate) fn child_text(element: &Element, namespace: &str, local_name: &str) -> Option<String> {
    element
        .child(namespace, local_name)
        .map(|child| child.text().trim().to_string())
}

/// Generates a document identifier: `_` followed by a UUID v4.
#[must_use]
pub fn new_id() -> String {
    format!("_{}", uuid::Uuid::new_v4())
}
