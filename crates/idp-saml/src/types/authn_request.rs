//! AuthnRequest parsing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::bindings::HttpRedirectBinding;
use crate::error::{SamlError, SamlResult};
use crate::time::parse_timestamp;
use crate::xml;

use super::{child_text, required_attribute, required_url, SAMLP_NS, SAML_NS};

/// Authentication request from a service provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthnRequest {
    /// Request identifier, echoed as `InResponseTo`.
    pub id: String,

    /// When the service provider issued the request.
    pub issue_instant: DateTime<Utc>,

    /// Where the response is delivered.
    pub assertion_consumer_service_url: String,

    /// The identity provider URL the request was sent to.
    pub destination: String,

    /// Entity ID of the service provider. Also the assertion audience.
    pub issuer: String,
}

impl AuthnRequest {
    /// Decodes a redirect-binding `SAMLRequest` value and parses it.
    ///
    /// # Errors
    ///
    /// Returns [`SamlError::MalformedBinding`] if decoding fails, or any
    /// error from [`parse_authn_request`].
    pub fn from_redirect(saml_request: &str) -> SamlResult<Self> {
        let xml = HttpRedirectBinding::decode(saml_request)?;
        parse_authn_request(&xml)
    }
}

/// Parses an AuthnRequest document.
///
/// # Errors
///
/// - [`SamlError::NotAuthnRequest`] if the root is not `samlp:AuthnRequest`
/// - [`SamlError::MissingIssuer`] if there is no `saml:Issuer` child
/// - [`SamlError::MalformedRequest`] for malformed XML, a missing or invalid
///   root attribute, or an unparseable timestamp
pub fn parse_authn_request(xml: &str) -> SamlResult<AuthnRequest> {
    let root = xml::parse(xml)?;
    if !root.is(SAMLP_NS, "AuthnRequest") {
        return Err(SamlError::NotAuthnRequest);
    }

    let id = required_attribute(&root, "ID")?;
    let issue_instant = parse_timestamp(&required_attribute(&root, "IssueInstant")?, "IssueInstant")?;
    let assertion_consumer_service_url = required_url(&root, "AssertionConsumerServiceURL")?;
    let destination = required_url(&root, "Destination")?;
    let issuer = child_text(&root, SAML_NS, "Issuer").ok_or(SamlError::MissingIssuer)?;

    Ok(AuthnRequest {
        id,
        issue_instant,
        assertion_consumer_service_url,
        destination,
        issuer,
    })
}
