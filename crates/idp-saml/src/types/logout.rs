//! Single logout messages.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::bindings::HttpRedirectBinding;
use crate::error::{SamlError, SamlResult};
use crate::time::{parse_timestamp, saml_timestamp};
use crate::xml::{self, escape};

use super::{child_text, new_id, required_attribute, required_url, SAMLP_NS, SAML_NS};

/// Logout request from a service provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogoutRequest {
    /// Request identifier, echoed as `InResponseTo`.
    pub id: String,
    /// When the service provider issued the request.
    pub issue_instant: DateTime<Utc>,
    /// The request must not be honoured at or after this instant.
    pub not_on_or_after: DateTime<Utc>,
    /// The identity provider URL the request was sent to.
    pub destination: String,
    /// Entity ID of the service provider.
    pub issuer: String,
    /// The subject being logged out.
    pub name_id: String,
    /// The session being terminated.
    pub session_index: String,
}

impl LogoutRequest {
    /// Decodes a redirect-binding `SAMLRequest` value and parses it.
    ///
    /// # Errors
    ///
    /// Returns [`SamlError::MalformedBinding`] if decoding fails, or any
    /// error from [`parse_logout_request`].
    pub fn from_redirect(saml_request: &str) -> SamlResult<Self> {
        let xml = HttpRedirectBinding::decode(saml_request)?;
        parse_logout_request(&xml)
    }
}

/// Parses a LogoutRequest document.
///
/// # Errors
///
/// - [`SamlError::NotLogoutRequest`] if the root is not `samlp:LogoutRequest`
/// - [`SamlError::MissingIssuer`], [`SamlError::MissingNameId`] or
///   [`SamlError::MissingSessionIndex`] for a missing child
/// - [`SamlError::MalformedRequest`] for malformed XML, a missing or invalid
///   root attribute, or an unparseable timestamp
pub fn parse_logout_request(xml: &str) -> SamlResult<LogoutRequest> {
    let root = xml::parse(xml)?;
    if !root.is(SAMLP_NS, "LogoutRequest") {
        return Err(SamlError::NotLogoutRequest);
    }

    let id = required_attribute(&root, "ID")?;
    let issue_instant = parse_timestamp(&required_attribute(&root, "IssueInstant")?, "IssueInstant")?;
    let not_on_or_after =
        parse_timestamp(&required_attribute(&root, "NotOnOrAfter")?, "NotOnOrAfter")?;
    let destination = required_url(&root, "Destination")?;

    let issuer = child_text(&root, SAML_NS, "Issuer").ok_or(SamlError::MissingIssuer)?;
    let name_id = child_text(&root, SAML_NS, "NameID").ok_or(SamlError::MissingNameId)?;
    let session_index =
        child_text(&root, SAMLP_NS, "SessionIndex").ok_or(SamlError::MissingSessionIndex)?;

    Ok(LogoutRequest {
        id,
        issue_instant,
        not_on_or_after,
        destination,
        issuer,
        name_id,
        session_index,
    })
}

/// Response to a logout request. Never signed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogoutResponse {
    /// Response identifier.
    pub id: String,
    /// When the response was created.
    pub issue_instant: DateTime<Utc>,
    /// Where the response is delivered.
    pub destination: String,
    /// The request this answers.
    pub in_response_to: String,
    /// Entity ID of the identity provider.
    pub issuer: String,
    /// Status code URI.
    pub status_code: String,
}

impl LogoutResponse {
    /// Serializes the response.
    #[must_use]
    pub fn to_xml(&self) -> String {
        format!(
            concat!(
                r#"<saml2p:LogoutResponse xmlns:saml2p="{samlp}" ID="{id}" Version="2.0" InResponseTo="{irt}" IssueInstant="{instant}" Destination="{dest}">"#,
                r#"<Issuer xmlns="{saml}">{issuer}</Issuer>"#,
                r#"<saml2p:Status><saml2p:StatusCode Value="{status}"/></saml2p:Status>"#,
                r#"</saml2p:LogoutResponse>"#,
            ),
            samlp = SAMLP_NS,
            saml = SAML_NS,
            id = escape(&self.id),
            irt = escape(&self.in_response_to),
            instant = saml_timestamp(self.issue_instant),
            dest = escape(&self.destination),
            issuer = escape(&self.issuer),
            status = escape(&self.status_code),
        )
    }
}

/// Builds a logout response issued at `now` with a fresh identifier.
#[must_use]
pub fn build_logout_response(
    issuer: &str,
    destination: &str,
    in_response_to: &str,
    status_code: &str,
    now: DateTime<Utc>,
) -> LogoutResponse {
    LogoutResponse {
        id: new_id(),
        issue_instant: now,
        destination: destination.to_string(),
        in_response_to: in_response_to.to_string(),
        issuer: issuer.to_string(),
        status_code: status_code.to_string(),
    }
}
