//! SAML bindings.
//!
//! - **HTTP-Redirect** carries inbound requests: raw DEFLATE, base64, URL
//!   encoding.
//! - **HTTP-POST** carries outbound responses: plain base64 in an
//!   auto-submitting HTML form. Responses are never deflated.
//!
//! ```rust,ignore
//! use idp_saml::bindings::{HttpPostBinding, HttpRedirectBinding};
//!
//! let xml = HttpRedirectBinding::decode(&saml_request)?;
//! let html = HttpPostBinding::encode_response(&signed_xml, &acs_url, relay_state);
//! ```

mod post;
mod redirect;

pub use post::*;
pub use redirect::*;

/// SAML message direction, which decides the form/query parameter name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamlMessageType {
    /// Request sent to the identity provider.
    Request,
    /// Response sent back to the service provider.
    Response,
}

impl SamlMessageType {
    /// Returns the parameter name for this message type.
    #[must_use]
    pub const fn form_param(&self) -> &'static str {
        match self {
            Self::Request => "SAMLRequest",
            Self::Response => "SAMLResponse",
        }
    }
}

/// A message decoded from a redirect-binding URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedMessage {
    /// The decoded XML text.
    pub xml: String,
    /// Which parameter carried the message.
    pub message_type: SamlMessageType,
    /// The RelayState, if present.
    pub relay_state: Option<String>,
}
