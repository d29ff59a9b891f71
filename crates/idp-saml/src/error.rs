//! SAML error types.
//!
//! Every failure of the protocol core is a deterministic function of its input
//! and is handled once by the immediate caller; nothing here is retried.

use thiserror::Error;

/// Result type for SAML operations.
pub type SamlResult<T> = Result<T, SamlError>;

/// SAML protocol errors.
#[derive(Debug, Error)]
pub enum SamlError {
    /// Base64, DEFLATE or UTF-8 decoding of a binding envelope failed.
    #[error("malformed binding: {0}")]
    MalformedBinding(String),

    /// The document root is not a `samlp:AuthnRequest`.
    #[error("Not an authn request.")]
    NotAuthnRequest,

    /// The document root is not a `samlp:LogoutRequest`.
    #[error("Not a logout request.")]
    NotLogoutRequest,

    /// No `saml:Issuer` child on the request.
    #[error("No issuer found in request")]
    MissingIssuer,

    /// No `saml:NameID` child on the logout request.
    #[error("No name_id found in request")]
    MissingNameId,

    /// No `samlp:SessionIndex` child on the logout request.
    #[error("No session_index found in request")]
    MissingSessionIndex,

    /// Unparseable XML, a missing required attribute or an invalid timestamp.
    #[error("malformed request: {0}")]
    MalformedRequest(String),

    /// The request was issued too long ago.
    #[error("Out of date")]
    StaleRequest,

    /// The request's `NotOnOrAfter` has passed.
    #[error("Out of date (not on or after)")]
    ExpiredRequest,

    /// Unknown user or wrong password. Never says which.
    #[error("Invalid username or password.")]
    Authentication,

    /// Key or certificate unusable for signing.
    #[error("signing error: {0}")]
    Signing(String),

    /// A subtree could not be put into canonical form.
    #[error("canonicalization failed: {0}")]
    Canonicalization(String),

    /// Signature verification failed.
    #[error("signature verification failed: {0}")]
    Verification(String),
}

impl SamlError {
    /// Returns true for structural validation failures of an inbound request.
    #[must_use]
    pub const fn is_protocol_structure(&self) -> bool {
        matches!(
            self,
            Self::NotAuthnRequest
                | Self::NotLogoutRequest
                | Self::MissingIssuer
                | Self::MissingNameId
                | Self::MissingSessionIndex
                | Self::MalformedRequest(_)
        )
    }

    /// Returns the HTTP status code for this error.
    ///
    /// Authentication failures re-render the login form, hence 200.
    #[must_use]
    pub const fn http_status(&self) -> u16 {
        match self {
            Self::MalformedBinding(_)
            | Self::NotAuthnRequest
            | Self::NotLogoutRequest
            | Self::MissingIssuer
            | Self::MissingNameId
            | Self::MissingSessionIndex
            | Self::MalformedRequest(_)
            | Self::StaleRequest
            | Self::ExpiredRequest
            | Self::Verification(_) => 400,
            Self::Authentication => 200,
            Self::Signing(_) | Self::Canonicalization(_) => 500,
        }
    }
}

impl From<quick_xml::Error> for SamlError {
    fn from(err: quick_xml::Error) -> Self {
        Self::MalformedRequest(err.to_string())
    }
}

impl From<base64::DecodeError> for SamlError {
    fn from(err: base64::DecodeError) -> Self {
        Self::MalformedBinding(err.to_string())
    }
}

impl From<idp_crypto::CryptoError> for SamlError {
    fn from(err: idp_crypto::CryptoError) -> Self {
        match err {
            idp_crypto::CryptoError::Verification => Self::Verification(err.to_string()),
            other => Self::Signing(other.to_string()),
        }
    }
}
