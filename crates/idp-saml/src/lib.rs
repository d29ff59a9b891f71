//! SAML 2.0 identity provider protocol core.
//!
//! This crate holds everything protocol-shaped and nothing HTTP-shaped:
//!
//! - [`bindings`] - HTTP-Redirect decoding of inbound requests and the
//!   HTTP-POST auto-submit form for outbound responses
//! - [`types`] - AuthnRequest/LogoutRequest parsing, AuthnResponse,
//!   LogoutResponse and metadata documents
//! - [`validity`] - issue-instant and not-on-or-after checks
//! - [`signature`] - enveloped XML-DSig with exclusive canonicalization
//! - [`session`] - users and the stateless session token
//! - [`xml`] - the namespace-aware tree and canonicalizer underneath
//!
//! # Flow
//!
//! ```rust,ignore
//! use idp_saml::{bindings::HttpPostBinding, session, validity, AuthnRequest, ResponseContext};
//!
//! let request = AuthnRequest::from_redirect(&saml_request)?;
//! validity::check_authn_request(&request, Utc::now())?;
//!
//! let response = idp_saml::build_authn_response(
//!     &entity_id,
//!     &ResponseContext::from(&request),
//!     &user,
//!     session::new_session_index(&user),
//!     Utc::now(),
//! );
//! let signed = response.to_signed_xml(&signer)?;
//! let html = HttpPostBinding::encode_response(&signed, &response.destination, relay_state);
//! ```
//!
//! All operations are synchronous and side-effect free apart from random
//! identifier generation.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod bindings;
pub mod error;
pub mod session;
pub mod signature;
pub mod time;
pub mod types;
pub mod validity;
pub mod xml;

pub use error::{SamlError, SamlResult};
pub use session::User;
pub use signature::{verify, DocumentSigner, VerifiedReference, XmlSigner};
pub use types::*;
