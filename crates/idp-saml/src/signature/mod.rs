//! Enveloped XML signatures over assertions.
//!
//! Only one profile is produced and accepted: exclusive canonicalization
//! (without comments), RSA-SHA256 over `SignedInfo`, and a single SHA-256
//! reference to the signed element with the enveloped-signature and
//! exclusive canonicalization transforms.

mod signer;
mod validator;

pub use signer::*;
pub use validator::*;

use crate::types::{algorithms, XMLDSIG_NS};

/// Marks where the signature goes in an unsigned document.
pub const SIGNATURE_PLACEHOLDER: &str =
    r#"<Signature xmlns="http://www.w3.org/2000/09/xmldsig#" Id="placeholder"></Signature>"#;

/// Builds `SignedInfo` for a reference to `#reference_id`.
///
/// The element carries no namespace declaration of its own; it is always
/// wrapped by [`signature_xml`].
fn signed_info_xml(reference_id: &str, digest_b64: &str) -> String {
    format!(
        concat!(
            "<SignedInfo>",
            r#"<CanonicalizationMethod Algorithm="{c14n}"/>"#,
            r#"<SignatureMethod Algorithm="{rsa}"/>"#,
            r##"<Reference URI="#{id}">"##,
            "<Transforms>",
            r#"<Transform Algorithm="{enveloped}"/>"#,
            r#"<Transform Algorithm="{c14n}"/>"#,
            "</Transforms>",
            r#"<DigestMethod Algorithm="{sha256}"/>"#,
            "<DigestValue>{digest}</DigestValue>",
            "</Reference>",
            "</SignedInfo>",
        ),
        c14n = algorithms::EXC_C14N,
        rsa = algorithms::RSA_SHA256,
        enveloped = algorithms::ENVELOPED_SIGNATURE,
        sha256 = algorithms::SHA256,
        id = crate::xml::escape(reference_id),
        digest = digest_b64,
    )
}

/// Wraps `SignedInfo` into a complete `Signature` element.
fn signature_xml(signed_info: &str, signature_b64: &str, certificate_b64: &str) -> String {
    format!(
        concat!(
            r#"<Signature xmlns="{ds}">"#,
            "{signed_info}",
            "<SignatureValue>{value}</SignatureValue>",
            "<KeyInfo><X509Data><X509Certificate>{cert}</X509Certificate></X509Data></KeyInfo>",
            "</Signature>",
        ),
        ds = XMLDSIG_NS,
        signed_info = signed_info,
        value = signature_b64,
        cert = certificate_b64,
    )
}
