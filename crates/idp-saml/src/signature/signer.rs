//! Signature creation.

use base64::Engine;
use idp_crypto::{sha256, RsaSigningKey};

use crate::error::{SamlError, SamlResult};
use crate::types::XMLDSIG_NS;
use crate::xml;

use super::{signature_xml, signed_info_xml, SIGNATURE_PLACEHOLDER};

/// Produces an enveloped signature over the element with a given `ID`.
pub trait DocumentSigner: Send + Sync {
    /// Returns `xml` with the element whose `ID` is `reference_id` signed.
    ///
    /// # Errors
    ///
    /// Returns a [`SamlError`] if the document cannot be signed.
    fn sign_document(&self, xml: &str, reference_id: &str) -> SamlResult<String>;
}

impl DocumentSigner for XmlSigner {
    fn sign_document(&self, xml: &str, reference_id: &str) -> SamlResult<String> {
        self.sign(xml, reference_id)
    }
}

/// Signs SAML documents with the identity provider's key.
#[derive(Debug)]
pub struct XmlSigner {
    key: RsaSigningKey,
    certificate_b64: String,
}

impl XmlSigner {
    /// Wraps an already validated signing key.
    #[must_use]
    pub fn new(key: RsaSigningKey) -> Self {
        let certificate_b64 = base64::engine::general_purpose::STANDARD.encode(key.certificate_der());
        Self {
            key,
            certificate_b64,
        }
    }

    /// Creates a signer from PEM key and certificate text.
    ///
    /// # Errors
    ///
    /// Returns [`SamlError::Signing`] if either is unreadable or they are not
    /// a pair.
    pub fn from_pem(private_key_pem: &str, certificate_pem: &str) -> SamlResult<Self> {
        let key = RsaSigningKey::from_pem(private_key_pem, certificate_pem)
            .map_err(|e| SamlError::Signing(e.to_string()))?;
        Ok(Self::new(key))
    }

    /// Base64 DER of the signing certificate, as embedded in `KeyInfo`.
    #[must_use]
    pub fn certificate_base64(&self) -> &str {
        &self.certificate_b64
    }

    /// Signs the element whose `ID` is `reference_id`.
    ///
    /// The signature replaces [`SIGNATURE_PLACEHOLDER`] when the document
    /// contains it, otherwise it is inserted right after the element's
    /// `Issuer`.
    ///
    /// # Errors
    ///
    /// Returns [`SamlError::Signing`] if the element cannot be found, holds a
    /// signature other than [`SIGNATURE_PLACEHOLDER`], or the RSA operation
    /// fails. Returns [`SamlError::MalformedRequest`] if `xml` is not well
    /// formed and [`SamlError::Canonicalization`] if the element cannot be
    /// canonicalized.
    pub fn sign(&self, xml: &str, reference_id: &str) -> SamlResult<String> {
        let root = xml::parse(xml)?;
        let target = root.find_by_id(reference_id).ok_or_else(|| {
            SamlError::Signing(format!("no element with ID {reference_id:?} to sign"))
        })?;

        let placeholder = target.child(XMLDSIG_NS, "Signature");
        let canonical = xml::canonicalize_excluding(target, placeholder)?;
        let digest_b64 =
            base64::engine::general_purpose::STANDARD.encode(sha256(canonical.as_bytes()));

        let signed_info = signed_info_xml(reference_id, &digest_b64);
        let canonical_signed_info = canonical_signed_info(&signed_info)?;
        let signature_value = self.key.sign_sha256(canonical_signed_info.as_bytes())?;
        let signature_b64 = base64::engine::general_purpose::STANDARD.encode(signature_value);

        let signature = signature_xml(&signed_info, &signature_b64, &self.certificate_b64);

        if placeholder.is_some() {
            let pos = xml.find(SIGNATURE_PLACEHOLDER).ok_or_else(|| {
                SamlError::Signing(format!(
                    "signature element in {reference_id:?} is not the placeholder"
                ))
            })?;
            let mut signed = String::with_capacity(xml.len() + signature.len());
            signed.push_str(&xml[..pos]);
            signed.push_str(&signature);
            signed.push_str(&xml[pos + SIGNATURE_PLACEHOLDER.len()..]);
            return Ok(signed);
        }

        let insert_at = insert_position(xml, reference_id).ok_or_else(|| {
            SamlError::Signing(format!("cannot place signature for {reference_id:?}"))
        })?;
        let mut signed = String::with_capacity(xml.len() + signature.len());
        signed.push_str(&xml[..insert_at]);
        signed.push_str(&signature);
        signed.push_str(&xml[insert_at..]);
        Ok(signed)
    }
}

/// Canonical form of `SignedInfo` as it will appear inside `Signature`.
fn canonical_signed_info(signed_info: &str) -> SamlResult<String> {
    let wrapper = signature_xml(signed_info, "", "");
    let signature = xml::parse(&wrapper)?;
    let signed_info = signature
        .child(XMLDSIG_NS, "SignedInfo")
        .ok_or_else(|| SamlError::Signing("SignedInfo missing".to_string()))?;
    xml::canonicalize(signed_info)
}

/// Byte offset just past the `Issuer` end tag of the element carrying
/// `ID="reference_id"`, or past its start tag when it has no issuer.
fn insert_position(xml: &str, reference_id: &str) -> Option<usize> {
    let id_attr = format!(r#"ID="{}""#, xml::escape(reference_id));
    let id_pos = xml.find(&id_attr)?;
    let start_tag_end = id_pos + xml[id_pos..].find('>')? + 1;
    if xml[..start_tag_end].ends_with("/>") {
        return None;
    }

    // The issuer, if any, is the first child, so its end tag is the first one.
    if let Some(offset) = xml[start_tag_end..].find("</") {
        let tag_start = start_tag_end + offset + 2;
        let tag_end = tag_start + xml[tag_start..].find('>')?;
        let name = xml[tag_start..tag_end].trim_end();
        if name == "Issuer" || name.ends_with(":Issuer") {
            return Some(tag_end + 1);
        }
    }
    Some(start_tag_end)
}
