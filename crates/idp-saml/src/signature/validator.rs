//! Signature verification.
//!
//! Used by tests and service-provider tooling to check what the identity
//! provider emits. The identity provider itself does not require signed
//! requests.

use base64::Engine;
use idp_crypto::{certificate_public_key, pem_to_der, rsa_verify_sha256, sha256, PemLabel};

use crate::error::{SamlError, SamlResult};
use crate::types::{algorithms, XMLDSIG_NS};
use crate::xml::{self, Element};

/// The element a verified signature covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedReference {
    /// `ID` of the signed element.
    pub reference_id: String,
    /// Canonical form of the signed element without its signature. Only
    /// these bytes are vouched for.
    pub canonical_xml: String,
}

/// Validates enveloped signatures against one trusted certificate.
#[derive(Debug, Clone)]
pub struct XmlSignatureValidator {
    public_key: Vec<u8>,
}

impl XmlSignatureValidator {
    /// Creates a validator trusting the certificate in `certificate_pem`.
    ///
    /// # Errors
    ///
    /// Returns [`SamlError::Verification`] if the certificate is unreadable.
    pub fn from_pem(certificate_pem: &str) -> SamlResult<Self> {
        let der = pem_to_der(certificate_pem, PemLabel::Certificate)
            .map_err(|e| SamlError::Verification(e.to_string()))?;
        let public_key =
            certificate_public_key(&der).map_err(|e| SamlError::Verification(e.to_string()))?;
        Ok(Self { public_key })
    }

    /// Verifies the first enveloped signature in `xml`.
    ///
    /// # Errors
    ///
    /// Returns [`SamlError::Verification`] if there is no signature, it uses
    /// an unexpected algorithm, the digest does not match the referenced
    /// element, or the signature value does not verify.
    pub fn validate(&self, xml: &str) -> SamlResult<VerifiedReference> {
        let root = xml::parse(xml).map_err(|e| SamlError::Verification(e.to_string()))?;
        let (signed, signature) = find_enveloped_signature(&root)
            .ok_or_else(|| SamlError::Verification("no enveloped signature".to_string()))?;

        let reference_id = signed
            .attribute("ID")
            .ok_or_else(|| invalid("signed element has no ID"))?;

        let signed_info = signature
            .child(XMLDSIG_NS, "SignedInfo")
            .ok_or_else(|| invalid("SignedInfo missing"))?;
        expect_algorithm(signed_info, "CanonicalizationMethod", algorithms::EXC_C14N)?;
        expect_algorithm(signed_info, "SignatureMethod", algorithms::RSA_SHA256)?;

        let mut references = signed_info
            .child_elements()
            .filter(|e| e.is(XMLDSIG_NS, "Reference"));
        let reference = references
            .next()
            .ok_or_else(|| invalid("Reference missing"))?;
        if references.next().is_some() {
            return Err(invalid("more than one Reference"));
        }

        if reference.attribute("URI") != Some(format!("#{reference_id}").as_str()) {
            return Err(invalid("Reference does not point at the enclosing element"));
        }
        check_transforms(reference)?;
        expect_algorithm(reference, "DigestMethod", algorithms::SHA256)?;

        let expected_digest = decode_base64_text(reference, "DigestValue")?;
        let canonical_xml =
            xml::canonicalize_excluding(signed, Some(signature)).map_err(into_verification)?;
        if sha256(canonical_xml.as_bytes()) != expected_digest {
            return Err(invalid("digest mismatch"));
        }

        let signature_value = decode_base64_text(signature, "SignatureValue")?;
        let canonical_signed_info = xml::canonicalize(signed_info).map_err(into_verification)?;
        rsa_verify_sha256(
            &self.public_key,
            canonical_signed_info.as_bytes(),
            &signature_value,
        )?;

        Ok(VerifiedReference {
            reference_id: reference_id.to_string(),
            canonical_xml,
        })
    }
}

/// Verifies the enveloped signature in `xml` against `certificate_pem`.
///
/// # Errors
///
/// See [`XmlSignatureValidator::validate`].
pub fn verify(xml: &str, certificate_pem: &str) -> SamlResult<VerifiedReference> {
    XmlSignatureValidator::from_pem(certificate_pem)?.validate(xml)
}

fn invalid(reason: &str) -> SamlError {
    SamlError::Verification(reason.to_string())
}

fn into_verification(err: SamlError) -> SamlError {
    SamlError::Verification(err.to_string())
}

/// Finds the first `ds:Signature` together with the element it sits in.
fn find_enveloped_signature(element: &Element) -> Option<(&Element, &Element)> {
    if let Some(signature) = element.child(XMLDSIG_NS, "Signature") {
        return Some((element, signature));
    }
    element
        .child_elements()
        .find_map(find_enveloped_signature)
}

fn expect_algorithm(parent: &Element, name: &str, expected: &str) -> SamlResult<()> {
    let algorithm = parent
        .child(XMLDSIG_NS, name)
        .and_then(|e| e.attribute("Algorithm"));
    if algorithm == Some(expected) {
        Ok(())
    } else {
        Err(SamlError::Verification(format!(
            "unsupported {name}: {}",
            algorithm.unwrap_or("none")
        )))
    }
}

fn check_transforms(reference: &Element) -> SamlResult<()> {
    let transforms: Vec<&str> = reference
        .child(XMLDSIG_NS, "Transforms")
        .map(|t| {
            t.child_elements()
                .filter(|e| e.is(XMLDSIG_NS, "Transform"))
                .filter_map(|e| e.attribute("Algorithm"))
                .collect()
        })
        .unwrap_or_default();

    if !transforms.contains(&algorithms::ENVELOPED_SIGNATURE) {
        return Err(invalid("enveloped-signature transform missing"));
    }
    if let Some(other) = transforms
        .iter()
        .find(|t| **t != algorithms::ENVELOPED_SIGNATURE && **t != algorithms::EXC_C14N)
    {
        return Err(SamlError::Verification(format!(
            "unsupported transform: {other}"
        )));
    }
    Ok(())
}

fn decode_base64_text(parent: &Element, name: &str) -> SamlResult<Vec<u8>> {
    let text: String = parent
        .child(XMLDSIG_NS, name)
        .ok_or_else(|| SamlError::Verification(format!("{name} missing")))?
        .text()
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    base64::engine::general_purpose::STANDARD
        .decode(text)
        .map_err(|e| SamlError::Verification(format!("{name}: {e}")))
}
