//! RSA PKCS#1 v1.5 with SHA-256.
//!
//! This is the `http://www.w3.org/2001/04/xmldsig-more#rsa-sha256` algorithm
//! SAML service providers expect on assertions.

use aws_lc_rs::{
    rand::SystemRandom,
    signature::{self, RsaKeyPair, UnparsedPublicKey},
};
use x509_parser::prelude::*;
use x509_parser::public_key::PublicKey;

use crate::error::CryptoError;
use crate::pem::{pem_to_der, PemLabel};

/// An RSA private key paired with the certificate that publishes it.
pub struct RsaSigningKey {
    key_pair: RsaKeyPair,
    certificate_der: Vec<u8>,
}

impl std::fmt::Debug for RsaSigningKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RsaSigningKey")
            .field("modulus_len", &self.key_pair.public_modulus_len())
            .field("certificate_len", &self.certificate_der.len())
            .finish()
    }
}

impl RsaSigningKey {
    /// Creates a signing key from DER encoded key (PKCS#1 or PKCS#8) and certificate.
    ///
    /// The pair is checked by signing a probe message and verifying it with the
    /// certificate's public key, so a mismatched pair is rejected here rather
    /// than producing unverifiable signatures later.
    ///
    /// # Errors
    ///
    /// Returns an error if the key or certificate cannot be parsed or they do
    /// not belong together.
    pub fn from_der(key_der: &[u8], certificate_der: Vec<u8>) -> Result<Self, CryptoError> {
        let key_pair = RsaKeyPair::from_der(key_der)
            .or_else(|_| RsaKeyPair::from_pkcs8(key_der))
            .map_err(|e| CryptoError::InvalidKey(format!("Invalid RSA key: {e}")))?;

        let signing_key = Self {
            key_pair,
            certificate_der,
        };

        let public_key = certificate_public_key(&signing_key.certificate_der)?;
        let probe = b"idp-crypto key pair probe";
        let probe_signature = signing_key.sign_sha256(probe)?;
        rsa_verify_sha256(&public_key, probe, &probe_signature).map_err(|_| {
            CryptoError::InvalidKey("private key does not match certificate".to_string())
        })?;

        Ok(signing_key)
    }

    /// Creates a signing key from PEM text.
    ///
    /// Accepts `PRIVATE KEY` (PKCS#8) or `RSA PRIVATE KEY` (PKCS#1) blocks for
    /// the key and a `CERTIFICATE` block for the certificate.
    ///
    /// # Errors
    ///
    /// Returns an error if either PEM block is missing or invalid, or the pair
    /// does not match.
    pub fn from_pem(private_key_pem: &str, certificate_pem: &str) -> Result<Self, CryptoError> {
        let key_der = pem_to_der(private_key_pem, PemLabel::PrivateKey)
            .or_else(|_| pem_to_der(private_key_pem, PemLabel::RsaPrivateKey))?;
        let certificate_der = pem_to_der(certificate_pem, PemLabel::Certificate)?;
        Self::from_der(&key_der, certificate_der)
    }

    /// Signs `data` with RSA PKCS#1 v1.5 SHA-256.
    ///
    /// # Errors
    ///
    /// Returns an error if signing fails.
    pub fn sign_sha256(&self, data: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let rng = SystemRandom::new();
        let mut signature = vec![0u8; self.key_pair.public_modulus_len()];

        self.key_pair
            .sign(&signature::RSA_PKCS1_SHA256, &rng, data, &mut signature)
            .map_err(|e| CryptoError::Signing(format!("RSA signing failed: {e}")))?;

        Ok(signature)
    }

    /// Returns the DER encoded certificate.
    #[must_use]
    pub fn certificate_der(&self) -> &[u8] {
        &self.certificate_der
    }
}

/// Extracts the RSA public key (PKCS#1 `RSAPublicKey` DER) from a certificate.
///
/// # Errors
///
/// Returns an error if the certificate cannot be parsed or does not carry an
/// RSA key.
pub fn certificate_public_key(certificate_der: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let (_, cert) = X509Certificate::from_der(certificate_der)
        .map_err(|e| CryptoError::InvalidCertificate(format!("Failed to parse certificate: {e}")))?;

    let spki = cert.public_key();
    match spki.parsed() {
        Ok(PublicKey::RSA(_)) => Ok(spki.subject_public_key.data.to_vec()),
        Ok(_) => Err(CryptoError::InvalidCertificate(
            "certificate does not carry an RSA key".to_string(),
        )),
        Err(e) => Err(CryptoError::InvalidCertificate(format!(
            "unreadable public key: {e}"
        ))),
    }
}

/// Verifies an RSA PKCS#1 v1.5 SHA-256 signature.
///
/// `public_key_der` is a PKCS#1 `RSAPublicKey` as returned by
/// [`certificate_public_key`].
///
/// # Errors
///
/// Returns [`CryptoError::Verification`] if the signature does not match.
pub fn rsa_verify_sha256(
    public_key_der: &[u8],
    data: &[u8],
    sig: &[u8],
) -> Result<(), CryptoError> {
    let public_key = UnparsedPublicKey::new(&signature::RSA_PKCS1_2048_8192_SHA256, public_key_der);
    public_key
        .verify(data, sig)
        .map_err(|_| CryptoError::Verification)
}
