//! PEM decoding.

use base64::Engine;

use crate::error::CryptoError;

/// PEM block labels understood by the identity provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PemLabel {
    /// PKCS#8 private key.
    PrivateKey,
    /// PKCS#1 RSA private key.
    RsaPrivateKey,
    /// X.509 certificate.
    Certificate,
}

impl PemLabel {
    /// Returns the label text between `BEGIN`/`END`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PrivateKey => "PRIVATE KEY",
            Self::RsaPrivateKey => "RSA PRIVATE KEY",
            Self::Certificate => "CERTIFICATE",
        }
    }
}

/// Extracts the DER bytes of the first PEM block with the given label.
///
/// # Errors
///
/// Returns [`CryptoError::InvalidPem`] if no such block exists or its body is
/// not valid base64.
pub fn pem_to_der(pem: &str, label: PemLabel) -> Result<Vec<u8>, CryptoError> {
    let begin = format!("-----BEGIN {}-----", label.as_str());
    let end = format!("-----END {}-----", label.as_str());

    let start = pem
        .find(&begin)
        .map(|pos| pos + begin.len())
        .ok_or_else(|| CryptoError::InvalidPem(format!("missing {begin}")))?;
    let end_pos = pem[start..]
        .find(&end)
        .map(|pos| start + pos)
        .ok_or_else(|| CryptoError::InvalidPem(format!("missing {end}")))?;

    let b64_data: String = pem[start..end_pos]
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();

    base64::engine::general_purpose::STANDARD
        .decode(b64_data)
        .map_err(|e| CryptoError::InvalidPem(e.to_string()))
}
