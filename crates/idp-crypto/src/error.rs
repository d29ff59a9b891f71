//! Error type for cryptographic operations.

use thiserror::Error;

/// Error type for key handling, signing and verification.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// PEM armor missing or body not valid base64.
    #[error("invalid PEM: {0}")]
    InvalidPem(String),

    /// Invalid key format.
    #[error("invalid key format: {0}")]
    InvalidKey(String),

    /// Certificate could not be parsed or carries an unusable key.
    #[error("invalid certificate: {0}")]
    InvalidCertificate(String),

    /// Signing failed.
    #[error("signing failed: {0}")]
    Signing(String),

    /// Verification failed.
    #[error("signature verification failed")]
    Verification,
}
