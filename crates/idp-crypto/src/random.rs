//! Cryptographically secure random generation.
//!
//! Used for session index entropy. Identifiers for SAML documents use UUID v4
//! instead.

use rand::Rng;

/// Generates `len` cryptographically secure random bytes.
#[must_use]
pub fn random_bytes(len: usize) -> Vec<u8> {
    let mut rng = rand::rng();
    let mut bytes = vec![0u8; len];
    rng.fill(&mut bytes[..]);
    bytes
}

/// Generates a lowercase hex string of `len` characters.
///
/// An odd `len` is rounded down to the preceding even length.
#[must_use]
pub fn random_hex(len: usize) -> String {
    hex::encode(random_bytes(len / 2))
}
