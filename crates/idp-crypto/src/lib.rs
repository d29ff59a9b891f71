//! # idp-crypto
//!
//! Cryptographic primitives for the SAML identity provider, backed by aws-lc-rs.
//!
//! - RSA PKCS#1 v1.5 with SHA-256 signing and verification (XML-DSig `rsa-sha256`)
//! - SHA-256 digests
//! - PEM decoding of keys and certificates
//! - Secure random identifiers
//!
//! SAML interoperability still requires SHA-256 based signatures, so that is the
//! only algorithm offered here.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod hash;
pub mod pem;
pub mod random;
pub mod rsa;

pub use error::CryptoError;
pub use hash::{sha256, sha256_hex};
pub use pem::{pem_to_der, PemLabel};
pub use random::{random_bytes, random_hex};
pub use rsa::{certificate_public_key, rsa_verify_sha256, RsaSigningKey};
