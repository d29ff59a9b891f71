//! SHA-256 digests.

use aws_lc_rs::digest;

/// Computes a SHA-256 digest of the input data.
#[must_use]
pub fn sha256(data: &[u8]) -> Vec<u8> {
    digest::digest(&digest::SHA256, data).as_ref().to_vec()
}

/// Computes a SHA-256 digest over several parts fed in order, hex encoded.
///
/// Feeding `["ab", "c"]` and `["a", "bc"]` yields the same digest: parts are
/// concatenated, not delimited.
#[must_use]
pub fn sha256_hex(parts: &[&[u8]]) -> String {
    let mut ctx = digest::Context::new(&digest::SHA256);
    for part in parts {
        ctx.update(part);
    }
    hex::encode(ctx.finish().as_ref())
}
