//! SHA-256 helpers producing lowercase hex.

use sha2::{Digest, Sha256};

/// Hashes `input` with SHA-256 and returns the lowercase hex digest.
#[must_use]
pub fn sha256_hex(input: impl AsRef<[u8]>) -> String {
    hex::encode(Sha256::digest(input.as_ref()))
}

/// Hashes the concatenation of `parts` (no separator) with SHA-256.
///
/// Equivalent to `sha256_hex(parts.concat())` without the intermediate
/// allocation.
#[must_use]
pub fn sha256_concat_hex(parts: &[&str]) -> String {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part.as_bytes());
    }
    hex::encode(hasher.finalize())
}
