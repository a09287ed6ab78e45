//! Request tokens and validation hashes.
//!
//! Each remote check sends a fresh token and `sha256(applicationKey ++ token)`.
//! A server that echoes `licenseData.hash` must echo exactly that value.

use chrono::Utc;
use keycheck_crypto::{random_hex, sha256_concat_hex};

/// Random bytes mixed into each token.
const TOKEN_ENTROPY_BYTES: usize = 16;

/// Generates a one-time token: unix seconds followed by a salted hash of the
/// license key.
#[must_use]
pub fn generate_token(license_key: &str) -> String {
    let nonce = random_hex(TOKEN_ENTROPY_BYTES);
    format!(
        "{}{}",
        Utc::now().timestamp(),
        sha256_concat_hex(&[&nonce, license_key])
    )
}

/// Computes the validation hash binding a token to the application key.
#[must_use]
pub fn validation_hash(application_key: &str, token: &str) -> String {
    sha256_concat_hex(&[application_key, token])
}
