//! Offline snapshot codec.
//!
//! `generate` encrypts a serialized license result under a key derived from
//! the caller's base key and a random salt; `decode` reverses it. The output
//! is opaque text the caller persists between runs.

use crate::cipher::{self, EncryptedData, IV_SIZE};
use crate::error::{CryptoError, CryptoResult};
use crate::key::{derive_snapshot_key, Salt};
use base64::{engine::general_purpose::STANDARD, Engine};
use tracing::debug;

/// Separator between the iv, salt and ciphertext components.
///
/// Hex and standard base64 never produce it, so it cannot appear inside a
/// component.
pub const SNAPSHOT_DELIMITER: char = ':';

/// Encrypts `payload` into a snapshot string bound to `key`.
///
/// # Errors
///
/// Returns `EmptyInput` if either argument is empty, or `Encryption` if the
/// cipher fails.
pub fn generate(payload: &str, key: &str) -> CryptoResult<String> {
    if payload.is_empty() {
        return Err(CryptoError::EmptyInput("payload"));
    }
    if key.is_empty() {
        return Err(CryptoError::EmptyInput("key"));
    }

    let salt = Salt::random();
    let snapshot_key = derive_snapshot_key(key, &salt);
    let encrypted = cipher::encrypt(&snapshot_key, payload.as_bytes())?;

    let inner = format!(
        "{iv}{d}{salt}{d}{ct}",
        iv = hex::encode(encrypted.iv),
        salt = salt.as_str(),
        ct = STANDARD.encode(&encrypted.ciphertext),
        d = SNAPSHOT_DELIMITER,
    );

    debug!(len = inner.len(), "generated offline snapshot");
    Ok(STANDARD.encode(inner.as_bytes()))
}

/// Decrypts a snapshot produced by [`generate`] with the same `key`.
///
/// # Errors
///
/// Returns `MalformedSnapshot` if the text does not decode to exactly three
/// components, and `Decryption` on a wrong key or tampered data.
pub fn decode(blob: &str, key: &str) -> CryptoResult<String> {
    let raw = STANDARD
        .decode(blob.trim())
        .map_err(|e| CryptoError::MalformedSnapshot(format!("invalid base64: {e}")))?;
    let inner = String::from_utf8(raw)
        .map_err(|e| CryptoError::MalformedSnapshot(format!("invalid UTF-8: {e}")))?;

    let parts: Vec<&str> = inner.split(SNAPSHOT_DELIMITER).collect();
    let [iv_hex, salt_hex, ciphertext_b64] = parts.as_slice() else {
        return Err(CryptoError::MalformedSnapshot(format!(
            "expected 3 components, got {}",
            parts.len()
        )));
    };

    let iv_bytes = hex::decode(iv_hex)
        .map_err(|e| CryptoError::MalformedSnapshot(format!("invalid iv: {e}")))?;
    let iv: [u8; IV_SIZE] =
        iv_bytes
            .as_slice()
            .try_into()
            .map_err(|_| CryptoError::InvalidIvLength {
                expected: IV_SIZE,
                actual: iv_bytes.len(),
            })?;
    let ciphertext = STANDARD
        .decode(ciphertext_b64)
        .map_err(|e| CryptoError::MalformedSnapshot(format!("invalid ciphertext: {e}")))?;

    let snapshot_key = derive_snapshot_key(key, &Salt::from_hex(*salt_hex));
    let plaintext = cipher::decrypt(&snapshot_key, &EncryptedData { iv, ciphertext })?;

    String::from_utf8(plaintext)
        .map_err(|e| CryptoError::Decryption(format!("invalid UTF-8: {e}")))
}
