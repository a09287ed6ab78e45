//! Snapshot encryption using AES-256-GCM with a 16-byte IV.
//!
//! GCM accepts non-96-bit nonces by hashing them through GHASH, which lets the
//! snapshot keep a full block-sized IV.

use crate::error::{CryptoError, CryptoResult};
use crate::key::SnapshotKey;
use aes_gcm::{
    aead::{consts::U16, Aead, KeyInit},
    aes::Aes256,
    AesGcm, Nonce,
};
use rand::RngCore;

/// Size of the IV in bytes (one AES block).
pub const IV_SIZE: usize = 16;

type SnapshotCipher = AesGcm<Aes256, U16>;

/// Encrypted data with the IV needed for decryption.
#[derive(Clone, Debug)]
pub struct EncryptedData {
    /// The IV used for encryption (unique per encryption).
    pub iv: [u8; IV_SIZE],
    /// The encrypted ciphertext (includes auth tag).
    pub ciphertext: Vec<u8>,
}

/// Encrypts plaintext under a fresh random IV.
pub fn encrypt(key: &SnapshotKey, plaintext: &[u8]) -> CryptoResult<EncryptedData> {
    let cipher = SnapshotCipher::new(key.as_bytes().into());

    let mut iv = [0u8; IV_SIZE];
    rand::rngs::OsRng.fill_bytes(&mut iv);
    let nonce = Nonce::<U16>::from_slice(&iv);

    let ciphertext = cipher
        .encrypt(nonce, plaintext)
        .map_err(|e| CryptoError::Encryption(e.to_string()))?;

    Ok(EncryptedData {
        iv,
        ciphertext,
    })
}

/// Decrypts ciphertext, failing on a wrong key or tampered data.
pub fn decrypt(key: &SnapshotKey, encrypted: &EncryptedData) -> CryptoResult<Vec<u8>> {
    let cipher = SnapshotCipher::new(key.as_bytes().into());
    let nonce = Nonce::<U16>::from_slice(&encrypted.iv);

    cipher
        .decrypt(nonce, encrypted.ciphertext.as_ref())
        .map_err(|_| {
            CryptoError::Decryption("decryption failed (wrong key or tampered data)".to_string())
        })
}
