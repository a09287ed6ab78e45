//! Snapshot key derivation.
//!
//! The snapshot key is derived from a caller-supplied base key (the host
//! fingerprint key) and a random per-snapshot salt:
//! `sha256(sha256_hex(base_key) ++ salt_hex)`.

use crate::digest::sha256_hex;
use rand::RngCore;
use sha2::{Digest, Sha256};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Size of encryption keys in bytes (256 bits for AES-256).
pub const KEY_SIZE: usize = 32;

/// Size of the random salt in bytes before hex encoding.
pub const SALT_SIZE: usize = 20;

/// A derived snapshot key with automatic zeroization on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SnapshotKey {
    bytes: [u8; KEY_SIZE],
}

impl SnapshotKey {
    /// Creates a key from raw bytes.
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self { bytes }
    }

    /// Returns the key bytes.
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.bytes
    }
}

impl std::fmt::Debug for SnapshotKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnapshotKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// Salt for snapshot key derivation, kept in its hex form since that is
/// what gets hashed and embedded in the snapshot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Salt {
    hex: String,
}

impl Salt {
    /// Generates a random salt.
    pub fn random() -> Self {
        Self {
            hex: random_hex(SALT_SIZE),
        }
    }

    /// Wraps an existing salt string (as read back from a snapshot).
    pub fn from_hex(hex: impl Into<String>) -> Self {
        Self { hex: hex.into() }
    }

    /// Returns the salt as hex.
    pub fn as_str(&self) -> &str {
        &self.hex
    }
}

/// Derives the snapshot encryption key from a base key and salt.
pub fn derive_snapshot_key(base_key: &str, salt: &Salt) -> SnapshotKey {
    let mut hasher = Sha256::new();
    hasher.update(sha256_hex(base_key).as_bytes());
    hasher.update(salt.as_str().as_bytes());

    let mut bytes = [0u8; KEY_SIZE];
    bytes.copy_from_slice(&hasher.finalize());
    SnapshotKey::from_bytes(bytes)
}

/// Returns `len` bytes from the OS CSPRNG, hex encoded.
pub fn random_hex(len: usize) -> String {
    let mut bytes = vec![0u8; len];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}
