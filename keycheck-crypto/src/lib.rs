//! Encryption layer for keycheck offline snapshots.
//!
//! This crate provides:
//! - SHA-256 digest helpers shared by the fingerprint and checksum code
//! - Salted key derivation for snapshot encryption
//! - AES-256-GCM encryption with a 16-byte IV
//! - The offline snapshot codec (`generate` / `decode`)
//!
//! # Snapshot Format
//!
//! A snapshot is `base64("iv:salt:ciphertext")` where `iv` and `salt` are
//! lowercase hex and `ciphertext` is standard base64. The per-snapshot key is
//! `sha256(sha256_hex(base_key) ++ salt)`, so a fresh salt yields a fresh key
//! even when the base key is stable.

mod cipher;
mod digest;
mod error;
mod key;
mod snapshot;

pub use cipher::{decrypt, encrypt, EncryptedData, IV_SIZE};
pub use digest::{sha256_concat_hex, sha256_hex};
pub use error::{CryptoError, CryptoResult};
pub use key::{derive_snapshot_key, random_hex, Salt, SnapshotKey, KEY_SIZE, SALT_SIZE};
pub use snapshot::{decode, generate, SNAPSHOT_DELIMITER};
