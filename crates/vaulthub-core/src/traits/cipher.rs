//! Symmetric cipher boundary.
//!
//! The engine never implements AES-256-GCM itself; it decides *when* to
//! encrypt or decrypt and delegates the primitive to this trait.

use serde::{Deserialize, Serialize};

use crate::result::AppResult;

/// Output of a symmetric encryption call: every component base64-encoded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncryptedBlob {
    /// Ciphertext.
    pub ciphertext: String,
    /// Initialization vector.
    pub iv: String,
    /// Authentication tag.
    pub tag: String,
}

/// Symmetric encryption/decryption primitive supplied by the external
/// cryptography module.
///
/// Implementations must be deterministic for `decrypt` and must reject
/// tampered ciphertext (auth tag mismatch) with a crypto error.
pub trait SecretCipher: Send + Sync {
    /// Encrypt a plaintext under the given key.
    fn encrypt(&self, plaintext: &str, key: &str) -> AppResult<EncryptedBlob>;

    /// Decrypt a ciphertext produced by [`SecretCipher::encrypt`].
    fn decrypt(&self, ciphertext: &str, iv: &str, tag: &str, key: &str) -> AppResult<String>;
}
