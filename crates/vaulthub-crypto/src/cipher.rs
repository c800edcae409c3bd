//! AES-256-GCM implementation of the symmetric cipher boundary.
//!
//! Wire format: ciphertext, IV, and auth tag are carried as separate
//! base64 strings, with the 16-byte tag detached from the ciphertext.

use aes_gcm::aead::Aead;
use aes_gcm::{Aes256Gcm, Key, KeyInit, Nonce};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use rand::Rng;

use vaulthub_core::error::AppError;
use vaulthub_core::result::AppResult;
use vaulthub_core::traits::{EncryptedBlob, SecretCipher};

const KEY_SIZE: usize = 32;
const NONCE_SIZE: usize = 12;
const TAG_SIZE: usize = 16;

/// AES-256-GCM cipher with random 96-bit nonces.
#[derive(Debug, Clone, Default)]
pub struct Aes256GcmCipher;

impl Aes256GcmCipher {
    /// Accepts the key either as 32 raw UTF-8 bytes or base64-encoded
    /// 32 bytes.
    fn key_bytes(key: &str) -> AppResult<[u8; KEY_SIZE]> {
        if key.len() == KEY_SIZE {
            let mut out = [0u8; KEY_SIZE];
            out.copy_from_slice(key.as_bytes());
            return Ok(out);
        }
        let decoded = BASE64
            .decode(key)
            .map_err(|e| AppError::with_source(
                vaulthub_core::error::ErrorKind::Crypto,
                "Encryption key is neither 32 bytes nor valid base64",
                e,
            ))?;
        decoded
            .try_into()
            .map_err(|_| AppError::crypto("Encryption key must decode to exactly 32 bytes"))
    }
}

impl SecretCipher for Aes256GcmCipher {
    fn encrypt(&self, plaintext: &str, key: &str) -> AppResult<EncryptedBlob> {
        let key_bytes = Self::key_bytes(key)?;
        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key_bytes));

        let mut nonce = [0u8; NONCE_SIZE];
        rand::rng().fill_bytes(&mut nonce);

        let mut sealed = cipher
            .encrypt(Nonce::from_slice(&nonce), plaintext.as_bytes())
            .map_err(|e| AppError::crypto(format!("Encryption failed: {e}")))?;
        let tag = sealed.split_off(sealed.len() - TAG_SIZE);

        Ok(EncryptedBlob {
            ciphertext: BASE64.encode(sealed),
            iv: BASE64.encode(nonce),
            tag: BASE64.encode(tag),
        })
    }

    fn decrypt(&self, ciphertext: &str, iv: &str, tag: &str, key: &str) -> AppResult<String> {
        let key_bytes = Self::key_bytes(key)?;
        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key_bytes));

        let nonce = BASE64
            .decode(iv)
            .map_err(|e| AppError::with_source(
                vaulthub_core::error::ErrorKind::Crypto,
                "IV is not valid base64",
                e,
            ))?;
        if nonce.len() != NONCE_SIZE {
            return Err(AppError::crypto("IV must be 12 bytes"));
        }
        let mut sealed = BASE64
            .decode(ciphertext)
            .map_err(|e| AppError::with_source(
                vaulthub_core::error::ErrorKind::Crypto,
                "Ciphertext is not valid base64",
                e,
            ))?;
        let tag = BASE64
            .decode(tag)
            .map_err(|e| AppError::with_source(
                vaulthub_core::error::ErrorKind::Crypto,
                "Auth tag is not valid base64",
                e,
            ))?;
        sealed.extend_from_slice(&tag);

        let plaintext = cipher
            .decrypt(Nonce::from_slice(&nonce), sealed.as_ref())
            .map_err(|_| AppError::crypto("Decryption failed: auth tag mismatch or wrong key"))?;
        String::from_utf8(plaintext)
            .map_err(|e| AppError::with_source(
                vaulthub_core::error::ErrorKind::Crypto,
                "Decrypted plaintext is not valid UTF-8",
                e,
            ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &str = "0123456789abcdef0123456789abcdef";

    #[test]
    fn test_round_trip() {
        let cipher = Aes256GcmCipher;
        let blob = cipher.encrypt("top secret value", KEY).unwrap();
        let plain = cipher
            .decrypt(&blob.ciphertext, &blob.iv, &blob.tag, KEY)
            .unwrap();
        assert_eq!(plain, "top secret value");
    }

    #[test]
    fn test_nonces_are_unique() {
        let cipher = Aes256GcmCipher;
        let a = cipher.encrypt("v", KEY).unwrap();
        let b = cipher.encrypt("v", KEY).unwrap();
        assert_ne!(a.iv, b.iv);
        assert_ne!(a.ciphertext, b.ciphertext);
    }

    #[test]
    fn test_tampered_tag_is_rejected() {
        let cipher = Aes256GcmCipher;
        let blob = cipher.encrypt("value", KEY).unwrap();
        let bad_tag = BASE64.encode([0u8; 16]);
        let err = cipher
            .decrypt(&blob.ciphertext, &blob.iv, &bad_tag, KEY)
            .unwrap_err();
        assert!(err.is_kind(vaulthub_core::error::ErrorKind::Crypto));
    }

    #[test]
    fn test_wrong_key_is_rejected() {
        let cipher = Aes256GcmCipher;
        let blob = cipher.encrypt("value", KEY).unwrap();
        let other = "fedcba9876543210fedcba9876543210";
        assert!(cipher.decrypt(&blob.ciphertext, &blob.iv, &blob.tag, other).is_err());
    }

    #[test]
    fn test_base64_key_accepted() {
        let cipher = Aes256GcmCipher;
        let key_b64 = BASE64.encode([7u8; 32]);
        let blob = cipher.encrypt("value", &key_b64).unwrap();
        let plain = cipher
            .decrypt(&blob.ciphertext, &blob.iv, &blob.tag, &key_b64)
            .unwrap();
        assert_eq!(plain, "value");
    }

    #[test]
    fn test_invalid_key_length_is_rejected() {
        let cipher = Aes256GcmCipher;
        assert!(cipher.encrypt("value", "short").is_err());
    }
}
