//! Deterministic blind-index derivation.
//!
//! A blind index is argon2id over the plaintext secret name, keyed with a
//! per-project random salt, so the store never persists plaintext names
//! and the same name maps to unrelated indices across projects.

use argon2::{Algorithm, Argon2, Params, Version};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;

use vaulthub_core::error::AppError;
use vaulthub_core::result::AppResult;
use vaulthub_core::traits::SecretCipher;
use vaulthub_entity::secret::SecretBlindIndexConfig;

/// Memory cost of 64 MiB, matching the parameters the existing salt
/// corpus was derived with. Changing any parameter invalidates every
/// stored index.
const MEMORY_COST_KIB: u32 = 64 * 1024;
const ITERATIONS: u32 = 3;
const PARALLELISM: u32 = 1;
const OUTPUT_LEN: usize = 32;

/// Derive the blind index for `secret_name` under a project's config.
///
/// Decrypts the config's salt with the supplied cipher and key, then
/// digests the name. Deterministic for a fixed `(name, config)` pair.
pub fn compute_blind_index(
    secret_name: &str,
    config: &SecretBlindIndexConfig,
    cipher: &dyn SecretCipher,
    encryption_key: &str,
) -> AppResult<String> {
    let salt = cipher.decrypt(
        &config.encrypted_salt_ciphertext,
        &config.salt_iv,
        &config.salt_tag,
        encryption_key,
    )?;
    compute_blind_index_with_salt(secret_name, &salt)
}

/// Derive the blind index from an already-decrypted base64 salt.
pub fn compute_blind_index_with_salt(secret_name: &str, salt_b64: &str) -> AppResult<String> {
    let salt = BASE64
        .decode(salt_b64)
        .map_err(|e| AppError::with_source(vaulthub_core::error::ErrorKind::Crypto, "Blind index salt is not valid base64", e))?;

    let params = Params::new(MEMORY_COST_KIB, ITERATIONS, PARALLELISM, Some(OUTPUT_LEN))
        .map_err(|e| AppError::crypto(format!("Invalid argon2 parameters: {e}")))?;
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let mut digest = [0u8; OUTPUT_LEN];
    argon2
        .hash_password_into(secret_name.as_bytes(), &salt, &mut digest)
        .map_err(|e| AppError::crypto(format!("Blind index derivation failed: {e}")))?;

    Ok(BASE64.encode(digest))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;
    use vaulthub_core::traits::EncryptedBlob;
    use vaulthub_entity::secret::{SecretEncryptionAlgorithm, SecretKeyEncoding};

    // 16 zero bytes, base64.
    const SALT_A: &str = "AAAAAAAAAAAAAAAAAAAAAA==";
    const SALT_B: &str = "AQIDBAUGBwgJCgsMDQ4PEA==";

    #[test]
    fn test_deterministic_for_same_salt() {
        let first = compute_blind_index_with_salt("DB_URL", SALT_A).unwrap();
        let second = compute_blind_index_with_salt("DB_URL", SALT_A).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_distinct_across_salts_and_names() {
        let a = compute_blind_index_with_salt("DB_URL", SALT_A).unwrap();
        let b = compute_blind_index_with_salt("DB_URL", SALT_B).unwrap();
        let c = compute_blind_index_with_salt("DB_PASSWORD", SALT_A).unwrap();
        assert_ne!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_rejects_invalid_salt() {
        assert!(compute_blind_index_with_salt("DB_URL", "not base64 !!!").is_err());
    }

    /// Cipher stub that hands back the "ciphertext" unchanged, so the
    /// config path can be exercised without real key material.
    struct IdentityCipher;

    impl SecretCipher for IdentityCipher {
        fn encrypt(&self, plaintext: &str, _key: &str) -> vaulthub_core::AppResult<EncryptedBlob> {
            Ok(EncryptedBlob {
                ciphertext: plaintext.to_string(),
                iv: String::new(),
                tag: String::new(),
            })
        }

        fn decrypt(
            &self,
            ciphertext: &str,
            _iv: &str,
            _tag: &str,
            _key: &str,
        ) -> vaulthub_core::AppResult<String> {
            Ok(ciphertext.to_string())
        }
    }

    #[test]
    fn test_config_path_matches_raw_salt_path() {
        let config = SecretBlindIndexConfig {
            id: Uuid::new_v4(),
            project_id: Uuid::new_v4(),
            encrypted_salt_ciphertext: SALT_A.to_string(),
            salt_iv: String::new(),
            salt_tag: String::new(),
            algorithm: SecretEncryptionAlgorithm::Aes256Gcm,
            key_encoding: SecretKeyEncoding::Utf8,
            created_at: Utc::now(),
        };
        let via_config = compute_blind_index("TOKEN", &config, &IdentityCipher, "key").unwrap();
        let via_salt = compute_blind_index_with_salt("TOKEN", SALT_A).unwrap();
        assert_eq!(via_config, via_salt);
    }
}
