//! Encryption key material configuration.

use serde::{Deserialize, Serialize};

/// Keys used to unwrap per-project salts and secret key material.
///
/// The symmetric cipher itself lives behind the [`crate::traits::SecretCipher`]
/// boundary; this section only carries the key material handed to it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CryptoConfig {
    /// Hex-encoded 128-bit encryption key (legacy UTF-8 key encoding).
    pub encryption_key: String,
    /// Base64-encoded 256-bit root encryption key, preferred when set.
    #[serde(default)]
    pub root_encryption_key: Option<String>,
}

impl CryptoConfig {
    /// The key to hand to the cipher, preferring the root key when present.
    pub fn active_key(&self) -> &str {
        self.root_encryption_key
            .as_deref()
            .unwrap_or(&self.encryption_key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_active_key_prefers_root() {
        let cfg = CryptoConfig {
            encryption_key: "legacy".into(),
            root_encryption_key: Some("root".into()),
        };
        assert_eq!(cfg.active_key(), "root");

        let cfg = CryptoConfig {
            encryption_key: "legacy".into(),
            root_encryption_key: None,
        };
        assert_eq!(cfg.active_key(), "legacy");
    }
}
