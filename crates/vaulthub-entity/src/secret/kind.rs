//! Secret type and cipher-metadata enumerations.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Visibility class of a secret.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "secret_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SecretType {
    /// Visible to every actor with folder access.
    Shared,
    /// Per-user override; requires a Shared secret with the same name in
    /// the same folder.
    Personal,
}

impl SecretType {
    /// Return the type as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Shared => "shared",
            Self::Personal => "personal",
        }
    }
}

impl fmt::Display for SecretType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SecretType {
    type Err = vaulthub_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "shared" => Ok(Self::Shared),
            "personal" => Ok(Self::Personal),
            _ => Err(vaulthub_core::AppError::validation(format!(
                "Invalid secret type: '{s}'. Expected 'shared' or 'personal'"
            ))),
        }
    }
}

/// Symmetric algorithm a secret's fields were encrypted with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "secret_encryption_algorithm", rename_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum SecretEncryptionAlgorithm {
    /// AES-256 in GCM mode, the only algorithm currently written.
    Aes256Gcm,
}

/// Encoding of the key the ciphertext was produced under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "secret_key_encoding", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SecretKeyEncoding {
    /// Legacy hex key handed over as a UTF-8 string.
    Utf8,
    /// Base64-encoded root key.
    Base64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secret_type_from_str() {
        assert_eq!("shared".parse::<SecretType>().unwrap(), SecretType::Shared);
        assert_eq!(
            "Personal".parse::<SecretType>().unwrap(),
            SecretType::Personal
        );
        assert!("team".parse::<SecretType>().is_err());
    }

    #[test]
    fn test_serde_rename() {
        assert_eq!(
            serde_json::to_string(&SecretType::Personal).unwrap(),
            "\"personal\""
        );
        assert_eq!(
            serde_json::to_string(&SecretEncryptionAlgorithm::Aes256Gcm).unwrap(),
            "\"aes256-gcm\""
        );
    }
}
