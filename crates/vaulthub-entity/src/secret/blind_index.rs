//! Per-project blind-index configuration entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::kind::{SecretEncryptionAlgorithm, SecretKeyEncoding};

/// Per-project salt used to derive secret blind indices.
///
/// Created once at project provisioning, never mutated afterwards. Every
/// secret mutation in the project requires this row; its absence is a
/// fatal configuration error.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SecretBlindIndexConfig {
    /// Unique config identifier.
    pub id: Uuid,
    /// The project this salt belongs to.
    pub project_id: Uuid,
    /// Encrypted random salt (base64 plaintext underneath).
    pub encrypted_salt_ciphertext: String,
    /// IV for the salt ciphertext.
    pub salt_iv: String,
    /// Auth tag for the salt ciphertext.
    pub salt_tag: String,
    /// Algorithm the salt was encrypted with.
    pub algorithm: SecretEncryptionAlgorithm,
    /// Encoding of the key that encrypted the salt.
    pub key_encoding: SecretKeyEncoding,
    /// When the config was created.
    pub created_at: DateTime<Utc>,
}
