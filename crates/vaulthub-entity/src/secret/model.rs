//! Secret entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::kind::{SecretEncryptionAlgorithm, SecretKeyEncoding, SecretType};
use crate::tag::SecretTag;

/// A secret's current-state row.
///
/// Only ciphertext is ever stored or returned; the plaintext name exists
/// solely as the deterministic `blind_index` digest. The live identity of
/// a secret is `(folder_id, blind_index, secret_type, user_id)`, enforced
/// by a unique constraint.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Secret {
    /// Unique secret identifier.
    pub id: Uuid,
    /// The folder this secret lives under.
    pub folder_id: Uuid,
    /// Shared or Personal.
    pub secret_type: SecretType,
    /// Owner, set iff `secret_type` is Personal.
    pub user_id: Option<Uuid>,
    /// Salted digest of the plaintext name.
    pub blind_index: String,
    /// Encrypted secret name.
    pub key_ciphertext: String,
    /// IV for the name ciphertext.
    pub key_iv: String,
    /// Auth tag for the name ciphertext.
    pub key_tag: String,
    /// Encrypted secret value.
    pub value_ciphertext: String,
    /// IV for the value ciphertext.
    pub value_iv: String,
    /// Auth tag for the value ciphertext.
    pub value_tag: String,
    /// Encrypted comment, if any.
    pub comment_ciphertext: Option<String>,
    /// IV for the comment ciphertext.
    pub comment_iv: Option<String>,
    /// Auth tag for the comment ciphertext.
    pub comment_tag: Option<String>,
    /// Free-form reminder note.
    pub reminder_note: Option<String>,
    /// Reminder repeat interval in days.
    pub reminder_repeat_days: Option<i32>,
    /// Skip quoting/escaping of multiline values during expansion.
    pub skip_multiline_encoding: bool,
    /// Starts at 1, +1 on every mutation; never reset or reused.
    pub version: i32,
    /// Algorithm the ciphertext fields were produced with.
    pub algorithm: SecretEncryptionAlgorithm,
    /// Encoding of the encryption key used.
    pub key_encoding: SecretKeyEncoding,
    /// When the secret was created.
    pub created_at: DateTime<Utc>,
    /// When the secret was last updated.
    pub updated_at: DateTime<Utc>,
}

/// A secret merged with its tag associations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecretWithTags {
    /// The secret row.
    #[serde(flatten)]
    pub secret: Secret,
    /// Associated tags.
    pub tags: Vec<SecretTag>,
}

/// The pseudonymous identity a secret is addressed by.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretSelector {
    /// The folder to search in.
    pub folder_id: Uuid,
    /// Blind index of the plaintext name.
    pub blind_index: String,
    /// Shared or Personal.
    pub secret_type: SecretType,
    /// Owner for Personal secrets, None for Shared.
    pub user_id: Option<Uuid>,
}

/// Data required to insert a new secret row at version 1.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSecret {
    /// The folder the secret lives under.
    pub folder_id: Uuid,
    /// Shared or Personal.
    pub secret_type: SecretType,
    /// Owner, required iff Personal.
    pub user_id: Option<Uuid>,
    /// Precomputed blind index of the plaintext name.
    pub blind_index: String,
    /// Encrypted secret name.
    pub key_ciphertext: String,
    /// IV for the name ciphertext.
    pub key_iv: String,
    /// Auth tag for the name ciphertext.
    pub key_tag: String,
    /// Encrypted secret value.
    pub value_ciphertext: String,
    /// IV for the value ciphertext.
    pub value_iv: String,
    /// Auth tag for the value ciphertext.
    pub value_tag: String,
    /// Encrypted comment, if any.
    pub comment_ciphertext: Option<String>,
    /// IV for the comment ciphertext.
    pub comment_iv: Option<String>,
    /// Auth tag for the comment ciphertext.
    pub comment_tag: Option<String>,
    /// Free-form reminder note.
    pub reminder_note: Option<String>,
    /// Reminder repeat interval in days.
    pub reminder_repeat_days: Option<i32>,
    /// Skip quoting/escaping of multiline values during expansion.
    pub skip_multiline_encoding: bool,
    /// Algorithm the ciphertext fields were produced with.
    pub algorithm: SecretEncryptionAlgorithm,
    /// Encoding of the encryption key used.
    pub key_encoding: SecretKeyEncoding,
}

/// Field changes applied by an update. `None` leaves the column as-is.
///
/// `blind_index` is set only on rename, after the new identity has been
/// checked for collision.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SecretUpdate {
    /// New blind index on rename.
    pub blind_index: Option<String>,
    /// New encrypted secret name.
    pub key_ciphertext: Option<String>,
    /// IV for the new name ciphertext.
    pub key_iv: Option<String>,
    /// Auth tag for the new name ciphertext.
    pub key_tag: Option<String>,
    /// New encrypted secret value.
    pub value_ciphertext: Option<String>,
    /// IV for the new value ciphertext.
    pub value_iv: Option<String>,
    /// Auth tag for the new value ciphertext.
    pub value_tag: Option<String>,
    /// New encrypted comment.
    pub comment_ciphertext: Option<String>,
    /// IV for the new comment ciphertext.
    pub comment_iv: Option<String>,
    /// Auth tag for the new comment ciphertext.
    pub comment_tag: Option<String>,
    /// New reminder note.
    pub reminder_note: Option<String>,
    /// New reminder repeat interval in days.
    pub reminder_repeat_days: Option<i32>,
    /// New multiline-encoding flag.
    pub skip_multiline_encoding: Option<bool>,
}
