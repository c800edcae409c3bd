//! Secret version entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::kind::{SecretEncryptionAlgorithm, SecretKeyEncoding, SecretType};
use super::model::Secret;

/// Immutable full copy of a secret row at the moment of a mutation.
///
/// `secret_id` is nullable so the version survives deletion of its
/// secret for audit purposes. Never updated.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SecretVersion {
    /// Unique version identifier.
    pub id: Uuid,
    /// Back-reference to the secret; None once the secret is deleted.
    pub secret_id: Option<Uuid>,
    /// The folder the secret lived under.
    pub folder_id: Uuid,
    /// Shared or Personal.
    pub secret_type: SecretType,
    /// Owner, set iff Personal.
    pub user_id: Option<Uuid>,
    /// Blind index at snapshot time.
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
    /// Reminder note at snapshot time.
    pub reminder_note: Option<String>,
    /// Reminder repeat interval at snapshot time.
    pub reminder_repeat_days: Option<i32>,
    /// Multiline-encoding flag at snapshot time.
    pub skip_multiline_encoding: bool,
    /// Version number copied from the secret row.
    pub version: i32,
    /// Algorithm tag copied from the secret row.
    pub algorithm: SecretEncryptionAlgorithm,
    /// Key-encoding tag copied from the secret row.
    pub key_encoding: SecretKeyEncoding,
    /// When this snapshot was written.
    pub created_at: DateTime<Utc>,
}

/// Data required to insert a version snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSecretVersion {
    /// The secret being snapshotted.
    pub secret_id: Uuid,
    /// The folder the secret lives under.
    pub folder_id: Uuid,
    /// Shared or Personal.
    pub secret_type: SecretType,
    /// Owner, set iff Personal.
    pub user_id: Option<Uuid>,
    /// Blind index at snapshot time.
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
    /// Reminder note at snapshot time.
    pub reminder_note: Option<String>,
    /// Reminder repeat interval at snapshot time.
    pub reminder_repeat_days: Option<i32>,
    /// Multiline-encoding flag at snapshot time.
    pub skip_multiline_encoding: bool,
    /// Version number copied from the secret row.
    pub version: i32,
    /// Algorithm tag copied from the secret row.
    pub algorithm: SecretEncryptionAlgorithm,
    /// Key-encoding tag copied from the secret row.
    pub key_encoding: SecretKeyEncoding,
}

impl From<&Secret> for NewSecretVersion {
    /// Snapshot the post-mutation state of a secret row.
    fn from(secret: &Secret) -> Self {
        Self {
            secret_id: secret.id,
            folder_id: secret.folder_id,
            secret_type: secret.secret_type,
            user_id: secret.user_id,
            blind_index: secret.blind_index.clone(),
            key_ciphertext: secret.key_ciphertext.clone(),
            key_iv: secret.key_iv.clone(),
            key_tag: secret.key_tag.clone(),
            value_ciphertext: secret.value_ciphertext.clone(),
            value_iv: secret.value_iv.clone(),
            value_tag: secret.value_tag.clone(),
            comment_ciphertext: secret.comment_ciphertext.clone(),
            comment_iv: secret.comment_iv.clone(),
            comment_tag: secret.comment_tag.clone(),
            reminder_note: secret.reminder_note.clone(),
            reminder_repeat_days: secret.reminder_repeat_days,
            skip_multiline_encoding: secret.skip_multiline_encoding,
            version: secret.version,
            algorithm: secret.algorithm,
            key_encoding: secret.key_encoding,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn sample_secret(version: i32) -> Secret {
        Secret {
            id: Uuid::new_v4(),
            folder_id: Uuid::new_v4(),
            secret_type: SecretType::Shared,
            user_id: None,
            blind_index: "bi".into(),
            key_ciphertext: "kc".into(),
            key_iv: "ki".into(),
            key_tag: "kt".into(),
            value_ciphertext: "vc".into(),
            value_iv: "vi".into(),
            value_tag: "vt".into(),
            comment_ciphertext: None,
            comment_iv: None,
            comment_tag: None,
            reminder_note: None,
            reminder_repeat_days: None,
            skip_multiline_encoding: false,
            version,
            algorithm: SecretEncryptionAlgorithm::Aes256Gcm,
            key_encoding: SecretKeyEncoding::Utf8,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_snapshot_copies_version_number() {
        let secret = sample_secret(7);
        let snap = NewSecretVersion::from(&secret);
        assert_eq!(snap.version, 7);
        assert_eq!(snap.secret_id, secret.id);
        assert_eq!(snap.blind_index, secret.blind_index);
    }

    #[test]
    fn test_snapshot_copies_reminder_and_encoding_flags() {
        let mut secret = sample_secret(2);
        secret.reminder_note = Some("rotate quarterly".into());
        secret.reminder_repeat_days = Some(90);
        secret.skip_multiline_encoding = true;

        let snap = NewSecretVersion::from(&secret);
        assert_eq!(snap.reminder_note.as_deref(), Some("rotate quarterly"));
        assert_eq!(snap.reminder_repeat_days, Some(90));
        assert!(snap.skip_multiline_encoding);
    }
}
