//! Repository for secret version history.

use sqlx::PgPool;
use uuid::Uuid;

use vaulthub_core::error::{AppError, ErrorKind};
use vaulthub_core::result::AppResult;
use vaulthub_entity::secret::{NewSecretVersion, SecretVersion};

use crate::Tx;

const VERSION_COLUMNS: &str = "id, secret_id, folder_id, secret_type, user_id, blind_index, \
     key_ciphertext, key_iv, key_tag, \
     value_ciphertext, value_iv, value_tag, \
     comment_ciphertext, comment_iv, comment_tag, \
     reminder_note, reminder_repeat_days, skip_multiline_encoding, \
     version, algorithm, key_encoding, created_at";

/// Repository for immutable secret version snapshots.
#[derive(Debug, Clone)]
pub struct SecretVersionRepository {
    pool: PgPool,
}

impl SecretVersionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Record a version snapshot inside the caller's transaction.
    pub async fn insert(
        &self,
        tx: &mut Tx<'_>,
        version: &NewSecretVersion,
    ) -> AppResult<SecretVersion> {
        let sql = format!(
            "INSERT INTO secret_versions
                (secret_id, folder_id, secret_type, user_id, blind_index,
                 key_ciphertext, key_iv, key_tag,
                 value_ciphertext, value_iv, value_tag,
                 comment_ciphertext, comment_iv, comment_tag,
                 reminder_note, reminder_repeat_days, skip_multiline_encoding,
                 version, algorithm, key_encoding)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10,
                    $11, $12, $13, $14, $15, $16, $17, $18, $19, $20)
            RETURNING {VERSION_COLUMNS}"
        );
        sqlx::query_as::<_, SecretVersion>(&sql)
            .bind(version.secret_id)
            .bind(version.folder_id)
            .bind(version.secret_type)
            .bind(version.user_id)
            .bind(&version.blind_index)
            .bind(&version.key_ciphertext)
            .bind(&version.key_iv)
            .bind(&version.key_tag)
            .bind(&version.value_ciphertext)
            .bind(&version.value_iv)
            .bind(&version.value_tag)
            .bind(&version.comment_ciphertext)
            .bind(&version.comment_iv)
            .bind(&version.comment_tag)
            .bind(&version.reminder_note)
            .bind(version.reminder_repeat_days)
            .bind(version.skip_multiline_encoding)
            .bind(version.version)
            .bind(version.algorithm)
            .bind(version.key_encoding)
            .fetch_one(&mut **tx)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to record secret version", e)
            })
    }

    /// Record a batch of version snapshots inside the caller's transaction.
    pub async fn insert_many(
        &self,
        tx: &mut Tx<'_>,
        versions: &[NewSecretVersion],
    ) -> AppResult<Vec<SecretVersion>> {
        let mut created = Vec::with_capacity(versions.len());
        for version in versions {
            created.push(self.insert(tx, version).await?);
        }
        Ok(created)
    }

    /// List the version history of a secret, newest first.
    pub async fn find_by_secret_id(
        &self,
        secret_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> AppResult<Vec<SecretVersion>> {
        let sql = format!(
            "SELECT {VERSION_COLUMNS}
            FROM secret_versions
            WHERE secret_id = $1
            ORDER BY version DESC
            LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, SecretVersion>(&sql)
            .bind(secret_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to list secret versions", e)
            })
    }
}
