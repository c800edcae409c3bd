//! Repository for secret rows.
//!
//! Secrets are addressed by their pseudonymous selector
//! `(folder_id, blind_index, secret_type, user_id)`; no query here ever
//! touches plaintext names or values.

use sqlx::PgPool;
use uuid::Uuid;

use vaulthub_core::error::{AppError, ErrorKind};
use vaulthub_core::result::AppResult;
use vaulthub_entity::secret::{NewSecret, Secret, SecretSelector, SecretType, SecretUpdate};

use crate::Tx;

const SECRET_COLUMNS: &str = "id, folder_id, secret_type, user_id, blind_index, \
     key_ciphertext, key_iv, key_tag, \
     value_ciphertext, value_iv, value_tag, \
     comment_ciphertext, comment_iv, comment_tag, \
     reminder_note, reminder_repeat_days, skip_multiline_encoding, \
     version, algorithm, key_encoding, created_at, updated_at";

/// Repository for secret rows.
#[derive(Debug, Clone)]
pub struct SecretRepository {
    pool: PgPool,
}

impl SecretRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a single secret by its selector.
    ///
    /// `user_id` matches with NULL semantics: a Shared selector carries
    /// `None` and matches only rows whose owner column is NULL.
    pub async fn find_one(&self, selector: &SecretSelector) -> AppResult<Option<Secret>> {
        let sql = format!(
            "SELECT {SECRET_COLUMNS}
            FROM secrets
            WHERE folder_id = $1
              AND blind_index = $2
              AND secret_type = $3
              AND user_id IS NOT DISTINCT FROM $4"
        );
        sqlx::query_as::<_, Secret>(&sql)
            .bind(selector.folder_id)
            .bind(&selector.blind_index)
            .bind(selector.secret_type)
            .bind(selector.user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find secret", e))
    }

    /// List all secrets in a folder visible to a requester.
    ///
    /// Shared secrets are always included; Personal secrets only when
    /// owned by `user_id`.
    pub async fn find_by_folder_id(
        &self,
        folder_id: Uuid,
        user_id: Option<Uuid>,
    ) -> AppResult<Vec<Secret>> {
        let sql = format!(
            "SELECT {SECRET_COLUMNS}
            FROM secrets
            WHERE folder_id = $1
              AND (secret_type = 'shared' OR user_id = $2)
            ORDER BY created_at ASC"
        );
        sqlx::query_as::<_, Secret>(&sql)
            .bind(folder_id)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list secrets", e))
    }

    /// Fetch a batch of secrets in one folder by blind index and type.
    pub async fn find_by_blind_indexes(
        &self,
        folder_id: Uuid,
        keys: &[(String, SecretType)],
        user_id: Option<Uuid>,
    ) -> AppResult<Vec<Secret>> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }
        let blind_indexes: Vec<String> = keys.iter().map(|(bi, _)| bi.clone()).collect();
        let types: Vec<String> = keys.iter().map(|(_, t)| t.as_str().to_string()).collect();

        let sql = format!(
            "SELECT {SECRET_COLUMNS}
            FROM secrets
            WHERE folder_id = $1
              AND (blind_index, secret_type::TEXT)
                  IN (SELECT * FROM UNNEST($2::TEXT[], $3::TEXT[]))
              AND (secret_type = 'shared' OR user_id IS NOT DISTINCT FROM $4)"
        );
        sqlx::query_as::<_, Secret>(&sql)
            .bind(folder_id)
            .bind(&blind_indexes)
            .bind(&types)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to batch-find secrets", e)
            })
    }

    /// Insert a secret at version 1 inside the caller's transaction.
    ///
    /// A selector collision surfaces as a Conflict error via the unique
    /// constraint rather than a racy pre-check.
    pub async fn create(&self, tx: &mut Tx<'_>, secret: &NewSecret) -> AppResult<Secret> {
        let sql = format!(
            "INSERT INTO secrets
                (folder_id, secret_type, user_id, blind_index,
                 key_ciphertext, key_iv, key_tag,
                 value_ciphertext, value_iv, value_tag,
                 comment_ciphertext, comment_iv, comment_tag,
                 reminder_note, reminder_repeat_days, skip_multiline_encoding,
                 version, algorithm, key_encoding)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10,
                    $11, $12, $13, $14, $15, $16, 1, $17, $18)
            RETURNING {SECRET_COLUMNS}"
        );
        sqlx::query_as::<_, Secret>(&sql)
            .bind(secret.folder_id)
            .bind(secret.secret_type)
            .bind(secret.user_id)
            .bind(&secret.blind_index)
            .bind(&secret.key_ciphertext)
            .bind(&secret.key_iv)
            .bind(&secret.key_tag)
            .bind(&secret.value_ciphertext)
            .bind(&secret.value_iv)
            .bind(&secret.value_tag)
            .bind(&secret.comment_ciphertext)
            .bind(&secret.comment_iv)
            .bind(&secret.comment_tag)
            .bind(&secret.reminder_note)
            .bind(secret.reminder_repeat_days)
            .bind(secret.skip_multiline_encoding)
            .bind(secret.algorithm)
            .bind(secret.key_encoding)
            .fetch_one(&mut **tx)
            .await
            .map_err(map_unique_violation)
    }

    /// Insert a batch of secrets inside the caller's transaction.
    pub async fn insert_many(
        &self,
        tx: &mut Tx<'_>,
        secrets: &[NewSecret],
    ) -> AppResult<Vec<Secret>> {
        let mut created = Vec::with_capacity(secrets.len());
        for secret in secrets {
            created.push(self.create(tx, secret).await?);
        }
        Ok(created)
    }

    /// Apply field changes to the secret matching a selector, bumping
    /// its version. Returns `None` when no row matches.
    pub async fn update(
        &self,
        tx: &mut Tx<'_>,
        selector: &SecretSelector,
        changes: &SecretUpdate,
    ) -> AppResult<Option<Secret>> {
        let sql = format!(
            "UPDATE secrets
            SET blind_index = COALESCE($5, blind_index),
                key_ciphertext = COALESCE($6, key_ciphertext),
                key_iv = COALESCE($7, key_iv),
                key_tag = COALESCE($8, key_tag),
                value_ciphertext = COALESCE($9, value_ciphertext),
                value_iv = COALESCE($10, value_iv),
                value_tag = COALESCE($11, value_tag),
                comment_ciphertext = COALESCE($12, comment_ciphertext),
                comment_iv = COALESCE($13, comment_iv),
                comment_tag = COALESCE($14, comment_tag),
                reminder_note = COALESCE($15, reminder_note),
                reminder_repeat_days = COALESCE($16, reminder_repeat_days),
                skip_multiline_encoding = COALESCE($17, skip_multiline_encoding),
                version = version + 1,
                updated_at = NOW()
            WHERE folder_id = $1
              AND blind_index = $2
              AND secret_type = $3
              AND user_id IS NOT DISTINCT FROM $4
            RETURNING {SECRET_COLUMNS}"
        );
        sqlx::query_as::<_, Secret>(&sql)
            .bind(selector.folder_id)
            .bind(&selector.blind_index)
            .bind(selector.secret_type)
            .bind(selector.user_id)
            .bind(&changes.blind_index)
            .bind(&changes.key_ciphertext)
            .bind(&changes.key_iv)
            .bind(&changes.key_tag)
            .bind(&changes.value_ciphertext)
            .bind(&changes.value_iv)
            .bind(&changes.value_tag)
            .bind(&changes.comment_ciphertext)
            .bind(&changes.comment_iv)
            .bind(&changes.comment_tag)
            .bind(&changes.reminder_note)
            .bind(changes.reminder_repeat_days)
            .bind(changes.skip_multiline_encoding)
            .fetch_optional(&mut **tx)
            .await
            .map_err(map_unique_violation)
    }

    /// Delete the secret matching a selector, returning the deleted row.
    pub async fn delete(
        &self,
        tx: &mut Tx<'_>,
        selector: &SecretSelector,
    ) -> AppResult<Option<Secret>> {
        let sql = format!(
            "DELETE FROM secrets
            WHERE folder_id = $1
              AND blind_index = $2
              AND secret_type = $3
              AND user_id IS NOT DISTINCT FROM $4
            RETURNING {SECRET_COLUMNS}"
        );
        sqlx::query_as::<_, Secret>(&sql)
            .bind(selector.folder_id)
            .bind(&selector.blind_index)
            .bind(selector.secret_type)
            .bind(selector.user_id)
            .fetch_optional(&mut **tx)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to delete secret", e))
    }

    /// Delete a batch of secrets in one folder, returning the deleted
    /// rows in whatever order the database produced them.
    pub async fn delete_many(
        &self,
        tx: &mut Tx<'_>,
        folder_id: Uuid,
        keys: &[(String, SecretType)],
        user_id: Option<Uuid>,
    ) -> AppResult<Vec<Secret>> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }
        let blind_indexes: Vec<String> = keys.iter().map(|(bi, _)| bi.clone()).collect();
        let types: Vec<String> = keys.iter().map(|(_, t)| t.as_str().to_string()).collect();

        let sql = format!(
            "DELETE FROM secrets
            WHERE folder_id = $1
              AND (blind_index, secret_type::TEXT)
                  IN (SELECT * FROM UNNEST($2::TEXT[], $3::TEXT[]))
              AND (secret_type = 'shared' OR user_id IS NOT DISTINCT FROM $4)
            RETURNING {SECRET_COLUMNS}"
        );
        sqlx::query_as::<_, Secret>(&sql)
            .bind(folder_id)
            .bind(&blind_indexes)
            .bind(&types)
            .bind(user_id)
            .fetch_all(&mut **tx)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to batch-delete secrets", e)
            })
    }
}

/// Map a unique-constraint violation on the selector to a Conflict
/// error; everything else stays a Database error.
fn map_unique_violation(e: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(ref db) = e {
        if db.code().as_deref() == Some("23505") {
            return AppError::conflict("Secret with the same name already exists");
        }
    }
    AppError::with_source(ErrorKind::Database, "Failed to write secret", e)
}
