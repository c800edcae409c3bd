//! Repository for secret tags and their junction rows.

use sqlx::PgPool;
use uuid::Uuid;

use vaulthub_core::error::{AppError, ErrorKind};
use vaulthub_core::result::AppResult;
use vaulthub_entity::tag::{SecretTag, SecretTagLink};

use crate::Tx;

/// Repository for tag rows and secret-tag associations.
#[derive(Debug, Clone)]
pub struct SecretTagRepository {
    pool: PgPool,
}

impl SecretTagRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Fetch tags by id within a project. Callers compare the returned
    /// count against the requested count to detect unknown ids.
    pub async fn find_by_ids(&self, project_id: Uuid, ids: &[Uuid]) -> AppResult<Vec<SecretTag>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        sqlx::query_as::<_, SecretTag>(
            r#"
            SELECT id, project_id, slug, color, created_at, updated_at
            FROM secret_tags
            WHERE project_id = $1 AND id = ANY($2)
            "#,
        )
        .bind(project_id)
        .bind(ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find tags", e))
    }

    /// Replace the tag set of a secret inside the caller's transaction.
    pub async fn replace_for_secret(
        &self,
        tx: &mut Tx<'_>,
        secret_id: Uuid,
        tag_ids: &[Uuid],
    ) -> AppResult<()> {
        sqlx::query("DELETE FROM secret_tag_junction WHERE secret_id = $1")
            .bind(secret_id)
            .execute(&mut **tx)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to clear tags", e))?;

        if tag_ids.is_empty() {
            return Ok(());
        }

        sqlx::query(
            r#"
            INSERT INTO secret_tag_junction (secret_id, tag_id)
            SELECT $1, tag_id FROM UNNEST($2::UUID[]) AS t(tag_id)
            "#,
        )
        .bind(secret_id)
        .bind(tag_ids)
        .execute(&mut **tx)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to attach tags", e))?;
        Ok(())
    }

    /// Copy a secret's current tag set onto a version snapshot, inside
    /// the caller's transaction.
    pub async fn copy_to_version(
        &self,
        tx: &mut Tx<'_>,
        secret_id: Uuid,
        version_id: Uuid,
    ) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO secret_version_tag_junction (secret_version_id, tag_id)
            SELECT $2, tag_id FROM secret_tag_junction WHERE secret_id = $1
            "#,
        )
        .bind(secret_id)
        .bind(version_id)
        .execute(&mut **tx)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to snapshot tag links", e)
        })?;
        Ok(())
    }

    /// Fetch the tag associations for a batch of secrets in one query.
    pub async fn find_for_secrets(&self, secret_ids: &[Uuid]) -> AppResult<Vec<SecretTagLink>> {
        if secret_ids.is_empty() {
            return Ok(Vec::new());
        }
        sqlx::query_as::<_, SecretTagLink>(
            r#"
            SELECT j.secret_id, t.id, t.project_id, t.slug, t.color,
                   t.created_at, t.updated_at
            FROM secret_tag_junction j
            JOIN secret_tags t ON t.id = j.tag_id
            WHERE j.secret_id = ANY($1)
            ORDER BY t.slug ASC
            "#,
        )
        .bind(secret_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to load tag links", e))
    }
}
