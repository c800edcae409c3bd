//! Repository for folder version history.

use sqlx::PgPool;
use uuid::Uuid;

use vaulthub_core::error::{AppError, ErrorKind};
use vaulthub_core::result::AppResult;
use vaulthub_entity::folder::{FolderVersion, NewFolderVersion};

use crate::Tx;

/// Repository for folder version rows.
#[derive(Debug, Clone)]
pub struct FolderVersionRepository {
    pool: PgPool,
}

impl FolderVersionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Record a folder version inside the caller's transaction.
    pub async fn insert(
        &self,
        tx: &mut Tx<'_>,
        version: &NewFolderVersion,
    ) -> AppResult<FolderVersion> {
        sqlx::query_as::<_, FolderVersion>(
            r#"
            INSERT INTO secret_folder_versions (folder_id, env_id, name, version)
            VALUES ($1, $2, $3, $4)
            RETURNING id, folder_id, env_id, name, version, created_at
            "#,
        )
        .bind(version.folder_id)
        .bind(version.env_id)
        .bind(&version.name)
        .bind(version.version)
        .fetch_one(&mut **tx)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to record folder version", e)
        })
    }

    /// Record a batch of folder versions inside the caller's transaction.
    pub async fn insert_many(
        &self,
        tx: &mut Tx<'_>,
        versions: &[NewFolderVersion],
    ) -> AppResult<Vec<FolderVersion>> {
        let mut created = Vec::with_capacity(versions.len());
        for version in versions {
            created.push(self.insert(tx, version).await?);
        }
        Ok(created)
    }

    /// List the version history of a folder, newest first.
    pub async fn find_by_folder_id(&self, folder_id: Uuid) -> AppResult<Vec<FolderVersion>> {
        sqlx::query_as::<_, FolderVersion>(
            r#"
            SELECT id, folder_id, env_id, name, version, created_at
            FROM secret_folder_versions
            WHERE folder_id = $1
            ORDER BY version DESC
            "#,
        )
        .bind(folder_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to list folder versions", e)
        })
    }
}
