//! Repository for secret import declarations.
//!
//! Import positions within one folder are a dense `0..N-1` sequence;
//! every write that disturbs the ordering shifts the affected window
//! inside the caller's transaction.

use sqlx::PgPool;
use uuid::Uuid;

use vaulthub_core::error::{AppError, ErrorKind};
use vaulthub_core::result::AppResult;
use vaulthub_entity::import::{NewSecretImport, SecretImport, SecretImportWithEnv};

use crate::Tx;

const IMPORT_COLUMNS: &str =
    "id, folder_id, import_env_id, import_path, position, created_at, updated_at";

/// Repository for import rows.
#[derive(Debug, Clone)]
pub struct SecretImportRepository {
    pool: PgPool,
}

impl SecretImportRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find an import by id.
    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Option<SecretImport>> {
        let sql = format!("SELECT {IMPORT_COLUMNS} FROM secret_imports WHERE id = $1");
        sqlx::query_as::<_, SecretImport>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find import", e))
    }

    /// List a folder's imports in position order, joined with the
    /// imported environment's slug and name.
    pub async fn find_by_folder_id(&self, folder_id: Uuid) -> AppResult<Vec<SecretImportWithEnv>> {
        sqlx::query_as::<_, SecretImportWithEnv>(
            r#"
            SELECT i.id, i.folder_id, i.import_env_id,
                   e.slug AS import_env_slug, e.name AS import_env_name,
                   i.import_path, i.position, i.created_at, i.updated_at
            FROM secret_imports i
            JOIN environments e ON e.id = i.import_env_id
            WHERE i.folder_id = $1
            ORDER BY i.position ASC
            "#,
        )
        .bind(folder_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list imports", e))
    }

    /// Find an existing import matching the same source declaration.
    pub async fn find_duplicate(
        &self,
        folder_id: Uuid,
        import_env_id: Uuid,
        import_path: &str,
    ) -> AppResult<Option<SecretImport>> {
        let sql = format!(
            "SELECT {IMPORT_COLUMNS} FROM secret_imports
            WHERE folder_id = $1 AND import_env_id = $2 AND import_path = $3"
        );
        sqlx::query_as::<_, SecretImport>(&sql)
            .bind(folder_id)
            .bind(import_env_id)
            .bind(import_path)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to check for duplicate import", e)
            })
    }

    /// Next free position at the end of a folder's import list.
    pub async fn next_position(&self, tx: &mut Tx<'_>, folder_id: Uuid) -> AppResult<i32> {
        sqlx::query_scalar::<_, i32>(
            "SELECT COALESCE(MAX(position) + 1, 0) FROM secret_imports WHERE folder_id = $1",
        )
        .bind(folder_id)
        .fetch_one(&mut **tx)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to compute import position", e)
        })
    }

    /// Insert an import at its assigned position inside the caller's
    /// transaction.
    pub async fn create(&self, tx: &mut Tx<'_>, import: &NewSecretImport) -> AppResult<SecretImport> {
        let sql = format!(
            "INSERT INTO secret_imports (folder_id, import_env_id, import_path, position)
            VALUES ($1, $2, $3, $4)
            RETURNING {IMPORT_COLUMNS}"
        );
        sqlx::query_as::<_, SecretImport>(&sql)
            .bind(import.folder_id)
            .bind(import.import_env_id)
            .bind(&import.import_path)
            .bind(import.position)
            .fetch_one(&mut **tx)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to create import", e))
    }

    /// Update an import's source declaration.
    pub async fn update_source(
        &self,
        tx: &mut Tx<'_>,
        id: Uuid,
        import_env_id: Uuid,
        import_path: &str,
    ) -> AppResult<Option<SecretImport>> {
        let sql = format!(
            "UPDATE secret_imports
            SET import_env_id = $2, import_path = $3, updated_at = NOW()
            WHERE id = $1
            RETURNING {IMPORT_COLUMNS}"
        );
        sqlx::query_as::<_, SecretImport>(&sql)
            .bind(id)
            .bind(import_env_id)
            .bind(import_path)
            .fetch_optional(&mut **tx)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to update import", e))
    }

    /// Move an import to a new position.
    pub async fn set_position(
        &self,
        tx: &mut Tx<'_>,
        id: Uuid,
        position: i32,
    ) -> AppResult<Option<SecretImport>> {
        let sql = format!(
            "UPDATE secret_imports
            SET position = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING {IMPORT_COLUMNS}"
        );
        sqlx::query_as::<_, SecretImport>(&sql)
            .bind(id)
            .bind(position)
            .fetch_optional(&mut **tx)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to move import", e))
    }

    /// Shift every import of a folder within `[from, to]` by `delta`,
    /// excluding one row. Used to open or close a gap before moving
    /// that row into place.
    pub async fn shift_positions(
        &self,
        tx: &mut Tx<'_>,
        folder_id: Uuid,
        from: i32,
        to: i32,
        delta: i32,
        exclude_id: Uuid,
    ) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE secret_imports
            SET position = position + $4, updated_at = NOW()
            WHERE folder_id = $1 AND position >= $2 AND position <= $3 AND id <> $5
            "#,
        )
        .bind(folder_id)
        .bind(from)
        .bind(to)
        .bind(delta)
        .bind(exclude_id)
        .execute(&mut **tx)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to shift import positions", e)
        })?;
        Ok(())
    }

    /// Close the gap left behind a removed position.
    pub async fn decrement_after(
        &self,
        tx: &mut Tx<'_>,
        folder_id: Uuid,
        position: i32,
    ) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE secret_imports
            SET position = position - 1, updated_at = NOW()
            WHERE folder_id = $1 AND position > $2
            "#,
        )
        .bind(folder_id)
        .bind(position)
        .execute(&mut **tx)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to compact import positions", e)
        })?;
        Ok(())
    }

    /// Delete an import, returning the removed row.
    pub async fn delete(&self, tx: &mut Tx<'_>, id: Uuid) -> AppResult<Option<SecretImport>> {
        let sql = format!(
            "DELETE FROM secret_imports WHERE id = $1 RETURNING {IMPORT_COLUMNS}"
        );
        sqlx::query_as::<_, SecretImport>(&sql)
            .bind(id)
            .fetch_optional(&mut **tx)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to delete import", e))
    }
}
