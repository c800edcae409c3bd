//! Repository for the folder hierarchy.
//!
//! Folders form an adjacency list per environment, anchored by a root
//! folder whose `parent_id` is NULL. Path resolution walks the tree
//! with recursive CTEs instead of materializing paths in a column, so
//! renames never need subtree rewrites.

use sqlx::PgPool;
use uuid::Uuid;

use vaulthub_core::error::{AppError, ErrorKind};
use vaulthub_core::result::AppResult;
use vaulthub_entity::folder::{Folder, FolderWithPath, NewFolder, ROOT_FOLDER_NAME};

use crate::Tx;

/// Downward walk from the root, pruned by the requested path segments.
///
/// `depth` counts from 1 at the root; a child at walk depth `d + 1`
/// must match segment `d` of the requested path, so only folders lying
/// on the requested path are ever visited.
const PATH_WALK_SQL: &str = r#"
    WITH RECURSIVE walk AS (
        SELECT f.id, f.env_id, f.parent_id, f.name, f.version,
               f.created_at, f.updated_at,
               1 AS depth, '/'::TEXT AS path
        FROM secret_folders f
        WHERE f.env_id = $1 AND f.parent_id IS NULL AND f.name = $2
        UNION ALL
        SELECT c.id, c.env_id, c.parent_id, c.name, c.version,
               c.created_at, c.updated_at,
               w.depth + 1,
               CASE WHEN w.path = '/' THEN '' ELSE w.path END || '/' || c.name
        FROM secret_folders c
        JOIN walk w ON c.parent_id = w.id
        WHERE c.name = ($3::TEXT[])[w.depth]
    )
"#;

/// Repository for folder rows.
#[derive(Debug, Clone)]
pub struct FolderRepository {
    pool: PgPool,
}

impl FolderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a folder by id.
    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Folder>> {
        sqlx::query_as::<_, Folder>(
            r#"
            SELECT id, env_id, parent_id, name, version, created_at, updated_at
            FROM secret_folders
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find folder by id", e))
    }

    /// Find a direct child by name under a parent.
    pub async fn find_one(
        &self,
        env_id: Uuid,
        parent_id: Uuid,
        name: &str,
    ) -> AppResult<Option<Folder>> {
        sqlx::query_as::<_, Folder>(
            r#"
            SELECT id, env_id, parent_id, name, version, created_at, updated_at
            FROM secret_folders
            WHERE env_id = $1 AND parent_id = $2 AND name = $3
            "#,
        )
        .bind(env_id)
        .bind(parent_id)
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find folder", e))
    }

    /// List the direct children of a folder, sorted by name.
    pub async fn find_children(&self, parent_id: Uuid) -> AppResult<Vec<Folder>> {
        sqlx::query_as::<_, Folder>(
            r#"
            SELECT id, env_id, parent_id, name, version, created_at, updated_at
            FROM secret_folders
            WHERE parent_id = $1
            ORDER BY name ASC
            "#,
        )
        .bind(parent_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list folders", e))
    }

    /// Resolve an exact path within an environment.
    ///
    /// `segments` is the normalized path split on `/`; an empty slice
    /// resolves to the root folder.
    pub async fn find_by_path(
        &self,
        env_id: Uuid,
        segments: &[String],
    ) -> AppResult<Option<FolderWithPath>> {
        let target_depth = segments.len() as i32 + 1;
        let sql = format!(
            "{PATH_WALK_SQL}
            SELECT id, env_id, parent_id, name, version, created_at, updated_at, depth, path
            FROM walk
            WHERE depth = $4
            LIMIT 1"
        );
        sqlx::query_as::<_, FolderWithPath>(&sql)
            .bind(env_id)
            .bind(ROOT_FOLDER_NAME)
            .bind(segments)
            .bind(target_depth)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to resolve folder path", e)
            })
    }

    /// Resolve the deepest existing folder along a path.
    ///
    /// Always finds at least the root when the environment is
    /// provisioned; used to compute which trailing segments are
    /// missing before materializing them.
    pub async fn find_closest_by_path(
        &self,
        env_id: Uuid,
        segments: &[String],
    ) -> AppResult<Option<FolderWithPath>> {
        let sql = format!(
            "{PATH_WALK_SQL}
            SELECT id, env_id, parent_id, name, version, created_at, updated_at, depth, path
            FROM walk
            ORDER BY depth DESC
            LIMIT 1"
        );
        sqlx::query_as::<_, FolderWithPath>(&sql)
            .bind(env_id)
            .bind(ROOT_FOLDER_NAME)
            .bind(segments)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to resolve closest folder", e)
            })
    }

    /// Resolve several `(environment, path)` pairs in a single query.
    ///
    /// Walks each environment's tree once and filters the computed
    /// paths against the requested pairs. Paths must be normalized.
    pub async fn find_by_paths(
        &self,
        pairs: &[(Uuid, String)],
    ) -> AppResult<Vec<FolderWithPath>> {
        if pairs.is_empty() {
            return Ok(Vec::new());
        }
        let env_ids: Vec<Uuid> = pairs.iter().map(|(env, _)| *env).collect();
        let paths: Vec<String> = pairs.iter().map(|(_, path)| path.clone()).collect();

        sqlx::query_as::<_, FolderWithPath>(
            r#"
            WITH RECURSIVE walk AS (
                SELECT f.id, f.env_id, f.parent_id, f.name, f.version,
                       f.created_at, f.updated_at,
                       1 AS depth, '/'::TEXT AS path
                FROM secret_folders f
                WHERE f.env_id = ANY($1) AND f.parent_id IS NULL AND f.name = $3
                UNION ALL
                SELECT c.id, c.env_id, c.parent_id, c.name, c.version,
                       c.created_at, c.updated_at,
                       w.depth + 1,
                       CASE WHEN w.path = '/' THEN '' ELSE w.path END || '/' || c.name
                FROM secret_folders c
                JOIN walk w ON c.parent_id = w.id
            )
            SELECT id, env_id, parent_id, name, version, created_at, updated_at, depth, path
            FROM walk
            WHERE (env_id, path) IN (SELECT * FROM UNNEST($1::UUID[], $2::TEXT[]))
            "#,
        )
        .bind(&env_ids)
        .bind(&paths)
        .bind(ROOT_FOLDER_NAME)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to resolve folder paths", e)
        })
    }

    /// Compute the full path of a folder by walking up to the root.
    ///
    /// Returns `None` when the folder does not exist; the root folder
    /// itself yields `/`.
    pub async fn full_path(&self, folder_id: Uuid) -> AppResult<Option<String>> {
        sqlx::query_scalar::<_, Option<String>>(
            r#"
            WITH RECURSIVE up AS (
                SELECT id, parent_id, name, 1 AS depth
                FROM secret_folders
                WHERE id = $1
                UNION ALL
                SELECT f.id, f.parent_id, f.name, up.depth + 1
                FROM secret_folders f
                JOIN up ON f.id = up.parent_id
            )
            SELECT COALESCE(
                '/' || string_agg(name, '/' ORDER BY depth DESC)
                    FILTER (WHERE parent_id IS NOT NULL),
                '/'
            )
            FROM up
            HAVING COUNT(*) > 0
            "#,
        )
        .bind(folder_id)
        .fetch_optional(&self.pool)
        .await
        .map(Option::flatten)
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to compute folder path", e)
        })
    }

    /// Insert a folder inside the caller's transaction.
    pub async fn create(&self, tx: &mut Tx<'_>, folder: &NewFolder) -> AppResult<Folder> {
        sqlx::query_as::<_, Folder>(
            r#"
            INSERT INTO secret_folders (id, env_id, parent_id, name, version)
            VALUES ($1, $2, $3, $4, 1)
            RETURNING id, env_id, parent_id, name, version, created_at, updated_at
            "#,
        )
        .bind(folder.id)
        .bind(folder.env_id)
        .bind(folder.parent_id)
        .bind(&folder.name)
        .fetch_one(&mut **tx)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to create folder", e))
    }

    /// Insert a chain of folders in order, returning the created rows.
    pub async fn insert_many(
        &self,
        tx: &mut Tx<'_>,
        folders: &[NewFolder],
    ) -> AppResult<Vec<Folder>> {
        let mut created = Vec::with_capacity(folders.len());
        for folder in folders {
            created.push(self.create(tx, folder).await?);
        }
        Ok(created)
    }

    /// Rename a folder, bumping its version.
    pub async fn rename(
        &self,
        tx: &mut Tx<'_>,
        id: Uuid,
        name: &str,
    ) -> AppResult<Option<Folder>> {
        sqlx::query_as::<_, Folder>(
            r#"
            UPDATE secret_folders
            SET name = $2, version = version + 1, updated_at = NOW()
            WHERE id = $1
            RETURNING id, env_id, parent_id, name, version, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(name)
        .fetch_optional(&mut **tx)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to rename folder", e))
    }

    /// Delete a non-root folder, cascading to its subtree and contents
    /// through foreign keys.
    pub async fn delete(
        &self,
        tx: &mut Tx<'_>,
        id: Uuid,
        env_id: Uuid,
    ) -> AppResult<Option<Folder>> {
        sqlx::query_as::<_, Folder>(
            r#"
            DELETE FROM secret_folders
            WHERE id = $1 AND env_id = $2 AND parent_id IS NOT NULL
            RETURNING id, env_id, parent_id, name, version, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(env_id)
        .fetch_optional(&mut **tx)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to delete folder", e))
    }
}
