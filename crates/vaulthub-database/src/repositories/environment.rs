//! Repository for project environments.

use sqlx::PgPool;
use uuid::Uuid;

use vaulthub_core::error::{AppError, ErrorKind};
use vaulthub_core::result::AppResult;
use vaulthub_entity::environment::Environment;

/// Repository for environment lookups.
#[derive(Debug, Clone)]
pub struct EnvironmentRepository {
    pool: PgPool,
}

impl EnvironmentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find an environment by its project and slug.
    pub async fn find_by_slug(&self, project_id: Uuid, slug: &str) -> AppResult<Option<Environment>> {
        sqlx::query_as::<_, Environment>(
            r#"
            SELECT id, project_id, slug, name, created_at, updated_at
            FROM environments
            WHERE project_id = $1 AND slug = $2
            "#,
        )
        .bind(project_id)
        .bind(slug)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find environment by slug", e))
    }
}
