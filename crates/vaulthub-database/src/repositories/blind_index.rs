//! Repository for per-project blind index salt configuration.

use sqlx::PgPool;
use uuid::Uuid;

use vaulthub_core::error::{AppError, ErrorKind};
use vaulthub_core::result::AppResult;
use vaulthub_entity::secret::SecretBlindIndexConfig;

/// Repository for blind index configuration rows.
///
/// Configuration rows are provisioned once per project outside this
/// engine; only reads happen here.
#[derive(Debug, Clone)]
pub struct BlindIndexConfigRepository {
    pool: PgPool,
}

impl BlindIndexConfigRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find the blind index configuration for a project.
    pub async fn find_by_project_id(
        &self,
        project_id: Uuid,
    ) -> AppResult<Option<SecretBlindIndexConfig>> {
        sqlx::query_as::<_, SecretBlindIndexConfig>(
            r#"
            SELECT id, project_id, encrypted_salt_ciphertext, salt_iv, salt_tag,
                   algorithm, key_encoding, created_at
            FROM secret_blind_index_configs
            WHERE project_id = $1
            "#,
        )
        .bind(project_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to find blind index config", e)
        })
    }
}
