//! Secret import CRUD and resolution.
//!
//! An import pulls another folder's Shared secrets into scope. The
//! declaration order is significant: consumers layer imported scopes in
//! position order, so every structural change keeps positions dense.

use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use vaulthub_core::error::AppError;
use vaulthub_core::result::AppResult;
use vaulthub_core::traits::SnapshotNotifier;
use vaulthub_core::types::{normalize_path, path_segments, validate_path};
use vaulthub_database::connection::{commit, DatabasePool};
use vaulthub_database::repositories::environment::EnvironmentRepository;
use vaulthub_database::repositories::folder::FolderRepository;
use vaulthub_database::repositories::secret::SecretRepository;
use vaulthub_database::repositories::secret_import::SecretImportRepository;
use vaulthub_entity::folder::FolderWithPath;
use vaulthub_entity::import::{NewSecretImport, SecretImport, SecretImportWithEnv};
use vaulthub_entity::secret::Secret;

use crate::context::RequestContext;

/// Manages import declarations and resolves their secrets.
#[derive(Clone)]
pub struct ImportService {
    pool: DatabasePool,
    env_repo: Arc<EnvironmentRepository>,
    folder_repo: Arc<FolderRepository>,
    secret_repo: Arc<SecretRepository>,
    import_repo: Arc<SecretImportRepository>,
    snapshots: Arc<dyn SnapshotNotifier>,
}

/// Request to declare an import on a folder.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CreateImportRequest {
    /// Owning project.
    pub project_id: Uuid,
    /// Environment slug of the declaring folder.
    pub environment: String,
    /// Path of the declaring folder.
    pub secret_path: String,
    /// Environment slug of the imported folder.
    pub import_environment: String,
    /// Path of the imported folder.
    pub import_path: String,
}

/// Request to change an import's source or position.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct UpdateImportRequest {
    /// Owning project.
    pub project_id: Uuid,
    /// Environment slug of the declaring folder.
    pub environment: String,
    /// Path of the declaring folder.
    pub secret_path: String,
    /// The import to update.
    pub import_id: Uuid,
    /// New imported environment slug, if changing.
    pub import_environment: Option<String>,
    /// New imported path, if changing.
    pub import_path: Option<String>,
    /// New position in the folder's import list, if moving.
    pub position: Option<i32>,
}

/// Request to remove an import.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct DeleteImportRequest {
    /// Owning project.
    pub project_id: Uuid,
    /// Environment slug of the declaring folder.
    pub environment: String,
    /// Path of the declaring folder.
    pub secret_path: String,
    /// The import to remove.
    pub import_id: Uuid,
}

/// The Shared secrets contributed by one resolved import.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ImportedSecretGroup {
    /// Environment slug the secrets came from.
    pub environment: String,
    /// Path the secrets came from.
    pub secret_path: String,
    /// The imported Shared secrets.
    pub secrets: Vec<Secret>,
}

impl ImportService {
    /// Creates a new import service.
    pub fn new(
        pool: DatabasePool,
        env_repo: Arc<EnvironmentRepository>,
        folder_repo: Arc<FolderRepository>,
        secret_repo: Arc<SecretRepository>,
        import_repo: Arc<SecretImportRepository>,
        snapshots: Arc<dyn SnapshotNotifier>,
    ) -> Self {
        Self {
            pool,
            env_repo,
            folder_repo,
            secret_repo,
            import_repo,
            snapshots,
        }
    }

    async fn resolve_folder(
        &self,
        project_id: Uuid,
        environment: &str,
        secret_path: &str,
    ) -> AppResult<FolderWithPath> {
        let env = self
            .env_repo
            .find_by_slug(project_id, environment)
            .await?
            .ok_or_else(|| {
                AppError::not_found(format!("Environment '{environment}' not found in project"))
            })?;
        let path = normalize_path(secret_path);
        validate_path(&path)?;
        let segments = path_segments(&path);
        self.folder_repo
            .find_by_path(env.id, &segments)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Folder '{path}' not found")))
    }

    /// List a folder's imports in position order.
    pub async fn list_imports(
        &self,
        _ctx: &RequestContext,
        project_id: Uuid,
        environment: &str,
        secret_path: &str,
    ) -> AppResult<Vec<SecretImportWithEnv>> {
        let folder = self
            .resolve_folder(project_id, environment, secret_path)
            .await?;
        self.import_repo.find_by_folder_id(folder.id).await
    }

    /// Declare a new import at the end of the folder's import list.
    pub async fn create_import(
        &self,
        ctx: &RequestContext,
        req: CreateImportRequest,
    ) -> AppResult<SecretImport> {
        let folder = self
            .resolve_folder(req.project_id, &req.environment, &req.secret_path)
            .await?;
        let import_env = self
            .env_repo
            .find_by_slug(req.project_id, &req.import_environment)
            .await?
            .ok_or_else(|| {
                AppError::not_found(format!(
                    "Environment '{}' not found in project",
                    req.import_environment
                ))
            })?;
        let import_path = normalize_path(&req.import_path);
        validate_path(&import_path)?;

        if req.import_environment == req.environment && import_path == folder.path {
            return Err(AppError::validation("A folder cannot import itself"));
        }
        if self
            .import_repo
            .find_duplicate(folder.id, import_env.id, &import_path)
            .await?
            .is_some()
        {
            return Err(AppError::conflict("Import already exists on this folder"));
        }

        let mut tx = self.pool.begin().await?;
        let position = self.import_repo.next_position(&mut tx, folder.id).await?;
        let import = self
            .import_repo
            .create(
                &mut tx,
                &NewSecretImport {
                    folder_id: folder.id,
                    import_env_id: import_env.id,
                    import_path,
                    position,
                },
            )
            .await?;
        commit(tx).await?;

        self.snapshots.perform_snapshot(folder.id).await?;

        info!(
            import_id = %import.id,
            folder_id = %folder.id,
            actor_id = %ctx.actor_id,
            "Secret import created"
        );
        Ok(import)
    }

    /// Change an import's source declaration and/or position.
    pub async fn update_import(
        &self,
        ctx: &RequestContext,
        req: UpdateImportRequest,
    ) -> AppResult<SecretImport> {
        let folder = self
            .resolve_folder(req.project_id, &req.environment, &req.secret_path)
            .await?;
        let import = self.require_import(folder.id, req.import_id).await?;

        let import_env_id = match &req.import_environment {
            Some(slug) => {
                self.env_repo
                    .find_by_slug(req.project_id, slug)
                    .await?
                    .ok_or_else(|| {
                        AppError::not_found(format!("Environment '{slug}' not found in project"))
                    })?
                    .id
            }
            None => import.import_env_id,
        };
        let import_path = match &req.import_path {
            Some(path) => {
                let path = normalize_path(path);
                validate_path(&path)?;
                path
            }
            None => import.import_path.clone(),
        };

        let mut tx = self.pool.begin().await?;
        let mut updated = self
            .import_repo
            .update_source(&mut tx, import.id, import_env_id, &import_path)
            .await?
            .ok_or_else(|| AppError::not_found("Import not found"))?;

        if let Some(requested) = req.position {
            let count = self.import_repo.find_by_folder_id(folder.id).await?.len() as i32;
            let target = requested.clamp(0, (count - 1).max(0));
            if let Some((from, to, delta)) = position_shift(import.position, target) {
                self.import_repo
                    .shift_positions(&mut tx, folder.id, from, to, delta, import.id)
                    .await?;
                updated = self
                    .import_repo
                    .set_position(&mut tx, import.id, target)
                    .await?
                    .ok_or_else(|| AppError::not_found("Import not found"))?;
            }
        }
        commit(tx).await?;

        self.snapshots.perform_snapshot(folder.id).await?;

        info!(
            import_id = %updated.id,
            actor_id = %ctx.actor_id,
            "Secret import updated"
        );
        Ok(updated)
    }

    /// Remove an import and close the position gap it leaves.
    pub async fn delete_import(
        &self,
        ctx: &RequestContext,
        req: DeleteImportRequest,
    ) -> AppResult<SecretImport> {
        let folder = self
            .resolve_folder(req.project_id, &req.environment, &req.secret_path)
            .await?;
        let import = self.require_import(folder.id, req.import_id).await?;

        let mut tx = self.pool.begin().await?;
        let deleted = self
            .import_repo
            .delete(&mut tx, import.id)
            .await?
            .ok_or_else(|| AppError::not_found("Import not found"))?;
        self.import_repo
            .decrement_after(&mut tx, folder.id, deleted.position)
            .await?;
        commit(tx).await?;

        self.snapshots.perform_snapshot(folder.id).await?;

        info!(
            import_id = %deleted.id,
            actor_id = %ctx.actor_id,
            "Secret import deleted"
        );
        Ok(deleted)
    }

    /// Resolve a folder's imports to the Shared secrets they contribute,
    /// in declaration order.
    ///
    /// All imported folders are located in one batched path query;
    /// imports whose folder no longer exists contribute an empty group.
    pub async fn resolve_imported_secrets(
        &self,
        folder_id: Uuid,
    ) -> AppResult<Vec<ImportedSecretGroup>> {
        let imports = self.import_repo.find_by_folder_id(folder_id).await?;
        if imports.is_empty() {
            return Ok(Vec::new());
        }

        let pairs: Vec<(Uuid, String)> = imports
            .iter()
            .map(|i| (i.import_env_id, i.import_path.clone()))
            .collect();
        let folders = self.folder_repo.find_by_paths(&pairs).await?;

        let mut groups = Vec::with_capacity(imports.len());
        for import in &imports {
            let target = folders
                .iter()
                .find(|f| f.env_id == import.import_env_id && f.path == import.import_path);
            let secrets = match target {
                Some(folder) => self.secret_repo.find_by_folder_id(folder.id, None).await?,
                None => Vec::new(),
            };
            groups.push(ImportedSecretGroup {
                environment: import.import_env_slug.clone(),
                secret_path: import.import_path.clone(),
                secrets,
            });
        }
        Ok(groups)
    }

    async fn require_import(&self, folder_id: Uuid, import_id: Uuid) -> AppResult<SecretImport> {
        let import = self
            .import_repo
            .find_by_id(import_id)
            .await?
            .ok_or_else(|| AppError::not_found("Import not found"))?;
        if import.folder_id != folder_id {
            return Err(AppError::not_found("Import not found on this folder"));
        }
        Ok(import)
    }
}

/// The window `[from, to]` and delta to shift when moving an import
/// from `old` to `new`, or `None` when nothing moves.
fn position_shift(old: i32, new: i32) -> Option<(i32, i32, i32)> {
    match new.cmp(&old) {
        std::cmp::Ordering::Equal => None,
        std::cmp::Ordering::Less => Some((new, old - 1, 1)),
        std::cmp::Ordering::Greater => Some((old + 1, new, -1)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_shift_noop() {
        assert_eq!(position_shift(2, 2), None);
    }

    #[test]
    fn test_position_shift_moving_up() {
        // Moving 4 -> 1 pushes [1, 3] down by one.
        assert_eq!(position_shift(4, 1), Some((1, 3, 1)));
    }

    #[test]
    fn test_position_shift_moving_down() {
        // Moving 0 -> 3 pulls [1, 3] up by one.
        assert_eq!(position_shift(0, 3), Some((1, 3, -1)));
    }
}
