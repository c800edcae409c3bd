//! Folder CRUD with path materialization and version history.

use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use vaulthub_core::error::AppError;
use vaulthub_core::result::AppResult;
use vaulthub_core::traits::SnapshotNotifier;
use vaulthub_core::types::{
    is_valid_folder_name, join_path, normalize_path, path_segments, validate_path,
};
use vaulthub_database::connection::{commit, DatabasePool};
use vaulthub_database::repositories::environment::EnvironmentRepository;
use vaulthub_database::repositories::folder::FolderRepository;
use vaulthub_database::repositories::folder_version::FolderVersionRepository;
use vaulthub_entity::environment::Environment;
use vaulthub_entity::folder::{Folder, FolderVersion, FolderWithPath, NewFolder, NewFolderVersion};

use crate::context::RequestContext;

/// Manages the folder hierarchy of each environment.
#[derive(Clone)]
pub struct FolderService {
    pool: DatabasePool,
    env_repo: Arc<EnvironmentRepository>,
    folder_repo: Arc<FolderRepository>,
    folder_version_repo: Arc<FolderVersionRepository>,
    snapshots: Arc<dyn SnapshotNotifier>,
}

/// Request to create a folder, materializing missing ancestors.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CreateFolderRequest {
    /// Owning project.
    pub project_id: Uuid,
    /// Environment slug.
    pub environment: String,
    /// Path of the parent folder.
    pub parent_path: String,
    /// Name of the folder to create.
    pub name: String,
}

/// Request to rename a folder.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct UpdateFolderRequest {
    /// Owning project.
    pub project_id: Uuid,
    /// Environment slug.
    pub environment: String,
    /// Path of the parent folder.
    pub parent_path: String,
    /// Folder id, or its current name for older callers.
    pub id_or_name: String,
    /// The new folder name.
    pub new_name: String,
}

/// Request to delete a folder and its subtree.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct DeleteFolderRequest {
    /// Owning project.
    pub project_id: Uuid,
    /// Environment slug.
    pub environment: String,
    /// Path of the parent folder.
    pub parent_path: String,
    /// Folder id, or its current name for older callers.
    pub id_or_name: String,
}

impl FolderService {
    /// Creates a new folder service.
    pub fn new(
        pool: DatabasePool,
        env_repo: Arc<EnvironmentRepository>,
        folder_repo: Arc<FolderRepository>,
        folder_version_repo: Arc<FolderVersionRepository>,
        snapshots: Arc<dyn SnapshotNotifier>,
    ) -> Self {
        Self {
            pool,
            env_repo,
            folder_repo,
            folder_version_repo,
            snapshots,
        }
    }

    async fn require_environment(
        &self,
        project_id: Uuid,
        environment: &str,
    ) -> AppResult<Environment> {
        self.env_repo
            .find_by_slug(project_id, environment)
            .await?
            .ok_or_else(|| {
                AppError::not_found(format!("Environment '{environment}' not found in project"))
            })
    }

    /// Resolve a normalized path to its folder, or fail with NotFound.
    pub async fn resolve_folder(
        &self,
        env_id: Uuid,
        secret_path: &str,
    ) -> AppResult<FolderWithPath> {
        let path = normalize_path(secret_path);
        validate_path(&path)?;
        let segments = path_segments(&path);
        self.folder_repo
            .find_by_path(env_id, &segments)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Folder '{path}' not found")))
    }

    /// List a folder's rename history, newest first.
    pub async fn folder_versions(
        &self,
        _ctx: &RequestContext,
        folder_id: Uuid,
    ) -> AppResult<Vec<FolderVersion>> {
        self.folder_version_repo.find_by_folder_id(folder_id).await
    }

    /// Materialized path of a folder, e.g. `/app/db`.
    pub async fn folder_path(&self, folder_id: Uuid) -> AppResult<String> {
        self.folder_repo
            .full_path(folder_id)
            .await?
            .ok_or_else(|| AppError::not_found("Folder not found"))
    }

    /// List the direct children of the folder at a path.
    pub async fn list_folders(
        &self,
        _ctx: &RequestContext,
        project_id: Uuid,
        environment: &str,
        secret_path: &str,
    ) -> AppResult<Vec<Folder>> {
        let env = self.require_environment(project_id, environment).await?;
        let parent = self.resolve_folder(env.id, secret_path).await?;
        self.folder_repo.find_children(parent.id).await
    }

    /// Create a folder, materializing every missing ancestor on its
    /// path inside one transaction.
    ///
    /// Creating a folder that already exists is a no-op returning the
    /// existing row unchanged.
    pub async fn create_folder(
        &self,
        ctx: &RequestContext,
        req: CreateFolderRequest,
    ) -> AppResult<Folder> {
        if !is_valid_folder_name(&req.name) {
            return Err(AppError::validation(format!(
                "Invalid folder name '{}'",
                req.name
            )));
        }
        let env = self
            .require_environment(req.project_id, &req.environment)
            .await?;

        let full_path = join_path(&req.parent_path, &req.name);
        validate_path(&full_path)?;
        let segments = path_segments(&full_path);

        let closest = self
            .folder_repo
            .find_closest_by_path(env.id, &segments)
            .await?
            .ok_or_else(|| {
                AppError::not_found(format!(
                    "Environment '{}' has no root folder",
                    req.environment
                ))
            })?;

        let missing = missing_segments(closest.depth, &segments);
        if missing.is_empty() {
            // Full path already exists.
            return Ok(closest.into_folder());
        }

        let anchor_id = closest.id;
        let chain = build_folder_chain(env.id, anchor_id, missing);
        let versions: Vec<NewFolderVersion> = chain
            .iter()
            .map(|f| NewFolderVersion {
                folder_id: f.id,
                env_id: f.env_id,
                name: f.name.clone(),
                version: 1,
            })
            .collect();

        let mut tx = self.pool.begin().await?;
        let created = self.folder_repo.insert_many(&mut tx, &chain).await?;
        self.folder_version_repo
            .insert_many(&mut tx, &versions)
            .await?;
        commit(tx).await?;

        self.snapshots.perform_snapshot(anchor_id).await?;

        let folder = created
            .into_iter()
            .next_back()
            .ok_or_else(|| AppError::internal("Folder chain insert returned no rows"))?;
        info!(
            folder_id = %folder.id,
            env_id = %env.id,
            actor_id = %ctx.actor_id,
            created = chain.len(),
            "Folder created"
        );
        Ok(folder)
    }

    /// Rename a folder, bumping its version and recording history.
    pub async fn update_folder(
        &self,
        ctx: &RequestContext,
        req: UpdateFolderRequest,
    ) -> AppResult<Folder> {
        if !is_valid_folder_name(&req.new_name) {
            return Err(AppError::validation(format!(
                "Invalid folder name '{}'",
                req.new_name
            )));
        }
        let env = self
            .require_environment(req.project_id, &req.environment)
            .await?;
        let parent = self.resolve_folder(env.id, &req.parent_path).await?;
        let target = self
            .find_by_id_or_name(env.id, parent.id, &req.id_or_name)
            .await?;

        if target.is_root() {
            return Err(AppError::validation("The root folder cannot be renamed"));
        }
        if target.name != req.new_name {
            if let Some(existing) = self
                .folder_repo
                .find_one(env.id, parent.id, &req.new_name)
                .await?
            {
                return Err(AppError::conflict(format!(
                    "Folder '{}' already exists at this path",
                    existing.name
                )));
            }
        }

        let mut tx = self.pool.begin().await?;
        let folder = self
            .folder_repo
            .rename(&mut tx, target.id, &req.new_name)
            .await?
            .ok_or_else(|| AppError::not_found("Folder not found"))?;
        self.folder_version_repo
            .insert(
                &mut tx,
                &NewFolderVersion {
                    folder_id: folder.id,
                    env_id: folder.env_id,
                    name: folder.name.clone(),
                    version: folder.version,
                },
            )
            .await?;
        commit(tx).await?;

        self.snapshots.perform_snapshot(parent.id).await?;

        info!(
            folder_id = %folder.id,
            actor_id = %ctx.actor_id,
            new_name = %folder.name,
            "Folder renamed"
        );
        Ok(folder)
    }

    /// Delete a folder and its whole subtree.
    pub async fn delete_folder(
        &self,
        ctx: &RequestContext,
        req: DeleteFolderRequest,
    ) -> AppResult<Folder> {
        let env = self
            .require_environment(req.project_id, &req.environment)
            .await?;
        let parent = self.resolve_folder(env.id, &req.parent_path).await?;
        let target = self
            .find_by_id_or_name(env.id, parent.id, &req.id_or_name)
            .await?;

        let mut tx = self.pool.begin().await?;
        let deleted = self
            .folder_repo
            .delete(&mut tx, target.id, env.id)
            .await?
            .ok_or_else(|| AppError::not_found("Folder not found"))?;
        commit(tx).await?;

        self.snapshots.perform_snapshot(parent.id).await?;

        info!(
            folder_id = %deleted.id,
            actor_id = %ctx.actor_id,
            "Folder deleted"
        );
        Ok(deleted)
    }

    /// Resolve a folder under a parent by id, falling back to name for
    /// callers that still address folders by name.
    async fn find_by_id_or_name(
        &self,
        env_id: Uuid,
        parent_id: Uuid,
        id_or_name: &str,
    ) -> AppResult<Folder> {
        if let Ok(id) = id_or_name.parse::<Uuid>() {
            if let Some(folder) = self.folder_repo.find_by_id(id).await? {
                if folder.env_id == env_id && folder.parent_id == Some(parent_id) {
                    return Ok(folder);
                }
            }
        }
        self.folder_repo
            .find_one(env_id, parent_id, id_or_name)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Folder '{id_or_name}' not found")))
    }
}

/// The trailing segments of `segments` not yet covered by the deepest
/// existing folder. A folder at walk depth `d` covers the first `d - 1`
/// segments.
fn missing_segments(closest_depth: i32, segments: &[String]) -> &[String] {
    let covered = (closest_depth.max(1) as usize) - 1;
    &segments[covered.min(segments.len())..]
}

/// Build the insert chain for a run of missing segments, each folder
/// parented on the previous one starting from `anchor_id`.
fn build_folder_chain(env_id: Uuid, anchor_id: Uuid, names: &[String]) -> Vec<NewFolder> {
    let mut chain = Vec::with_capacity(names.len());
    let mut parent_id = anchor_id;
    for name in names {
        let folder = NewFolder::new(env_id, parent_id, name.clone());
        parent_id = folder.id;
        chain.push(folder);
    }
    chain
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segs(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_missing_segments_from_root() {
        let segments = segs(&["app", "db"]);
        assert_eq!(missing_segments(1, &segments), segments.as_slice());
    }

    #[test]
    fn test_missing_segments_partially_covered() {
        let segments = segs(&["app", "db"]);
        assert_eq!(missing_segments(2, &segments), &segments[1..]);
        assert!(missing_segments(3, &segments).is_empty());
    }

    #[test]
    fn test_missing_segments_deeper_than_requested() {
        let segments = segs(&["app"]);
        assert!(missing_segments(5, &segments).is_empty());
    }

    #[test]
    fn test_build_folder_chain_links_parents() {
        let env_id = Uuid::new_v4();
        let anchor = Uuid::new_v4();
        let chain = build_folder_chain(env_id, anchor, &segs(&["a", "b", "c"]));

        assert_eq!(chain.len(), 3);
        assert_eq!(chain[0].parent_id, anchor);
        assert_eq!(chain[1].parent_id, chain[0].id);
        assert_eq!(chain[2].parent_id, chain[1].id);
        assert!(chain.iter().all(|f| f.env_id == env_id));
        assert_eq!(chain[2].name, "c");
    }
}
