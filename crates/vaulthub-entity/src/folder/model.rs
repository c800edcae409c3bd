//! Folder entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Reserved name of every environment's tree root.
///
/// Never change this; existing rows depend on it.
pub const ROOT_FOLDER_NAME: &str = "root";

/// A folder in a per-environment secret namespace.
///
/// Folders form a strict tree: children are only ever created with a
/// pre-existing validated parent in the same environment, and the chain
/// of `parent_id` links terminates at the environment's root.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Folder {
    /// Unique folder identifier.
    pub id: Uuid,
    /// The environment this folder belongs to.
    pub env_id: Uuid,
    /// Parent folder (None only for the root).
    pub parent_id: Option<Uuid>,
    /// Folder name.
    pub name: String,
    /// Bumped on every rename; starts at 1.
    pub version: i32,
    /// When the folder was created.
    pub created_at: DateTime<Utc>,
    /// When the folder was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Folder {
    /// Check if this is the environment root.
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

/// Data required to insert a new folder row.
///
/// The id is generated by the caller so that a chain of folders can be
/// materialized in one batch with parent links already wired up.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewFolder {
    /// Pre-generated folder id.
    pub id: Uuid,
    /// The owning environment.
    pub env_id: Uuid,
    /// Parent folder id.
    pub parent_id: Uuid,
    /// Folder name.
    pub name: String,
}

impl NewFolder {
    /// Create a new folder insert record with a fresh id.
    pub fn new(env_id: Uuid, parent_id: Uuid, name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            env_id,
            parent_id,
            name: name.into(),
        }
    }
}

/// Result row of the recursive path-walk queries: a folder joined with
/// its depth below the root and its full materialized path.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct FolderWithPath {
    /// Unique folder identifier.
    pub id: Uuid,
    /// The environment this folder belongs to.
    pub env_id: Uuid,
    /// Parent folder (None only for the root).
    pub parent_id: Option<Uuid>,
    /// Folder name.
    pub name: String,
    /// Bumped on every rename; starts at 1.
    pub version: i32,
    /// When the folder was created.
    pub created_at: DateTime<Utc>,
    /// When the folder was last updated.
    pub updated_at: DateTime<Utc>,
    /// Depth in the walk; the root is depth 1.
    pub depth: i32,
    /// Full path from the root, `/` for the root itself.
    pub path: String,
}

impl FolderWithPath {
    /// Drop the walk columns, keeping the plain folder row.
    pub fn into_folder(self) -> Folder {
        Folder {
            id: self.id,
            env_id: self.env_id,
            parent_id: self.parent_id,
            name: self.name,
            version: self.version,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}
