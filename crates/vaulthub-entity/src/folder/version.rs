//! Folder version entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Immutable snapshot of a folder row, appended on create and rename.
///
/// Never updated; deleted only by cascade with its folder.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct FolderVersion {
    /// Unique version identifier.
    pub id: Uuid,
    /// The folder this version belongs to.
    pub folder_id: Uuid,
    /// The environment of the folder at snapshot time.
    pub env_id: Uuid,
    /// Folder name at snapshot time.
    pub name: String,
    /// Folder version number at snapshot time.
    pub version: i32,
    /// When this snapshot was written.
    pub created_at: DateTime<Utc>,
}

/// Data required to insert a folder version snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewFolderVersion {
    /// The folder being snapshotted.
    pub folder_id: Uuid,
    /// The environment of the folder.
    pub env_id: Uuid,
    /// Folder name at snapshot time.
    pub name: String,
    /// Folder version number at snapshot time.
    pub version: i32,
}
