//! Secret import entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A folder-level declaration pulling another folder's Shared secrets
/// into scope.
///
/// `position` values for one `folder_id` always form a dense `0..N-1`
/// sequence; every structural change rewrites the affected window inside
/// the same transaction.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SecretImport {
    /// Unique import identifier.
    pub id: Uuid,
    /// The folder that declares the import.
    pub folder_id: Uuid,
    /// Environment of the imported folder.
    pub import_env_id: Uuid,
    /// Path of the imported folder within its environment.
    pub import_path: String,
    /// Zero-based dense ordering within the declaring folder.
    pub position: i32,
    /// When the import was created.
    pub created_at: DateTime<Utc>,
    /// When the import was last updated.
    pub updated_at: DateTime<Utc>,
}

/// Import row joined with the imported environment's slug and name,
/// as returned by the ordered listing query.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SecretImportWithEnv {
    /// Unique import identifier.
    pub id: Uuid,
    /// The folder that declares the import.
    pub folder_id: Uuid,
    /// Environment of the imported folder.
    pub import_env_id: Uuid,
    /// Slug of the imported environment.
    pub import_env_slug: String,
    /// Name of the imported environment.
    pub import_env_name: String,
    /// Path of the imported folder within its environment.
    pub import_path: String,
    /// Zero-based dense ordering within the declaring folder.
    pub position: i32,
    /// When the import was created.
    pub created_at: DateTime<Utc>,
    /// When the import was last updated.
    pub updated_at: DateTime<Utc>,
}

/// Data required to insert a new import row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSecretImport {
    /// The folder that declares the import.
    pub folder_id: Uuid,
    /// Environment of the imported folder.
    pub import_env_id: Uuid,
    /// Path of the imported folder.
    pub import_path: String,
    /// Position to insert at.
    pub position: i32,
}
