//! Environment entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A project environment (e.g. `dev`, `staging`, `prod`).
///
/// Each environment owns exactly one folder tree rooted at the reserved
/// `root` folder. Environments are provisioned outside this engine; they
/// are read here to resolve slugs into tree roots.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Environment {
    /// Unique environment identifier.
    pub id: Uuid,
    /// The owning project.
    pub project_id: Uuid,
    /// URL-safe slug used to address the environment in paths and imports.
    pub slug: String,
    /// Human-readable name.
    pub name: String,
    /// When the environment was created.
    pub created_at: DateTime<Utc>,
    /// When the environment was last updated.
    pub updated_at: DateTime<Utc>,
}
