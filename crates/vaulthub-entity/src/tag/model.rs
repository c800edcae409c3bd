//! Secret tag entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A project-scoped label attachable to secrets.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SecretTag {
    /// Unique tag identifier.
    pub id: Uuid,
    /// The owning project.
    pub project_id: Uuid,
    /// URL-safe slug.
    pub slug: String,
    /// Display color, if set.
    pub color: Option<String>,
    /// When the tag was created.
    pub created_at: DateTime<Utc>,
    /// When the tag was last updated.
    pub updated_at: DateTime<Utc>,
}

/// Junction row joining a tag onto a secret, as returned by the
/// batched tag-merge query.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SecretTagLink {
    /// The secret side of the association.
    pub secret_id: Uuid,
    /// Unique tag identifier.
    pub id: Uuid,
    /// The owning project.
    pub project_id: Uuid,
    /// URL-safe slug.
    pub slug: String,
    /// Display color, if set.
    pub color: Option<String>,
    /// When the tag was created.
    pub created_at: DateTime<Utc>,
    /// When the tag was last updated.
    pub updated_at: DateTime<Utc>,
}

impl SecretTagLink {
    /// Split into the secret id and the plain tag.
    pub fn into_parts(self) -> (Uuid, SecretTag) {
        (
            self.secret_id,
            SecretTag {
                id: self.id,
                project_id: self.project_id,
                slug: self.slug,
                color: self.color,
                created_at: self.created_at,
                updated_at: self.updated_at,
            },
        )
    }
}
