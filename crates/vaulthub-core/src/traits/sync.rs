//! Integration sync collaborator boundary.

use uuid::Uuid;

/// Identifies the scope of secrets that changed, for downstream delivery.
#[derive(Debug, Clone)]
pub struct SecretSyncRequest {
    /// The project the mutation happened in.
    pub project_id: Uuid,
    /// Environment slug.
    pub environment: String,
    /// Folder path of the mutated secrets.
    pub secret_path: String,
}

/// Queues webhook/integration delivery after a secret mutation.
///
/// Best-effort: implementations enqueue asynchronously and the engine
/// never awaits delivery. A lost notification degrades freshness, not
/// correctness.
pub trait SyncNotifier: Send + Sync {
    /// Queue downstream sync for the given scope.
    fn queue_secret_sync(&self, request: SecretSyncRequest);
}
