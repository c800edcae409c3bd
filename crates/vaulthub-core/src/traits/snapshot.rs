//! Snapshot collaborator boundary.

use async_trait::async_trait;
use uuid::Uuid;

use crate::result::AppResult;

/// Notifies the history/rollback subsystem after a structural mutation.
///
/// Invoked with the folder whose effective content changed: for folder
/// rename/delete that is the mutated folder's *parent*, since the parent's
/// child-set changed. The call is awaited and its failure is escalated to
/// the caller as user-visible, even though the engine does not depend on
/// the snapshot's result.
#[async_trait]
pub trait SnapshotNotifier: Send + Sync {
    /// Capture post-mutation state for the given folder.
    async fn perform_snapshot(&self, folder_id: Uuid) -> AppResult<()>;
}
