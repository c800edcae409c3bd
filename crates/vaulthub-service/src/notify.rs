//! Default notifier implementations.
//!
//! Deployments wire real snapshot and sync pipelines in via the traits
//! in `vaulthub-core`; these defaults only record that the hook fired.

use async_trait::async_trait;
use tracing::debug;
use uuid::Uuid;

use vaulthub_core::result::AppResult;
use vaulthub_core::traits::{SecretSyncRequest, SnapshotNotifier, SyncNotifier};

/// Snapshot notifier that logs and succeeds.
#[derive(Debug, Clone, Default)]
pub struct LoggingSnapshotNotifier;

#[async_trait]
impl SnapshotNotifier for LoggingSnapshotNotifier {
    async fn perform_snapshot(&self, folder_id: Uuid) -> AppResult<()> {
        debug!(%folder_id, "Snapshot requested");
        Ok(())
    }
}

/// Sync notifier that logs and drops the request.
#[derive(Debug, Clone, Default)]
pub struct LoggingSyncNotifier;

impl SyncNotifier for LoggingSyncNotifier {
    fn queue_secret_sync(&self, request: SecretSyncRequest) {
        debug!(
            project_id = %request.project_id,
            environment = %request.environment,
            secret_path = %request.secret_path,
            "Secret sync queued"
        );
    }
}
