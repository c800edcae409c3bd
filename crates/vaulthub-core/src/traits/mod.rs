//! Collaborator traits consumed by the engine.
//!
//! Encryption primitives, the snapshot/rollback subsystem, and the
//! integration sync queue all live outside this engine. These traits are
//! the seams they are injected through.

pub mod cipher;
pub mod snapshot;
pub mod sync;

pub use cipher::{EncryptedBlob, SecretCipher};
pub use snapshot::SnapshotNotifier;
pub use sync::{SecretSyncRequest, SyncNotifier};
