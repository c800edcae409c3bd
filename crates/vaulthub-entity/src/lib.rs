//! # vaulthub-entity
//!
//! Domain entity models for VaultHub: secrets and their version history,
//! the per-environment folder tree, cross-folder imports, tags, and the
//! per-project blind-index configuration.
//!
//! Query-shaped result structs (e.g. [`folder::FolderWithPath`]) are
//! defined explicitly per query rather than assembled dynamically.

pub mod environment;
pub mod folder;
pub mod import;
pub mod secret;
pub mod tag;
