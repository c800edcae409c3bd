//! Repository implementations.

pub mod blind_index;
pub mod environment;
pub mod folder;
pub mod folder_version;
pub mod secret;
pub mod secret_import;
pub mod secret_tag;
pub mod secret_version;
