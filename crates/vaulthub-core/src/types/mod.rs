//! Shared types used across crates.

pub mod actor;
pub mod secret_path;

pub use actor::ActorType;
pub use secret_path::{is_valid_folder_name, join_path, normalize_path, path_segments, validate_path};
