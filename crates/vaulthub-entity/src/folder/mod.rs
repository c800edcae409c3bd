//! Folder tree entities.

pub mod model;
pub mod version;

pub use model::{Folder, FolderWithPath, NewFolder, ROOT_FOLDER_NAME};
pub use version::{FolderVersion, NewFolderVersion};
