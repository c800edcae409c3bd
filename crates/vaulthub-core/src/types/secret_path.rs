//! Secret path normalization and validation.
//!
//! Folder paths are slash-delimited, always absolute, with `/` naming the
//! environment root. Segment names are restricted to alphanumerics,
//! hyphens, and underscores so they can be embedded safely in recursive
//! path queries.

use crate::error::AppError;
use crate::result::AppResult;

/// Check that a single folder name contains only allowed characters.
pub fn is_valid_folder_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Strip a trailing slash, keeping `/` itself intact.
pub fn normalize_path(path: &str) -> String {
    if path.len() > 1 && path.ends_with('/') {
        path[..path.len() - 1].to_string()
    } else if path.is_empty() {
        "/".to_string()
    } else {
        path.to_string()
    }
}

/// Split a path into its non-empty segments.
pub fn path_segments(path: &str) -> Vec<String> {
    path.split('/')
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}

/// Validate a full path: every segment must be a valid folder name.
pub fn validate_path(path: &str) -> AppResult<()> {
    if !path.starts_with('/') {
        return Err(AppError::validation(format!(
            "Secret path '{path}' must be absolute"
        )));
    }
    for segment in path.split('/').filter(|s| !s.is_empty()) {
        if !is_valid_folder_name(segment) {
            return Err(AppError::validation(
                "Invalid secret path. Only alphanumeric characters, dashes, and underscores are allowed.",
            ));
        }
    }
    Ok(())
}

/// Join a parent path and a child name into a normalized absolute path.
pub fn join_path(parent: &str, name: &str) -> String {
    let parent = normalize_path(parent);
    if parent == "/" {
        format!("/{name}")
    } else {
        format!("{parent}/{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("/a/b/"), "/a/b");
        assert_eq!(normalize_path("/"), "/");
        assert_eq!(normalize_path(""), "/");
        assert_eq!(normalize_path("/a"), "/a");
    }

    #[test]
    fn test_path_segments() {
        assert_eq!(path_segments("/a/b"), vec!["a", "b"]);
        assert!(path_segments("/").is_empty());
    }

    #[test]
    fn test_join_path() {
        assert_eq!(join_path("/", "api"), "/api");
        assert_eq!(join_path("/a", "b"), "/a/b");
        assert_eq!(join_path("/a/", "b"), "/a/b");
    }

    #[test]
    fn test_validate_path() {
        assert!(validate_path("/a/b-c/d_e").is_ok());
        assert!(validate_path("/").is_ok());
        assert!(validate_path("a/b").is_err());
        assert!(validate_path("/a/b c").is_err());
        assert!(validate_path("/a/../b").is_err());
    }

    #[test]
    fn test_folder_name_rules() {
        assert!(is_valid_folder_name("api-keys_2"));
        assert!(!is_valid_folder_name(""));
        assert!(!is_valid_folder_name("a.b"));
        assert!(!is_valid_folder_name("a'); drop table secret_folders;--"));
    }
}
