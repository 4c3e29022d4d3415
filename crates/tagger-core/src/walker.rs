//! Image file discovery
//!
//! Lazily enumerates image files under a root directory in traversal order.
//! Symlinks are not followed; unreadable entries are logged and skipped so
//! one bad directory never aborts the run.

use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;
use walkdir::WalkDir;

/// Recognized image file extensions, matched case-insensitively.
pub const IMAGE_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

/// Errors that make the whole run unable to start
#[derive(Debug, Error)]
pub enum WalkError {
    #[error("path not found: {0}")]
    PathNotFound(PathBuf),

    #[error("not a directory: {0}")]
    NotADirectory(PathBuf),
}

/// Whether a path carries a recognized image extension.
pub fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.iter().any(|known| ext.eq_ignore_ascii_case(known)))
        .unwrap_or(false)
}

/// Lazy sequence of image files under `root`, in traversal order.
pub fn image_files(root: &Path) -> Result<impl Iterator<Item = PathBuf>, WalkError> {
    if !root.exists() {
        return Err(WalkError::PathNotFound(root.to_path_buf()));
    }
    if !root.is_dir() {
        return Err(WalkError::NotADirectory(root.to_path_buf()));
    }

    let iter = WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) if entry.file_type().is_file() && is_image_file(entry.path()) => {
                Some(entry.path().to_path_buf())
            }
            Ok(_) => None,
            Err(err) => {
                warn!("skipping unreadable entry: {err}");
                None
            }
        });

    Ok(iter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_extension_matching() {
        assert!(is_image_file(Path::new("a.jpg")));
        assert!(is_image_file(Path::new("b.JPEG")));
        assert!(is_image_file(Path::new("c.Png")));
        assert!(!is_image_file(Path::new("d.txt")));
        assert!(!is_image_file(Path::new("no_extension")));
    }

    #[test]
    fn test_walk_finds_nested_images_only() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.jpg"), b"x").unwrap();
        fs::write(dir.path().join("b.PNG"), b"x").unwrap();
        fs::write(dir.path().join("notes.txt"), b"x").unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub").join("c.jpeg"), b"x").unwrap();

        let mut found: Vec<String> = image_files(dir.path())
            .unwrap()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        found.sort();

        assert_eq!(found, vec!["a.jpg", "b.PNG", "c.jpeg"]);
    }

    #[test]
    fn test_missing_root_is_fatal() {
        let err = image_files(Path::new("/definitely/not/here")).err().unwrap();
        assert!(matches!(err, WalkError::PathNotFound(_)));
    }

    #[test]
    fn test_file_root_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("single.jpg");
        fs::write(&file, b"x").unwrap();

        let err = image_files(&file).err().unwrap();
        assert!(matches!(err, WalkError::NotADirectory(_)));
    }
}
