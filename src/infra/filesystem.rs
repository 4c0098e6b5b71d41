//! Filesystem operations
//!
//! Handles directory creation, tree removal and libtool archive cleanup.

use std::path::Path;

use crate::config::defaults;
use crate::error::FilesystemError;

/// Create a directory and all parent directories
pub fn create_dir_all(path: &Path) -> Result<(), FilesystemError> {
    std::fs::create_dir_all(path).map_err(|e| FilesystemError::CreateDir {
        path: path.to_path_buf(),
        error: e.to_string(),
    })
}

/// Remove a directory tree; a missing path is not an error
///
/// Returns whether anything was removed.
pub fn remove_tree(path: &Path) -> Result<bool, FilesystemError> {
    match std::fs::symlink_metadata(path) {
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(false),
        Err(e) => {
            return Err(FilesystemError::Remove {
                path: path.to_path_buf(),
                error: e.to_string(),
            })
        }
        Ok(_) => {}
    }

    tracing::info!("Deleting {}", path.display());
    let removed = if path.is_dir() && !path.is_symlink() {
        std::fs::remove_dir_all(path)
    } else {
        std::fs::remove_file(path)
    };
    removed.map_err(|e| FilesystemError::Remove {
        path: path.to_path_buf(),
        error: e.to_string(),
    })?;
    Ok(true)
}

/// Delete every libtool archive (`*.la`) below `dir`
///
/// Installed `.la` files carry absolute dependency paths that break later
/// link steps. Returns the number of files removed; a missing `dir` yields 0.
pub fn purge_libtool_archives(dir: &Path) -> Result<usize, FilesystemError> {
    if !dir.exists() {
        return Ok(0);
    }

    let mut removed = 0;
    for entry in walkdir::WalkDir::new(dir).follow_links(false) {
        let entry = entry.map_err(|e| FilesystemError::Walk {
            path: dir.to_path_buf(),
            error: e.to_string(),
        })?;

        let is_archive = entry.file_type().is_file()
            && entry
                .path()
                .extension()
                .is_some_and(|ext| ext == defaults::LIBTOOL_ARCHIVE_EXT);
        if !is_archive {
            continue;
        }

        std::fs::remove_file(entry.path()).map_err(|e| FilesystemError::Remove {
            path: entry.path().to_path_buf(),
            error: e.to_string(),
        })?;
        tracing::debug!(file = %entry.path().display(), "removed libtool archive");
        removed += 1;
    }

    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::prelude::*;
    use predicates::prelude::*;

    #[test]
    fn test_remove_tree_missing_is_ok() {
        let temp = assert_fs::TempDir::new().unwrap();
        assert!(!remove_tree(&temp.path().join("absent")).unwrap());
    }

    #[test]
    fn test_remove_tree_removes_nested_content() {
        let temp = assert_fs::TempDir::new().unwrap();
        temp.child("tree/a/b/file.txt").write_str("x").unwrap();

        assert!(remove_tree(&temp.path().join("tree")).unwrap());
        temp.child("tree").assert(predicate::path::missing());
    }

    #[test]
    fn test_purge_libtool_archives_recursive() {
        let temp = assert_fs::TempDir::new().unwrap();
        temp.child("lib/libfoo.la").write_str("# libtool").unwrap();
        temp.child("lib/libfoo.so").write_str("elf").unwrap();
        temp.child("lib/gio/modules/libbar.la").write_str("# libtool").unwrap();
        temp.child("lib/pkgconfig/foo.pc").write_str("pc").unwrap();

        let removed = purge_libtool_archives(&temp.path().join("lib")).unwrap();

        assert_eq!(removed, 2);
        temp.child("lib/libfoo.la").assert(predicate::path::missing());
        temp.child("lib/gio/modules/libbar.la")
            .assert(predicate::path::missing());
        temp.child("lib/libfoo.so").assert(predicate::path::exists());
        temp.child("lib/pkgconfig/foo.pc").assert(predicate::path::exists());
    }

    #[test]
    fn test_purge_ignores_directories_named_la() {
        let temp = assert_fs::TempDir::new().unwrap();
        temp.child("lib/weird.la/keep").write_str("x").unwrap();

        assert_eq!(purge_libtool_archives(&temp.path().join("lib")).unwrap(), 0);
        temp.child("lib/weird.la/keep").assert(predicate::path::exists());
    }

    #[test]
    fn test_purge_missing_dir() {
        let temp = assert_fs::TempDir::new().unwrap();
        assert_eq!(purge_libtool_archives(&temp.path().join("nope")).unwrap(), 0);
    }
}
