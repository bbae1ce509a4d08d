//! Write-temp-then-rename file writes

use std::fs;
use std::io::Write;
use std::path::Path;

use tempfile::Builder;

use crate::error::{CtxError, Result};

/// Name prefix of in-flight temporary files. Listings skip such names
pub const TEMP_PREFIX: &str = ".tmp";

/// Atomically replace `path` with `contents`.
///
/// The data goes to a uniquely named temporary file in the target directory
/// (created if missing, mode 0600 on Unix) and is renamed over the target, so
/// readers see either the old or the new file.
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let parent = path.parent().ok_or_else(|| {
        CtxError::Validation(format!("{} has no parent directory", path.display()))
    })?;

    fs::create_dir_all(parent).map_err(|e| {
        CtxError::io(
            format!("Failed to create directory {}", parent.display()),
            e,
        )
    })?;

    let mut tmp = Builder::new().prefix(TEMP_PREFIX).tempfile_in(parent).map_err(|e| {
        CtxError::io(
            format!("Failed to create temp file in {}", parent.display()),
            e,
        )
    })?;

    tmp.write_all(contents)
        .and_then(|_| tmp.as_file().sync_all())
        .map_err(|e| {
            CtxError::io(
                format!("Failed to write temp file {}", tmp.path().display()),
                e,
            )
        })?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(tmp.path(), fs::Permissions::from_mode(0o600)).map_err(|e| {
            CtxError::io(
                format!("Failed to set permissions on {}", tmp.path().display()),
                e,
            )
        })?;
    }

    tmp.persist(path).map_err(|e| {
        CtxError::io(
            format!("Failed to rename temp file to {}", path.display()),
            e.error,
        )
    })?;

    Ok(())
}

/// Remove a directory tree, treating an absent directory as success
pub fn remove_dir_if_exists(path: &Path) -> Result<()> {
    match fs::remove_dir_all(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(CtxError::io(
            format!("Failed to remove {}", path.display()),
            e,
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_atomic_creates_parent_dirs() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a").join("b").join("file");
        write_atomic(&path, b"hello").unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"hello");
    }

    #[test]
    fn test_write_atomic_replaces_and_leaves_no_temp_files() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("file");
        write_atomic(&path, b"first").unwrap();
        write_atomic(&path, b"second").unwrap();

        assert_eq!(fs::read(&path).unwrap(), b"second");
        let entries: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_write_atomic_sets_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("secret");
        write_atomic(&path, b"key").unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o600);
    }

    #[test]
    fn test_remove_dir_if_exists_absent_is_ok() {
        let dir = TempDir::new().unwrap();
        remove_dir_if_exists(&dir.path().join("missing")).unwrap();
    }

    #[test]
    fn test_remove_dir_if_exists_removes_tree() {
        let dir = TempDir::new().unwrap();
        let sub = dir.path().join("sub");
        write_atomic(&sub.join("x").join("y"), b"z").unwrap();
        remove_dir_if_exists(&sub).unwrap();
        assert!(!sub.exists());
    }
}
