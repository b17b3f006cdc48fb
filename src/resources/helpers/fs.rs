//! File-system resource helpers.
use anyhow::{Context as _, Result};
use filetime::FileTime;
use std::path::Path;
use walkdir::WalkDir;

use crate::error::FsError;

/// Ensure the parent directory of `path` exists, creating it (and any
/// ancestors) if necessary.
///
/// # Errors
///
/// Returns an error if the directory cannot be created.
pub fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create parent: {}", parent.display()))?;
    }
    Ok(())
}

/// Move a file into place, falling back to copy + delete when `src` and `dst`
/// live on different filesystems.
///
/// # Errors
///
/// Returns an error if the file can be neither renamed nor copied, or if the
/// source cannot be removed after copying.
pub fn move_file(src: &Path, dst: &Path) -> Result<()> {
    ensure_parent_dir(dst)?;
    if std::fs::rename(src, dst).is_ok() {
        return Ok(());
    }
    copy_file_with_metadata(src, dst)
        .with_context(|| format!("move {} -> {}", src.display(), dst.display()))?;
    std::fs::remove_file(src).with_context(|| format!("remove: {}", src.display()))?;
    Ok(())
}

/// Copy a regular file, carrying over permissions and access/modification
/// times.
///
/// # Errors
///
/// Returns an error if the file cannot be copied or its timestamps cannot be
/// set on the copy.
pub fn copy_file_with_metadata(src: &Path, dst: &Path) -> Result<(), FsError> {
    let meta = std::fs::metadata(src).map_err(|e| FsError::from_io(src, e))?;
    std::fs::copy(src, dst).map_err(|e| FsError::from_io(dst, e))?;
    filetime::set_file_times(
        dst,
        FileTime::from_last_access_time(&meta),
        FileTime::from_last_modification_time(&meta),
    )
    .map_err(|e| FsError::from_io(dst, e))
}

/// Recursively copy a directory tree.
///
/// Symlinks inside the source tree are *not* followed: each one is recreated
/// in the destination with the same stored value, so a backup of a directory
/// keeps its internal links intact. Regular files are copied with
/// [`copy_file_with_metadata`].
///
/// # Errors
///
/// Returns an error if the destination directory cannot be created, a source
/// entry cannot be read, or a file cannot be copied.
pub fn copy_dir_recursive(src: &Path, dst: &Path) -> Result<(), FsError> {
    std::fs::create_dir_all(dst).map_err(|e| FsError::from_io(dst, e))?;
    for entry in WalkDir::new(src)
        .min_depth(1)
        .follow_links(false)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(src).to_path_buf();
            FsError::from_io(&path, e.into())
        })?;
        let rel = entry
            .path()
            .strip_prefix(src)
            .unwrap_or_else(|_| entry.path());
        let dst_path = dst.join(rel);
        let file_type = entry.file_type();
        if file_type.is_symlink() {
            let value =
                std::fs::read_link(entry.path()).map_err(|e| FsError::from_io(entry.path(), e))?;
            std::os::unix::fs::symlink(&value, &dst_path)
                .map_err(|e| FsError::from_io(&dst_path, e))?;
        } else if file_type.is_dir() {
            std::fs::create_dir_all(&dst_path).map_err(|e| FsError::from_io(&dst_path, e))?;
        } else {
            copy_file_with_metadata(entry.path(), &dst_path)?;
        }
    }
    Ok(())
}
