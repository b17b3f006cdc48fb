//! Filesystem provider abstraction for dependency injection.
//!
//! The link reconciler and backup manager perform every query and mutation
//! through [`FileSystemOps`] so that failure modes (busy targets, failed
//! removals) can be simulated in tests. Production code uses
//! [`SystemFileSystemOps`].
//!
//! Queries never follow the final symlink of a path: a dangling link still
//! "exists", and a link to a directory is a symlink, not a directory.

use std::fs;
use std::os::unix::fs::MetadataExt;
use std::path::{Path, PathBuf};

use crate::error::FsError;
use crate::resources::helpers::fs::{copy_dir_recursive, copy_file_with_metadata};

/// Abstraction over the filesystem operations the link engine depends on.
pub trait FileSystemOps: Send + Sync + std::fmt::Debug {
    /// Returns `true` if anything (including a dangling symlink) is at `path`.
    fn exists(&self, path: &Path) -> bool;

    /// Returns `true` if `path` is a symbolic link.
    fn is_symlink(&self, path: &Path) -> bool;

    /// Returns `true` if `path` is a real directory (not a link to one).
    fn is_dir(&self, path: &Path) -> bool;

    /// Returns `true` if `path` is a regular file (not a link to one).
    fn is_file(&self, path: &Path) -> bool;

    /// Resolve `path` to its canonical absolute form.
    ///
    /// # Errors
    ///
    /// Returns [`FsError::NotFound`] if any component does not exist.
    fn canonicalize(&self, path: &Path) -> Result<PathBuf, FsError>;

    /// Returns `true` if both paths name the same underlying inode.
    ///
    /// # Errors
    ///
    /// Returns an error if either path cannot be inspected.
    fn same_file(&self, a: &Path, b: &Path) -> Result<bool, FsError>;

    /// List the immediate children of a directory.
    ///
    /// # Errors
    ///
    /// Returns an error if `path` cannot be read as a directory.
    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>, FsError>;

    /// Remove a file or symlink.
    ///
    /// # Errors
    ///
    /// Returns [`FsError::Busy`] when the entry is held by another process.
    fn remove_file(&self, path: &Path) -> Result<(), FsError>;

    /// Remove a directory and everything below it.
    ///
    /// # Errors
    ///
    /// Returns [`FsError::Busy`] when an entry is held by another process.
    fn remove_tree(&self, path: &Path) -> Result<(), FsError>;

    /// Remove an empty directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory is not empty or cannot be removed.
    fn remove_dir(&self, path: &Path) -> Result<(), FsError>;

    /// Copy a file, preserving permissions and timestamps.
    ///
    /// # Errors
    ///
    /// Returns an error if the copy fails.
    fn copy_file(&self, from: &Path, to: &Path) -> Result<(), FsError>;

    /// Copy a directory recursively, recreating internal symlinks as links.
    ///
    /// # Errors
    ///
    /// Returns an error if any entry cannot be copied.
    fn copy_tree(&self, from: &Path, to: &Path) -> Result<(), FsError>;

    /// Create a symbolic link at `at` whose stored value is `link_value`.
    ///
    /// # Errors
    ///
    /// Returns an error if the link cannot be created.
    fn symlink(&self, link_value: &Path, at: &Path) -> Result<(), FsError>;

    /// Create a hard link at `at` to the file at `source`.
    ///
    /// # Errors
    ///
    /// Returns an error if the link cannot be created.
    fn hard_link(&self, source: &Path, at: &Path) -> Result<(), FsError>;

    /// Create `path` and all missing ancestors.
    ///
    /// # Errors
    ///
    /// Returns an error if a directory cannot be created.
    fn create_dir_all(&self, path: &Path) -> Result<(), FsError>;
}

/// Production [`FileSystemOps`] implementation that delegates to [`std::fs`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemFileSystemOps;

impl FileSystemOps for SystemFileSystemOps {
    fn exists(&self, path: &Path) -> bool {
        fs::symlink_metadata(path).is_ok()
    }

    fn is_symlink(&self, path: &Path) -> bool {
        fs::symlink_metadata(path).is_ok_and(|m| m.file_type().is_symlink())
    }

    fn is_dir(&self, path: &Path) -> bool {
        fs::symlink_metadata(path).is_ok_and(|m| m.is_dir())
    }

    fn is_file(&self, path: &Path) -> bool {
        fs::symlink_metadata(path).is_ok_and(|m| m.is_file())
    }

    fn canonicalize(&self, path: &Path) -> Result<PathBuf, FsError> {
        dunce::canonicalize(path).map_err(|e| FsError::from_io(path, e))
    }

    fn same_file(&self, a: &Path, b: &Path) -> Result<bool, FsError> {
        let ma = fs::metadata(a).map_err(|e| FsError::from_io(a, e))?;
        let mb = fs::metadata(b).map_err(|e| FsError::from_io(b, e))?;
        Ok(ma.dev() == mb.dev() && ma.ino() == mb.ino())
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>, FsError> {
        fs::read_dir(path)
            .map_err(|e| FsError::from_io(path, e))?
            .map(|entry| {
                entry
                    .map(|e| e.path())
                    .map_err(|e| FsError::from_io(path, e))
            })
            .collect()
    }

    fn remove_file(&self, path: &Path) -> Result<(), FsError> {
        fs::remove_file(path).map_err(|e| FsError::from_io(path, e))
    }

    fn remove_tree(&self, path: &Path) -> Result<(), FsError> {
        fs::remove_dir_all(path).map_err(|e| FsError::from_io(path, e))
    }

    fn remove_dir(&self, path: &Path) -> Result<(), FsError> {
        fs::remove_dir(path).map_err(|e| FsError::from_io(path, e))
    }

    fn copy_file(&self, from: &Path, to: &Path) -> Result<(), FsError> {
        copy_file_with_metadata(from, to)
    }

    fn copy_tree(&self, from: &Path, to: &Path) -> Result<(), FsError> {
        copy_dir_recursive(from, to)
    }

    fn symlink(&self, link_value: &Path, at: &Path) -> Result<(), FsError> {
        std::os::unix::fs::symlink(link_value, at).map_err(|e| FsError::from_io(at, e))
    }

    fn hard_link(&self, source: &Path, at: &Path) -> Result<(), FsError> {
        fs::hard_link(source, at).map_err(|e| FsError::from_io(at, e))
    }

    fn create_dir_all(&self, path: &Path) -> Result<(), FsError> {
        fs::create_dir_all(path).map_err(|e| FsError::from_io(path, e))
    }
}
