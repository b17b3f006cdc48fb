//! Mapping of managed entries to their source, target and backup locations.
//!
//! Everything here is pure path arithmetic except [`canonical_location`],
//! which consults the filesystem to resolve the part of a path that exists.

use std::path::{Component, Path, PathBuf};

use crate::operations::FileSystemOps;

/// Name of the directory under the home directory that holds timestamped
/// backup snapshots.
pub const BACKUP_DIR_NAME: &str = ".dotfiles-backup";

/// Format of the per-run backup directory name.
pub const BACKUP_TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

/// Resolves a managed entry name to its three absolute locations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathResolver {
    source_root: PathBuf,
    home: PathBuf,
    backup_dir: PathBuf,
}

impl PathResolver {
    /// Create a resolver for a source repository, a home directory and the
    /// backup directory of the current run.
    #[must_use]
    pub const fn new(source_root: PathBuf, home: PathBuf, backup_dir: PathBuf) -> Self {
        Self {
            source_root,
            home,
            backup_dir,
        }
    }

    /// Build the backup directory path for a run started at `timestamp`.
    #[must_use]
    pub fn backup_dir_for(home: &Path, timestamp: chrono::DateTime<chrono::Local>) -> PathBuf {
        home.join(BACKUP_DIR_NAME)
            .join(timestamp.format(BACKUP_TIMESTAMP_FORMAT).to_string())
    }

    /// Root of the managed source repository.
    #[must_use]
    pub fn source_root(&self) -> &Path {
        &self.source_root
    }

    /// Home directory that receives the links.
    #[must_use]
    pub fn home(&self) -> &Path {
        &self.home
    }

    /// Backup directory of the current run.
    #[must_use]
    pub fn backup_dir(&self) -> &Path {
        &self.backup_dir
    }

    /// Absolute path of `entry` inside the source repository.
    #[must_use]
    pub fn source_path(&self, entry: &str) -> PathBuf {
        self.source_root.join(entry)
    }

    /// Absolute path of `entry` under the home directory.
    #[must_use]
    pub fn target_path(&self, entry: &str) -> PathBuf {
        self.home.join(entry)
    }

    /// Absolute path of `entry` inside the backup directory.
    #[must_use]
    pub fn backup_path(&self, entry: &str) -> PathBuf {
        self.backup_dir.join(entry)
    }
}

/// Compute the path of `to` relative to the directory `from_dir`.
///
/// Both paths must be absolute and free of `.`/`..` components. The result
/// is what a symlink inside `from_dir` must store to reach `to`.
///
/// # Examples
///
/// ```
/// use dotfiles_provision::paths::relative_path;
/// use std::path::{Path, PathBuf};
///
/// let rel = relative_path(Path::new("/home/u/.config"), Path::new("/home/u/dotfiles/.config/x"));
/// assert_eq!(rel, PathBuf::from("../dotfiles/.config/x"));
/// ```
#[must_use]
pub fn relative_path(from_dir: &Path, to: &Path) -> PathBuf {
    let from: Vec<Component<'_>> = from_dir.components().collect();
    let target: Vec<Component<'_>> = to.components().collect();
    let common = from
        .iter()
        .zip(&target)
        .take_while(|(a, b)| a == b)
        .count();

    let mut rel = PathBuf::new();
    for _ in common..from.len() {
        rel.push("..");
    }
    for component in target.iter().skip(common) {
        rel.push(component.as_os_str());
    }
    if rel.as_os_str().is_empty() {
        rel.push(".");
    }
    rel
}

/// Resolve `path` as far as the filesystem allows without following its
/// final component.
///
/// The deepest existing ancestor of the parent directory is canonicalised and
/// the remaining components are appended verbatim. Two paths with the same
/// canonical location name the same directory entry, which is how a link that
/// would be placed onto its own source is detected before anything exists.
#[must_use]
pub fn canonical_location(fs: &dyn FileSystemOps, path: &Path) -> PathBuf {
    let Some(name) = path.file_name() else {
        return fs.canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    };
    let mut tail = vec![name.to_os_string()];
    let mut cursor = path.parent();
    while let Some(dir) = cursor {
        if let Ok(resolved) = fs.canonicalize(dir) {
            let mut out = resolved;
            for part in tail.iter().rev() {
                out.push(part);
            }
            return out;
        }
        match dir.file_name() {
            Some(part) => tail.push(part.to_os_string()),
            None => break,
        }
        cursor = dir.parent();
    }
    path.to_path_buf()
}
