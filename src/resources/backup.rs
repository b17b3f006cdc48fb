//! Snapshot of pre-existing targets before linking.
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::config::dotfiles::DotfileEntry;
use crate::error::FsError;
use crate::logging::Log;
use crate::operations::FileSystemOps;
use crate::resources::link::{LinkKind, is_correct_link};
use crate::paths::PathResolver;

/// Entries copied (or planned in dry-run mode) during one backup pass,
/// original target to backup location.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackupSet {
    /// Target path to backup path.
    pub entries: BTreeMap<PathBuf, PathBuf>,
}

impl BackupSet {
    /// Whether anything was backed up.
    #[must_use]
    pub fn did_backup(&self) -> bool {
        !self.entries.is_empty()
    }
}

/// Copies existing non-symlink targets into the run's backup directory.
pub struct BackupManager<'a> {
    fs: &'a dyn FileSystemOps,
    log: &'a dyn Log,
    dry_run: bool,
}

impl fmt::Debug for BackupManager<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackupManager")
            .field("fs", &self.fs)
            .field("dry_run", &self.dry_run)
            .finish_non_exhaustive()
    }
}

impl<'a> BackupManager<'a> {
    /// Create a backup manager.
    #[must_use]
    pub const fn new(fs: &'a dyn FileSystemOps, log: &'a dyn Log, dry_run: bool) -> Self {
        Self { fs, log, dry_run }
    }

    /// Back up every entry whose target exists and is not a symlink.
    ///
    /// A directory entry that only holds correct links into its source
    /// directory is a previous run's tree link and is skipped too.
    /// Directories are copied recursively with their internal symlinks kept
    /// as links; files keep their permissions and timestamps. An existing
    /// backup destination is cleared first. When nothing is copied the
    /// backup directory is removed again.
    ///
    /// # Errors
    ///
    /// Returns an error if a copy or directory operation fails.
    pub fn backup(
        &self,
        entries: &[DotfileEntry],
        paths: &PathResolver,
    ) -> Result<BackupSet, FsError> {
        self.log.debug("creating backup of existing dotfiles");
        let root = paths.backup_dir();
        if !self.dry_run {
            self.fs.create_dir_all(root)?;
        }

        let mut set = BackupSet::default();
        for entry in entries {
            let target = paths.target_path(&entry.path);
            let dest = paths.backup_path(&entry.path);
            if !self.fs.exists(&target) {
                self.log.debug(&format!(
                    "'{}' does not exist, skipping backup",
                    target.display()
                ));
                continue;
            }
            if self.fs.is_symlink(&target) {
                self.log.debug(&format!(
                    "'{}' is a symlink, skipping backup",
                    target.display()
                ));
                continue;
            }
            if self.is_linked_tree(&target, &paths.source_path(&entry.path)) {
                self.log.debug(&format!(
                    "'{}' only holds links into the repository, skipping backup",
                    target.display()
                ));
                continue;
            }

            let msg = format!("backing up '{}' to '{}'", target.display(), dest.display());
            if self.dry_run {
                self.log.dry_run(&format!("would be {msg}"));
            } else {
                self.log.debug(&msg);
                self.copy_entry(&target, &dest)?;
            }
            set.entries.insert(target, dest);
        }

        if set.did_backup() {
            self.log
                .info(&format!("existing dotfiles backed up to '{}'", root.display()));
        } else if !self.dry_run {
            self.log.debug("nothing to back up");
            self.fs.remove_dir(root)?;
        }
        Ok(set)
    }

    fn is_linked_tree(&self, target: &Path, source: &Path) -> bool {
        self.fs.is_dir(target)
            && self
                .fs
                .canonicalize(source)
                .is_ok_and(|resolved| self.fs.is_dir(&resolved))
            && self.holds_only_links(target, source)
    }

    fn holds_only_links(&self, dir: &Path, source: &Path) -> bool {
        self.fs.read_dir(dir).is_ok_and(|children| {
            children.iter().all(|child| {
                let Some(name) = child.file_name() else {
                    return false;
                };
                let child_source = source.join(name);
                if self.fs.is_symlink(child) {
                    is_correct_link(self.fs, child, &child_source, LinkKind::Symlink)
                } else if self.fs.is_dir(child) {
                    self.holds_only_links(child, &child_source)
                } else {
                    is_correct_link(self.fs, child, &child_source, LinkKind::HardLink)
                }
            })
        })
    }

    fn copy_entry(&self, target: &Path, dest: &Path) -> Result<(), FsError> {
        if let Some(parent) = dest.parent() {
            self.fs.create_dir_all(parent)?;
        }
        if self.fs.exists(dest) {
            if self.fs.is_dir(dest) {
                self.fs.remove_tree(dest)?;
            } else {
                self.fs.remove_file(dest)?;
            }
        }
        if self.fs.is_dir(target) {
            self.fs.copy_tree(target, dest)
        } else {
            self.fs.copy_file(target, dest)
        }
    }
}
