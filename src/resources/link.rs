//! Link reconciliation for a single target path.
//!
//! [`Reconciler::reconcile`] inspects what currently lives at a target and
//! decides between leaving it alone, skipping it, or removing it and creating
//! the link. Every decision is logged at debug level (or as a dry-run action)
//! so a verbose run shows exactly which branch each entry took.
//!
//! Directory-valued entries are handled by the tree walker in
//! [`super::tree`], which delegates each file back here.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{FsError, LinkError};
use crate::logging::Log;
use crate::operations::FileSystemOps;
use crate::paths::{canonical_location, relative_path};

/// How a target is linked to its source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkKind {
    /// Relative symbolic link.
    Symlink,
    /// Hard link to the source's inode (regular files only).
    HardLink,
}

impl fmt::Display for LinkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Symlink => write!(f, "symlink"),
            Self::HardLink => write!(f, "hard link"),
        }
    }
}

/// Flags that govern how existing targets are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct LinkPolicy {
    /// Create symbolic links (`true`) or hard links (`false`).
    pub use_symlink: bool,
    /// Leave any existing target untouched.
    pub skip_existing: bool,
    /// Replace every existing target, even a correct link.
    pub force: bool,
    /// Log decisions without touching the filesystem.
    pub dry_run: bool,
}

impl Default for LinkPolicy {
    fn default() -> Self {
        Self {
            use_symlink: true,
            skip_existing: false,
            force: false,
            dry_run: false,
        }
    }
}

impl LinkPolicy {
    /// Apply the precedence rule between `force` and `skip_existing`.
    ///
    /// When both are set, `force` wins: `skip_existing` is cleared and a
    /// warning is logged.
    #[must_use]
    pub fn resolve(mut self, log: &dyn Log) -> Self {
        if self.force && self.skip_existing {
            log.warn("both --force and skip-existing are set; force wins, existing targets will be replaced");
            self.skip_existing = false;
        }
        self
    }

    /// Requested link kind.
    #[must_use]
    pub const fn kind(&self) -> LinkKind {
        if self.use_symlink {
            LinkKind::Symlink
        } else {
            LinkKind::HardLink
        }
    }
}

/// Bounded retry for removals that fail with "resource busy".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total removal attempts, including the first.
    pub attempts: u32,
    /// Pause between attempts.
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 5,
            delay: Duration::from_secs(1),
        }
    }
}

/// Outcome of reconciling one target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkOutcome {
    /// A link was created (or would be, in dry-run mode).
    Created {
        /// Link location.
        target: PathBuf,
        /// What the link points to.
        source: PathBuf,
    },
    /// The target already was the requested link.
    AlreadyCorrect,
    /// An existing target was left alone under the skip-existing policy.
    Skipped,
}

/// Check whether `target` already is the requested link to `source`.
///
/// For symlinks: `target` is a symlink and resolves to the same canonical
/// path as `source`. For hard links: `target` is a regular file sharing the
/// inode of what `source` resolves to.
#[must_use]
pub fn is_correct_link(fs: &dyn FileSystemOps, target: &Path, source: &Path, kind: LinkKind) -> bool {
    match kind {
        LinkKind::Symlink => {
            fs.is_symlink(target)
                && matches!(
                    (fs.canonicalize(target), fs.canonicalize(source)),
                    (Ok(t), Ok(s)) if t == s
                )
        }
        LinkKind::HardLink => {
            fs.is_file(target)
                && fs
                    .canonicalize(source)
                    .is_ok_and(|resolved| fs.same_file(target, &resolved).unwrap_or(false))
        }
    }
}

/// Reconciles targets against sources under one [`LinkPolicy`].
pub struct Reconciler<'a> {
    pub(super) fs: &'a dyn FileSystemOps,
    pub(super) log: &'a dyn Log,
    pub(super) policy: LinkPolicy,
    retry: RetryPolicy,
}

impl fmt::Debug for Reconciler<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reconciler")
            .field("fs", &self.fs)
            .field("log", &"<dyn Log>")
            .field("policy", &self.policy)
            .field("retry", &self.retry)
            .finish()
    }
}

impl<'a> Reconciler<'a> {
    /// Create a reconciler. The policy is resolved here, so a conflicting
    /// `force` + `skip_existing` pair is reported once per run.
    #[must_use]
    pub fn new(fs: &'a dyn FileSystemOps, log: &'a dyn Log, policy: LinkPolicy) -> Self {
        Self {
            fs,
            log,
            policy: policy.resolve(log),
            retry: RetryPolicy::default(),
        }
    }

    /// Replace the busy-retry policy.
    #[must_use]
    pub const fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// The effective policy after precedence resolution.
    #[must_use]
    pub const fn policy(&self) -> LinkPolicy {
        self.policy
    }

    /// Make `target` a link to `source`.
    ///
    /// # Errors
    ///
    /// - [`LinkError::MissingSource`] if `source` does not exist.
    /// - [`LinkError::SelfLink`] if `target` and `source` name the same
    ///   location (checked in dry-run mode too).
    /// - [`LinkError::BusyRetriesExhausted`] if the existing target stays busy.
    /// - [`LinkError::RemovalFailed`] if the target survives removal.
    /// - [`LinkError::Fs`] for any other filesystem failure.
    pub fn reconcile(&self, target: &Path, source: &Path) -> Result<LinkOutcome, LinkError> {
        self.check_distinct(target, source)?;
        let kind = self.effective_kind(source);

        if self.fs.exists(target) {
            if self.policy.skip_existing {
                self.log
                    .debug(&format!("skipping existing '{}'", target.display()));
                return Ok(LinkOutcome::Skipped);
            }
            if !self.policy.force && is_correct_link(self.fs, target, source, kind) {
                self.log.debug(&format!(
                    "correct {kind} already exists: '{}'",
                    target.display()
                ));
                return Ok(LinkOutcome::AlreadyCorrect);
            }
            self.remove_existing(target)?;
        } else {
            self.log
                .debug(&format!("link '{}' does not exist yet", target.display()));
        }

        self.create(target, source, kind)?;
        Ok(LinkOutcome::Created {
            target: target.to_path_buf(),
            source: source.to_path_buf(),
        })
    }

    /// Log or create a link at a target whose parent directory is about to be
    /// replaced. Used by the tree walker in dry-run mode, where the stale
    /// parent still exists and would otherwise distort the decision.
    pub(super) fn plan_create(&self, target: &Path, source: &Path) -> LinkOutcome {
        let kind = self.effective_kind(source);
        self.log.dry_run(&format!(
            "would create {kind} '{}' -> '{}'",
            target.display(),
            source.display()
        ));
        LinkOutcome::Created {
            target: target.to_path_buf(),
            source: source.to_path_buf(),
        }
    }

    /// Fail if `target` would land on `source` or on what `source` resolves to.
    fn check_distinct(&self, target: &Path, source: &Path) -> Result<(), LinkError> {
        let resolved = self.fs.canonicalize(source).map_err(|e| match e {
            FsError::NotFound { .. } => LinkError::MissingSource {
                path: source.to_path_buf(),
            },
            other => LinkError::Fs(other),
        })?;
        let target_loc = canonical_location(self.fs, target);
        if target_loc == resolved || target_loc == canonical_location(self.fs, source) {
            self.log.error(&format!(
                "dotfile path and target path are the same: '{}'",
                target_loc.display()
            ));
            return Err(LinkError::SelfLink { path: target_loc });
        }
        Ok(())
    }

    /// Requested kind, upgraded to a symlink when hard-linking a directory.
    fn effective_kind(&self, source: &Path) -> LinkKind {
        let kind = self.policy.kind();
        let is_dir = self
            .fs
            .canonicalize(source)
            .is_ok_and(|resolved| self.fs.is_dir(&resolved));
        if kind == LinkKind::HardLink && is_dir {
            self.log.warn(&format!(
                "hard links are not supported for directories; falling back to symlink for '{}'",
                source.display()
            ));
            return LinkKind::Symlink;
        }
        kind
    }

    /// Remove whatever is at `target` and verify it is gone.
    pub(super) fn remove_existing(&self, target: &Path) -> Result<(), LinkError> {
        let is_real_dir = self.fs.is_dir(target);
        let what = if is_real_dir { "directory" } else { "link" };
        if self.policy.dry_run {
            self.log.dry_run(&format!(
                "would remove incorrect {what} '{}'",
                target.display()
            ));
            return Ok(());
        }
        self.log
            .debug(&format!("removing incorrect {what} '{}'", target.display()));
        self.remove_with_retry(target, is_real_dir)?;
        if self.fs.exists(target) {
            return Err(LinkError::RemovalFailed {
                path: target.to_path_buf(),
            });
        }
        Ok(())
    }

    fn remove_with_retry(&self, target: &Path, is_real_dir: bool) -> Result<(), LinkError> {
        let attempts = self.retry.attempts.max(1);
        for attempt in 1..=attempts {
            let result = if is_real_dir {
                self.fs.remove_tree(target)
            } else {
                self.fs.remove_file(target)
            };
            match result {
                Ok(()) => return Ok(()),
                Err(e) if e.is_busy() => {
                    self.log.warn(&format!(
                        "'{}' is busy (attempt {attempt}/{attempts})",
                        target.display()
                    ));
                    if attempt < attempts {
                        std::thread::sleep(self.retry.delay);
                    }
                }
                Err(e) => return Err(e.into()),
            }
        }
        Err(LinkError::BusyRetriesExhausted {
            path: target.to_path_buf(),
            attempts,
        })
    }

    fn create(&self, target: &Path, source: &Path, kind: LinkKind) -> Result<(), LinkError> {
        let parent = target.parent().unwrap_or_else(|| Path::new("/"));
        let link_value = match kind {
            LinkKind::Symlink => relative_path(
                &canonical_location(self.fs, parent),
                &canonical_location(self.fs, source),
            ),
            // A symlinked source is hard-linked through to its target file.
            LinkKind::HardLink => self.fs.canonicalize(source)?,
        };
        let msg = format!(
            "{kind} '{}' -> '{}'",
            target.display(),
            link_value.display()
        );
        if self.policy.dry_run {
            self.log.dry_run(&format!("would create {msg}"));
            return Ok(());
        }
        self.log.debug(&format!("creating {msg}"));
        self.fs.create_dir_all(parent)?;
        match kind {
            LinkKind::Symlink => self.fs.symlink(&link_value, target)?,
            LinkKind::HardLink => self.fs.hard_link(&link_value, target)?,
        }
        Ok(())
    }
}
