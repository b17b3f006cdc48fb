//! Directory-valued entries: mirror a source tree into the home directory
//! one file at a time.
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use super::link::{LinkKind, LinkOutcome, Reconciler};
use crate::config::dotfiles::DotfileEntry;
use crate::error::{FsError, LinkError};
use crate::paths::PathResolver;

/// Aggregate result of reconciling one or more entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkSummary {
    /// Links created (or planned in dry-run mode), target to source.
    pub created: BTreeMap<PathBuf, PathBuf>,
    /// Targets that already were correct links.
    pub already_correct: usize,
    /// Targets left alone under the skip-existing policy.
    pub skipped: usize,
    /// A directory entry was symlinked although hard links were requested.
    pub directory_fallback: bool,
}

impl LinkSummary {
    /// Fold one reconcile outcome into the summary.
    pub fn record(&mut self, outcome: LinkOutcome) {
        match outcome {
            LinkOutcome::Created { target, source } => {
                self.created.insert(target, source);
            }
            LinkOutcome::AlreadyCorrect => self.already_correct += 1,
            LinkOutcome::Skipped => self.skipped += 1,
        }
    }

    /// Merge another summary into this one.
    pub fn merge(&mut self, other: Self) {
        self.created.extend(other.created);
        self.already_correct += other.already_correct;
        self.skipped += other.skipped;
        self.directory_fallback |= other.directory_fallback;
    }

    /// Number of links created or planned.
    #[must_use]
    pub fn created_count(&self) -> usize {
        self.created.len()
    }
}

/// What to do with a target directory before descending into it.
enum DirPlan {
    /// Target is a real directory or absent; reconcile children normally.
    Descend,
    /// Target is in the way and will be replaced; children are all new.
    Replaced,
    /// Target is in the way and must be left alone.
    Skip,
}

impl Reconciler<'_> {
    /// Reconcile one managed entry, dispatching directories to the tree
    /// walker unless the entry asks for a single whole-directory link.
    ///
    /// # Errors
    ///
    /// Propagates any fatal [`LinkError`] from the entry.
    pub fn reconcile_entry(
        &self,
        entry: &DotfileEntry,
        paths: &PathResolver,
    ) -> Result<LinkSummary, LinkError> {
        let source = paths.source_path(&entry.path);
        let target = paths.target_path(&entry.path);
        let source_is_dir = self
            .fs
            .canonicalize(&source)
            .is_ok_and(|resolved| self.fs.is_dir(&resolved));

        if source_is_dir && !entry.whole_directory {
            return self.reconcile_tree(&source, &target);
        }

        let mut summary = LinkSummary {
            directory_fallback: source_is_dir && self.policy.kind() == LinkKind::HardLink,
            ..LinkSummary::default()
        };
        summary.record(self.reconcile(&target, &source)?);
        Ok(summary)
    }

    /// Link every non-directory below `source_dir` to the mirrored path under
    /// `target_dir`, in sorted order.
    ///
    /// Intermediate target directories are created as real directories. A
    /// target directory that exists but is not a real directory is replaced,
    /// or left alone together with everything below it under the
    /// skip-existing policy.
    ///
    /// # Errors
    ///
    /// Propagates the first fatal [`LinkError`]; also fails if the source
    /// tree cannot be walked.
    pub fn reconcile_tree(
        &self,
        source_dir: &Path,
        target_dir: &Path,
    ) -> Result<LinkSummary, LinkError> {
        self.log.debug(&format!(
            "setting up links for files in folder '{}'",
            source_dir.display()
        ));
        let mut summary = LinkSummary::default();

        // Depth at or below which targets are known to be replaced.
        let mut replaced_from: Option<usize> = match self.plan_dir(target_dir)? {
            DirPlan::Descend => None,
            DirPlan::Replaced => Some(0),
            DirPlan::Skip => {
                summary.skipped += 1;
                return Ok(summary);
            }
        };

        let mut files = 0usize;
        let mut walker = WalkDir::new(source_dir)
            .min_depth(1)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter();

        while let Some(item) = walker.next() {
            let entry = item.map_err(|e| walk_error(source_dir, e))?;
            let depth = entry.depth();
            if replaced_from.is_some_and(|d| depth <= d) {
                replaced_from = None;
            }
            let rel = entry
                .path()
                .strip_prefix(source_dir)
                .unwrap_or_else(|_| entry.path());
            let target = target_dir.join(rel);

            if entry.file_type().is_dir() {
                if replaced_from.is_some() {
                    continue;
                }
                match self.plan_dir(&target)? {
                    DirPlan::Descend => {}
                    DirPlan::Replaced => replaced_from = Some(depth),
                    DirPlan::Skip => {
                        summary.skipped += 1;
                        walker.skip_current_dir();
                    }
                }
                continue;
            }

            files += 1;
            let outcome = if replaced_from.is_some() {
                self.plan_create(&target, entry.path())
            } else {
                self.reconcile(&target, entry.path())?
            };
            summary.record(outcome);
        }

        if files == 0 {
            self.log.info(&format!(
                "directory '{}' contains no files; nothing to link",
                source_dir.display()
            ));
        }
        Ok(summary)
    }

    /// Decide how to treat an existing target directory.
    fn plan_dir(&self, target_dir: &Path) -> Result<DirPlan, LinkError> {
        if !self.fs.exists(target_dir) || self.fs.is_dir(target_dir) {
            return Ok(DirPlan::Descend);
        }
        if self.policy.skip_existing {
            self.log.debug(&format!(
                "skipping existing '{}' (not a directory)",
                target_dir.display()
            ));
            return Ok(DirPlan::Skip);
        }
        self.remove_existing(target_dir)?;
        if self.policy.dry_run {
            Ok(DirPlan::Replaced)
        } else {
            Ok(DirPlan::Descend)
        }
    }
}

fn walk_error(root: &Path, e: walkdir::Error) -> LinkError {
    let path = e.path().unwrap_or(root).to_path_buf();
    match e.into_io_error() {
        Some(io) => FsError::from_io(&path, io).into(),
        None => FsError::Io {
            path,
            source: std::io::Error::other("filesystem loop detected"),
        }
        .into(),
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::logging::RecordingLog;
    use crate::operations::SystemFileSystemOps;
    use crate::resources::link::LinkPolicy;

    struct Scratch {
        _dir: tempfile::TempDir,
        home: PathBuf,
        repo: PathBuf,
    }

    impl Scratch {
        fn new() -> Self {
            let dir = tempfile::tempdir().unwrap();
            let root = dunce::canonicalize(dir.path()).unwrap();
            let home = root.join("home");
            let repo = root.join("repo");
            std::fs::create_dir_all(&home).unwrap();
            std::fs::create_dir_all(&repo).unwrap();
            Self {
                _dir: dir,
                home,
                repo,
            }
        }

        fn file(&self, rel: &str) {
            let path = self.repo.join(rel);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, rel).unwrap();
        }

        fn resolver(&self) -> PathResolver {
            PathResolver::new(
                self.repo.clone(),
                self.home.clone(),
                self.home.join(".dotfiles-backup/test"),
            )
        }
    }

    fn is_symlink(p: &Path) -> bool {
        p.symlink_metadata()
            .is_ok_and(|m| m.file_type().is_symlink())
    }

    #[test]
    fn mirrors_nested_files_in_sorted_order() {
        let s = Scratch::new();
        s.file(".zsh/b.zsh");
        s.file(".zsh/a.zsh");
        s.file(".zsh/plugins/p.zsh");
        let log = RecordingLog::default();

        let summary = Reconciler::new(&SystemFileSystemOps, &log, LinkPolicy::default())
            .reconcile_tree(&s.repo.join(".zsh"), &s.home.join(".zsh"))
            .unwrap();

        let targets: Vec<_> = summary.created.keys().cloned().collect();
        assert_eq!(
            targets,
            vec![
                s.home.join(".zsh/a.zsh"),
                s.home.join(".zsh/b.zsh"),
                s.home.join(".zsh/plugins/p.zsh"),
            ]
        );
        assert!(!is_symlink(&s.home.join(".zsh")));
        assert!(!is_symlink(&s.home.join(".zsh/plugins")));
        assert!(is_symlink(&s.home.join(".zsh/plugins/p.zsh")));
        assert_eq!(
            std::fs::read_link(s.home.join(".zsh/plugins/p.zsh")).unwrap(),
            PathBuf::from("../../../repo/.zsh/plugins/p.zsh")
        );
    }

    #[test]
    fn second_pass_reports_everything_correct() {
        let s = Scratch::new();
        s.file(".zsh/a.zsh");
        s.file(".zsh/sub/b.zsh");
        let log = RecordingLog::default();
        let r = Reconciler::new(&SystemFileSystemOps, &log, LinkPolicy::default());

        r.reconcile_tree(&s.repo.join(".zsh"), &s.home.join(".zsh"))
            .unwrap();
        let again = r
            .reconcile_tree(&s.repo.join(".zsh"), &s.home.join(".zsh"))
            .unwrap();

        assert!(again.created.is_empty());
        assert_eq!(again.already_correct, 2);
    }

    #[test]
    fn empty_directory_is_reported_not_an_error() {
        let s = Scratch::new();
        std::fs::create_dir(s.repo.join(".zsh")).unwrap();
        let log = RecordingLog::default();

        let summary = Reconciler::new(&SystemFileSystemOps, &log, LinkPolicy::default())
            .reconcile_tree(&s.repo.join(".zsh"), &s.home.join(".zsh"))
            .unwrap();

        assert_eq!(summary, LinkSummary::default());
        assert!(log.contains("info", "contains no files"));
    }

    #[test]
    fn whole_directory_symlink_is_replaced_by_real_directory() {
        let s = Scratch::new();
        s.file(".zsh/a.zsh");
        std::os::unix::fs::symlink(s.repo.join(".zsh"), s.home.join(".zsh")).unwrap();
        let log = RecordingLog::default();

        let summary = Reconciler::new(&SystemFileSystemOps, &log, LinkPolicy::default())
            .reconcile_tree(&s.repo.join(".zsh"), &s.home.join(".zsh"))
            .unwrap();

        assert_eq!(summary.created.len(), 1);
        assert!(!is_symlink(&s.home.join(".zsh")));
        assert!(is_symlink(&s.home.join(".zsh/a.zsh")));
        assert_eq!(std::fs::read_to_string(s.repo.join(".zsh/a.zsh")).unwrap(), ".zsh/a.zsh");
    }

    #[test]
    fn dry_run_plans_children_of_replaced_directory() {
        let s = Scratch::new();
        s.file(".zsh/a.zsh");
        std::os::unix::fs::symlink(s.repo.join(".zsh"), s.home.join(".zsh")).unwrap();
        let log = RecordingLog::default();
        let dry = LinkPolicy {
            dry_run: true,
            ..LinkPolicy::default()
        };

        let summary = Reconciler::new(&SystemFileSystemOps, &log, dry)
            .reconcile_tree(&s.repo.join(".zsh"), &s.home.join(".zsh"))
            .unwrap();

        assert_eq!(summary.created.len(), 1);
        assert!(is_symlink(&s.home.join(".zsh")), "nothing mutated");
        assert_eq!(log.messages("dry_run").len(), 2);
    }

    #[test]
    fn skip_existing_leaves_file_in_place_of_directory() {
        let s = Scratch::new();
        s.file(".zsh/a.zsh");
        std::fs::write(s.home.join(".zsh"), "user").unwrap();
        let log = RecordingLog::default();
        let skip = LinkPolicy {
            skip_existing: true,
            ..LinkPolicy::default()
        };

        let summary = Reconciler::new(&SystemFileSystemOps, &log, skip)
            .reconcile_tree(&s.repo.join(".zsh"), &s.home.join(".zsh"))
            .unwrap();

        assert_eq!(summary.skipped, 1);
        assert_eq!(std::fs::read_to_string(s.home.join(".zsh")).unwrap(), "user");
    }

    #[test]
    fn reconcile_entry_dispatches_on_source_kind() {
        let s = Scratch::new();
        s.file(".zshrc");
        s.file(".zsh/a.zsh");
        let log = RecordingLog::default();
        let r = Reconciler::new(&SystemFileSystemOps, &log, LinkPolicy::default());
        let paths = s.resolver();

        let file = r
            .reconcile_entry(&DotfileEntry::new(".zshrc"), &paths)
            .unwrap();
        let tree = r
            .reconcile_entry(&DotfileEntry::new(".zsh"), &paths)
            .unwrap();

        assert_eq!(file.created_count(), 1);
        assert_eq!(tree.created_count(), 1);
        assert!(!is_symlink(&s.home.join(".zsh")));
    }

    #[test]
    fn whole_directory_entry_under_hard_links_falls_back() {
        let s = Scratch::new();
        s.file(".zsh/a.zsh");
        let log = RecordingLog::default();
        let hard = LinkPolicy {
            use_symlink: false,
            ..LinkPolicy::default()
        };
        let entry = DotfileEntry {
            path: ".zsh".to_string(),
            whole_directory: true,
        };

        let summary = Reconciler::new(&SystemFileSystemOps, &log, hard)
            .reconcile_entry(&entry, &s.resolver())
            .unwrap();

        assert!(summary.directory_fallback);
        assert!(is_symlink(&s.home.join(".zsh")));
    }

    #[test]
    fn summary_merge_accumulates() {
        let mut a = LinkSummary::default();
        a.record(LinkOutcome::AlreadyCorrect);
        let mut b = LinkSummary::default();
        b.record(LinkOutcome::Skipped);
        b.record(LinkOutcome::Created {
            target: PathBuf::from("/h/x"),
            source: PathBuf::from("/r/x"),
        });
        b.directory_fallback = true;

        a.merge(b);

        assert_eq!(a.already_correct, 1);
        assert_eq!(a.skipped, 1);
        assert_eq!(a.created_count(), 1);
        assert!(a.directory_fallback);
    }
}
