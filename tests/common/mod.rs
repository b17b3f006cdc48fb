// Shared helpers for integration tests.
//
// Provides a temporary source repository and home directory with a fluent
// builder, plus collaborators that never touch the network or run commands,
// so each integration test can set up an isolated environment without
// repeating filesystem boilerplate.
//
// Used by all integration test binaries that declare `mod common;`.
#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use dotfiles_provision::config::Config;
use dotfiles_provision::exec::{ExecResult, Executor};
use dotfiles_provision::fetch::HttpFetcher;
use dotfiles_provision::logging::{Log, TaskEntry, TaskStatus};
use dotfiles_provision::operations::SystemFileSystemOps;
use dotfiles_provision::paths::PathResolver;
use dotfiles_provision::platform::Platform;
use dotfiles_provision::resources::link::LinkPolicy;
use dotfiles_provision::tasks::{Context, HostSetup};

/// [`Log`] that keeps every message as `"<level>: <text>"`.
#[derive(Debug, Default)]
pub struct CollectingLog {
    lines: Mutex<Vec<String>>,
    tasks: Mutex<Vec<TaskEntry>>,
}

impl CollectingLog {
    fn push(&self, level: &str, msg: &str) {
        self.lines
            .lock()
            .expect("log lock")
            .push(format!("{level}: {msg}"));
    }

    /// All lines in emission order.
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().expect("log lock").clone()
    }

    /// Lines of one level with the prefix stripped.
    pub fn messages(&self, level: &str) -> Vec<String> {
        let prefix = format!("{level}: ");
        self.lines()
            .into_iter()
            .filter_map(|l| l.strip_prefix(&prefix).map(String::from))
            .collect()
    }

    /// Recorded task results.
    pub fn tasks(&self) -> Vec<TaskEntry> {
        self.tasks.lock().expect("log lock").clone()
    }
}

impl Log for CollectingLog {
    fn stage(&self, msg: &str) {
        self.push("stage", msg);
    }
    fn info(&self, msg: &str) {
        self.push("info", msg);
    }
    fn debug(&self, msg: &str) {
        self.push("debug", msg);
    }
    fn warn(&self, msg: &str) {
        self.push("warn", msg);
    }
    fn error(&self, msg: &str) {
        self.push("error", msg);
    }
    fn dry_run(&self, msg: &str) {
        self.push("dry_run", msg);
    }
    fn record_task(&self, name: &str, status: TaskStatus, message: Option<&str>) {
        self.tasks.lock().expect("log lock").push(TaskEntry {
            name: name.to_string(),
            status,
            message: message.map(String::from),
        });
    }
}

/// Executor for which no program exists and every command fails.
#[derive(Debug, Default)]
pub struct NoTools;

impl Executor for NoTools {
    fn run(&self, program: &str, _: &[&str]) -> anyhow::Result<ExecResult> {
        anyhow::bail!("{program} is not available in tests")
    }

    fn run_unchecked(&self, program: &str, _: &[&str]) -> anyhow::Result<ExecResult> {
        anyhow::bail!("{program} is not available in tests")
    }

    fn which(&self, _: &str) -> bool {
        false
    }
}

/// A scratch source repository and home directory.
pub struct TestRepo {
    _dir: tempfile::TempDir,
    /// Canonical repository root.
    pub root: PathBuf,
    /// Canonical home directory.
    pub home: PathBuf,
    entries: Vec<String>,
}

impl TestRepo {
    /// Resolve an entry below the repository root.
    pub fn source(&self, rel: &str) -> PathBuf {
        self.root.join(rel)
    }

    /// Resolve an entry below the home directory.
    pub fn target(&self, rel: &str) -> PathBuf {
        self.home.join(rel)
    }

    /// Backup directory used by [`TestRepo::context`].
    pub fn backup_dir(&self) -> PathBuf {
        self.home.join(".dotfiles-backup/2024-01-02_03-04-05")
    }

    /// Configuration whose dotfile list is exactly the registered entries.
    pub fn config(&self) -> Config {
        let mut config = Config::load(&self.root).expect("load config");
        config.dotfiles = self
            .entries
            .iter()
            .map(|e| dotfiles_provision::config::dotfiles::DotfileEntry::new(e.clone()))
            .collect();
        config
    }

    /// Build a task context over this repository.
    pub fn context(&self, policy: LinkPolicy, log: Arc<CollectingLog>) -> Context {
        Context {
            config: Arc::new(self.config()),
            platform: Arc::new(Platform::default()),
            paths: Arc::new(PathResolver::new(
                self.root.clone(),
                self.home.clone(),
                self.backup_dir(),
            )),
            link_policy: policy,
            backup: false,
            setup: HostSetup::LinksOnly,
            log,
            dry_run: policy.dry_run,
            executor: Arc::new(NoTools),
            fs_ops: Arc::new(SystemFileSystemOps),
            fetcher: Arc::new(HttpFetcher::new()),
        }
    }
}

/// Fluent builder for [`TestRepo`].
pub struct TestRepoBuilder {
    repo: TestRepo,
}

impl TestRepoBuilder {
    /// Begin with an empty repository and home directory.
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        let base = dunce::canonicalize(dir.path()).expect("canonicalize temp dir");
        let root = base.join("repo");
        let home = base.join("home");
        std::fs::create_dir_all(root.join("conf")).expect("create repo");
        std::fs::create_dir_all(&home).expect("create home");
        Self {
            repo: TestRepo {
                _dir: dir,
                root,
                home,
                entries: vec![],
            },
        }
    }

    /// Write a file below the repository root without managing it.
    pub fn with_file(self, rel: &str, content: &str) -> Self {
        let path = self.repo.root.join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create source parent");
        }
        std::fs::write(&path, content).expect("write source file");
        self
    }

    /// Create an empty directory below the repository root.
    pub fn with_dir(self, rel: &str) -> Self {
        std::fs::create_dir_all(self.repo.root.join(rel)).expect("create source dir");
        self
    }

    /// Register a managed entry.
    pub fn managing(mut self, entry: &str) -> Self {
        self.repo.entries.push(entry.to_string());
        self
    }

    /// Write a file in the home directory.
    pub fn with_home_file(self, rel: &str, content: &str) -> Self {
        let path = self.repo.home.join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create home parent");
        }
        std::fs::write(&path, content).expect("write home file");
        self
    }

    /// Finish building.
    pub fn build(self) -> TestRepo {
        self.repo
    }
}

/// Every entry below `dir` as `"<relative path> <kind>"`, sorted, where kind
/// is `dir`, `file` or `-> <link value>`.
pub fn describe_tree(dir: &Path) -> Vec<String> {
    let mut out = Vec::new();
    for entry in walkdir::WalkDir::new(dir)
        .min_depth(1)
        .follow_links(false)
        .sort_by_file_name()
    {
        let entry = entry.expect("walk tree");
        let rel = entry
            .path()
            .strip_prefix(dir)
            .expect("relative path")
            .display()
            .to_string();
        let kind = if entry.path_is_symlink() {
            format!(
                "-> {}",
                std::fs::read_link(entry.path())
                    .expect("read link")
                    .display()
            )
        } else if entry.file_type().is_dir() {
            "dir".to_string()
        } else {
            "file".to_string()
        };
        out.push(format!("{rel} {kind}"));
    }
    out
}
