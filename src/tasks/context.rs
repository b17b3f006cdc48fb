//! Shared state handed to every task.
use std::path::Path;
use std::sync::Arc;

use crate::config::Config;
use crate::exec::Executor;
use crate::fetch::Fetcher;
use crate::logging::Log;
use crate::operations::FileSystemOps;
use crate::paths::PathResolver;
use crate::platform::Platform;
use crate::resources::link::LinkPolicy;

/// Which host provisioning steps run after linking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HostSetup {
    /// Link dotfiles only.
    #[default]
    LinksOnly,
    /// Refresh packages, fonts and starship without prompting or git config.
    Update,
    /// Full first-run setup.
    NewHost {
        /// Also install the desktop package list.
        ui: bool,
    },
}

impl HostSetup {
    /// Apt packages, fonts and starship are installed.
    #[must_use]
    pub const fn installs_tools(self) -> bool {
        !matches!(self, Self::LinksOnly)
    }

    /// The desktop package list is included.
    #[must_use]
    pub const fn with_ui(self) -> bool {
        matches!(self, Self::NewHost { ui: true })
    }

    /// First-run-only steps such as git config are run.
    #[must_use]
    pub const fn is_new_host(self) -> bool {
        matches!(self, Self::NewHost { .. })
    }
}

/// Shared context for task execution, built once per invocation.
pub struct Context {
    /// Configuration loaded from `conf/provision.toml` (or defaults).
    pub config: Arc<Config>,
    /// Detected platform information.
    pub platform: Arc<Platform>,
    /// Source, home and backup locations of this run.
    pub paths: Arc<PathResolver>,
    /// Link policy as requested on the command line.
    pub link_policy: LinkPolicy,
    /// Snapshot existing targets before linking.
    pub backup: bool,
    /// Provisioning steps selected for this run.
    pub setup: HostSetup,
    /// Logger for output and task recording.
    pub log: Arc<dyn Log>,
    /// Whether to perform a dry run (preview changes without applying).
    pub dry_run: bool,
    /// Command executor (for testing or real system calls).
    pub executor: Arc<dyn Executor>,
    /// Filesystem operation abstraction (injectable for testing).
    pub fs_ops: Arc<dyn FileSystemOps>,
    /// Download backend (injectable for testing).
    pub fetcher: Arc<dyn Fetcher>,
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("config", &"<Config>")
            .field("platform", &self.platform)
            .field("paths", &self.paths)
            .field("link_policy", &self.link_policy)
            .field("backup", &self.backup)
            .field("setup", &self.setup)
            .field("log", &"<dyn Log>")
            .field("dry_run", &self.dry_run)
            .field("executor", &"<dyn Executor>")
            .field("fs_ops", &"<dyn FileSystemOps>")
            .field("fetcher", &"<dyn Fetcher>")
            .finish()
    }
}

impl Context {
    /// Root directory of the dotfiles repository.
    #[must_use]
    pub fn root(&self) -> &Path {
        self.paths.source_root()
    }

    /// Home directory receiving the links.
    #[must_use]
    pub fn home(&self) -> &Path {
        self.paths.home()
    }

    /// Create a copy of this context with different provisioning steps.
    ///
    /// All other fields are shared by reference (via `Arc`). Used once the
    /// prompts after linking have settled what else to run.
    #[must_use]
    pub fn with_setup(&self, setup: HostSetup) -> Self {
        Self {
            config: Arc::clone(&self.config),
            platform: Arc::clone(&self.platform),
            paths: Arc::clone(&self.paths),
            link_policy: self.link_policy,
            backup: self.backup,
            setup,
            log: Arc::clone(&self.log),
            dry_run: self.dry_run,
            executor: Arc::clone(&self.executor),
            fs_ops: Arc::clone(&self.fs_ops),
            fetcher: Arc::clone(&self.fetcher),
        }
    }
}
