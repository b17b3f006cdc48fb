//! The `install` workflow: link, then decide and run provisioning.
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context as _, Result};

use super::prompt::{Confirm, NEW_HOST_QUESTION, UI_QUESTION};
use crate::cli::{GlobalOpts, InstallOpts};
use crate::config::{CONFIG_FILE, Config};
use crate::error::ConfigError;
use crate::exec::Executor;
use crate::fetch::HttpFetcher;
use crate::logging::Log;
use crate::operations::SystemFileSystemOps;
use crate::paths::PathResolver;
use crate::platform::Platform;
use crate::resources::link::LinkPolicy;
use crate::tasks::links::has_previous_installation;
use crate::tasks::{self, Context, HostSetup, Task};

/// Install flags after the precedence rules between them are applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[allow(clippy::struct_excessive_bools)]
pub struct InstallPlan {
    /// Run the full first-run setup.
    pub new_host: bool,
    /// Include desktop packages.
    pub ui: bool,
    /// Refresh tools without prompting.
    pub update: bool,
    /// Never prompt.
    pub non_interactive: bool,
}

impl InstallPlan {
    /// Resolve the flags: `--update` forces a non-interactive run without
    /// new-host or UI steps, and `--ui` implies `--new-host`.
    #[must_use]
    pub fn from_opts(opts: &InstallOpts, log: &dyn Log) -> Self {
        let mut plan = Self {
            new_host: opts.new_host,
            ui: opts.ui,
            update: opts.update,
            non_interactive: opts.non_interactive,
        };
        if plan.update {
            log.info("running update workflow (--update, non-interactive)");
            plan.non_interactive = true;
            plan.new_host = false;
            plan.ui = false;
        } else if plan.ui && !plan.new_host {
            log.info("--ui selected without --new-host; enabling --new-host as prerequisite");
            plan.new_host = true;
        }
        plan
    }
}

/// Link policy requested by the flags. Inside a container existing targets
/// are left alone unless `--force` says otherwise.
#[must_use]
pub const fn link_policy(opts: &InstallOpts, platform: &Platform, dry_run: bool) -> LinkPolicy {
    LinkPolicy {
        use_symlink: !opts.hard_links,
        skip_existing: opts.skip_existing || platform.in_container,
        force: opts.force,
        dry_run,
    }
}

/// Run the install command.
///
/// # Errors
///
/// Returns an error if the root or home cannot be resolved, the
/// configuration fails to load, or any task fails.
pub fn run(
    global: &GlobalOpts,
    opts: &InstallOpts,
    log: &Arc<crate::logging::Logger>,
    executor: Arc<dyn Executor>,
) -> Result<()> {
    log.info(&format!("dotfiles {}", super::version::version()));

    let root = resolve_root(global)?;
    let home = resolve_home(global)?;
    log.debug(&format!("source root: {}", root.display()));
    log.debug(&format!("home: {}", home.display()));

    let config = Config::load(&root)?;
    log.debug(&format!(
        "{} dotfile entries, {} apt packages, {} ui packages",
        config.dotfiles.len(),
        config.packages.apt.len(),
        config.packages.ui.len()
    ));
    let platform = Platform::detect(&*executor);
    log.debug(&format!(
        "in container: {}, ui: {}",
        platform.in_container, platform.has_ui
    ));

    let backup_dir = PathResolver::backup_dir_for(&home, chrono::Local::now());
    let plan = InstallPlan::from_opts(opts, &**log);
    let ctx = Context {
        config: Arc::new(config),
        paths: Arc::new(PathResolver::new(root, home, backup_dir)),
        link_policy: link_policy(opts, &platform, global.dry_run),
        platform: Arc::new(platform),
        backup: opts.backup,
        setup: HostSetup::LinksOnly,
        log: Arc::clone(log) as Arc<dyn Log>,
        dry_run: global.dry_run,
        executor,
        fs_ops: Arc::new(SystemFileSystemOps),
        fetcher: Arc::new(HttpFetcher::new()),
    };

    let result = execute(&ctx, plan, &mut super::prompt::Prompter::stdio());
    log.print_summary();
    result?;
    let count = log.summary().failed;
    if count > 0 {
        anyhow::bail!("{count} task(s) failed");
    }
    log.info("setup completed successfully");
    Ok(())
}

/// Link, then provision according to `plan` and the answers from `prompter`.
///
/// Previous-installation detection happens before anything is linked, so a
/// fresh host is recognised as such.
///
/// # Errors
///
/// Returns an error naming the first failed task, or if a prompt fails.
pub fn execute(ctx: &Context, plan: InstallPlan, prompter: &mut dyn Confirm) -> Result<()> {
    let installed = has_previous_installation(ctx);

    let link_tasks = tasks::link_tasks();
    tasks::run_until_failure(link_tasks.iter().map(|t| -> &dyn Task { t.as_ref() }), ctx)?;

    let setup = resolve_setup(ctx, plan, installed, prompter)?;
    ctx.log.debug(&format!("host setup: {setup:?}"));
    let provision_ctx = ctx.with_setup(setup);
    let provision_tasks = tasks::provision_tasks();
    tasks::run_until_failure(
        provision_tasks.iter().map(|t| -> &dyn Task { t.as_ref() }),
        &provision_ctx,
    )
}

/// Decide which provisioning steps run, prompting where the flags leave it
/// open.
fn resolve_setup(
    ctx: &Context,
    plan: InstallPlan,
    installed: bool,
    prompter: &mut dyn Confirm,
) -> Result<HostSetup> {
    if plan.update {
        return Ok(HostSetup::Update);
    }

    let mut new_host = plan.new_host;
    if !new_host && !installed {
        ctx.log.info("no previous dotfiles installation detected");
        if plan.non_interactive {
            ctx.log.info("non-interactive mode: skipping new host prompt");
        } else {
            new_host = prompter.confirm(NEW_HOST_QUESTION)?;
        }
    }

    let mut ui = plan.ui;
    if new_host && !ui && ctx.platform.has_ui {
        if plan.non_interactive {
            ctx.log.info("non-interactive mode: skipping UI setup prompt");
        } else {
            ui = prompter.confirm(UI_QUESTION)?;
        }
    }

    Ok(if new_host {
        HostSetup::NewHost { ui }
    } else {
        HostSetup::LinksOnly
    })
}

/// Environment variable naming the dotfiles root.
pub const ROOT_ENV_VAR: &str = "DOTFILES_ROOT";

/// Resolve the dotfiles root directory.
///
/// Order: `--root`, then `DOTFILES_ROOT`, then the directories around the
/// binary, then the current directory. Auto-detected candidates must contain
/// `conf/provision.toml`; if none does, the current directory is used.
///
/// # Errors
///
/// Returns an error if the chosen directory cannot be canonicalised.
pub fn resolve_root(global: &GlobalOpts) -> Result<PathBuf> {
    let explicit = global
        .root
        .clone()
        .or_else(|| std::env::var_os(ROOT_ENV_VAR).map(PathBuf::from));
    let cwd = std::env::current_dir().context("reading current directory")?;
    let root = explicit.unwrap_or_else(|| detect_root(&cwd));
    dunce::canonicalize(&root)
        .with_context(|| format!("resolving dotfiles root {}", root.display()))
}

fn detect_root(cwd: &Path) -> PathBuf {
    let mut candidates = Vec::new();
    if let Ok(exe) = std::env::current_exe()
        && let Some(parent) = exe.parent()
    {
        candidates.push(parent.join("../.."));
        candidates.push(parent.join(".."));
        candidates.push(parent.to_path_buf());
    }
    candidates.push(cwd.to_path_buf());
    candidates
        .into_iter()
        .find(|dir| dir.join(CONFIG_FILE).is_file())
        .unwrap_or_else(|| cwd.to_path_buf())
}

/// Resolve the home directory from `--home`, then `HOME`.
///
/// # Errors
///
/// Returns [`ConfigError::HomeNotSet`] when neither is available, or an error
/// if the directory cannot be canonicalised.
pub fn resolve_home(global: &GlobalOpts) -> Result<PathBuf> {
    let home = global
        .home
        .clone()
        .or_else(|| std::env::var_os("HOME").filter(|h| !h.is_empty()).map(PathBuf::from))
        .ok_or(ConfigError::HomeNotSet)?;
    dunce::canonicalize(&home)
        .with_context(|| format!("resolving home directory {}", home.display()))
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::logging::{RecordingLog, TaskStatus};
    use crate::tasks::test_helpers::{Scratch, WhichExecutor, config_with, make_context};
    use std::collections::VecDeque;

    /// Scripted answers; records every question asked.
    struct Answers {
        answers: VecDeque<bool>,
        asked: Vec<String>,
    }

    impl Answers {
        fn new(answers: &[bool]) -> Self {
            Self {
                answers: answers.iter().copied().collect(),
                asked: vec![],
            }
        }
    }

    impl Confirm for Answers {
        fn confirm(&mut self, question: &str) -> Result<bool> {
            self.asked.push(question.to_string());
            Ok(self.answers.pop_front().unwrap_or(false))
        }
    }

    fn opts() -> InstallOpts {
        InstallOpts::default()
    }

    fn context(s: &Scratch, has_ui: bool) -> (Context, Arc<RecordingLog>) {
        s.source(".zshrc", "zshrc");
        let (mut ctx, log) = make_context(
            s,
            config_with(&s.root, &[".zshrc"]),
            Arc::new(WhichExecutor::default()),
        );
        ctx.platform = Arc::new(Platform::new(false, has_ui));
        (ctx, log)
    }

    // ------------------------------------------------------------------
    // InstallPlan / link_policy
    // ------------------------------------------------------------------

    #[test]
    fn update_overrides_new_host_and_ui() {
        let log = RecordingLog::default();
        let plan = InstallPlan::from_opts(
            &InstallOpts {
                update: true,
                new_host: true,
                ui: true,
                ..opts()
            },
            &log,
        );
        assert_eq!(
            plan,
            InstallPlan {
                new_host: false,
                ui: false,
                update: true,
                non_interactive: true,
            }
        );
        assert!(log.contains("info", "running update workflow"));
    }

    #[test]
    fn ui_implies_new_host() {
        let log = RecordingLog::default();
        let plan = InstallPlan::from_opts(
            &InstallOpts {
                ui: true,
                ..opts()
            },
            &log,
        );
        assert!(plan.new_host && plan.ui);
    }

    #[test]
    fn container_defaults_to_skip_existing() {
        let policy = link_policy(&opts(), &Platform::new(true, false), false);
        assert!(policy.skip_existing);
        assert!(policy.use_symlink);

        let policy = link_policy(
            &InstallOpts {
                hard_links: true,
                ..opts()
            },
            &Platform::default(),
            true,
        );
        assert!(!policy.skip_existing && !policy.use_symlink && policy.dry_run);
    }

    // ------------------------------------------------------------------
    // resolve_setup
    // ------------------------------------------------------------------

    #[test]
    fn fresh_host_is_asked_about_new_host_setup() {
        let s = Scratch::new();
        let (ctx, _) = context(&s, false);
        let mut answers = Answers::new(&[true]);

        let setup = resolve_setup(&ctx, InstallPlan::default(), false, &mut answers).unwrap();

        assert_eq!(setup, HostSetup::NewHost { ui: false });
        assert_eq!(answers.asked, vec![NEW_HOST_QUESTION]);
    }

    #[test]
    fn ui_question_follows_on_desktop_hosts() {
        let s = Scratch::new();
        let (ctx, _) = context(&s, true);
        let mut answers = Answers::new(&[true, true]);

        let setup = resolve_setup(&ctx, InstallPlan::default(), false, &mut answers).unwrap();

        assert_eq!(setup, HostSetup::NewHost { ui: true });
        assert_eq!(answers.asked, vec![NEW_HOST_QUESTION, UI_QUESTION]);
    }

    #[test]
    fn installed_host_is_not_asked() {
        let s = Scratch::new();
        let (ctx, _) = context(&s, true);
        let mut answers = Answers::new(&[]);

        let setup = resolve_setup(&ctx, InstallPlan::default(), true, &mut answers).unwrap();

        assert_eq!(setup, HostSetup::LinksOnly);
        assert!(answers.asked.is_empty());
    }

    #[test]
    fn non_interactive_never_asks() {
        let s = Scratch::new();
        let (ctx, log) = context(&s, true);
        let mut answers = Answers::new(&[true, true]);
        let plan = InstallPlan {
            non_interactive: true,
            ..InstallPlan::default()
        };

        let setup = resolve_setup(&ctx, plan, false, &mut answers).unwrap();

        assert_eq!(setup, HostSetup::LinksOnly);
        assert!(answers.asked.is_empty());
        assert!(log.contains("info", "non-interactive mode: skipping new host prompt"));
    }

    #[test]
    fn explicit_new_host_only_asks_about_ui() {
        let s = Scratch::new();
        let (ctx, _) = context(&s, true);
        let mut answers = Answers::new(&[false]);
        let plan = InstallPlan {
            new_host: true,
            ..InstallPlan::default()
        };

        let setup = resolve_setup(&ctx, plan, false, &mut answers).unwrap();

        assert_eq!(setup, HostSetup::NewHost { ui: false });
        assert_eq!(answers.asked, vec![UI_QUESTION]);
    }

    #[test]
    fn update_runs_without_questions() {
        let s = Scratch::new();
        let (ctx, _) = context(&s, true);
        let mut answers = Answers::new(&[]);
        let plan = InstallPlan {
            update: true,
            non_interactive: true,
            ..InstallPlan::default()
        };

        assert_eq!(
            resolve_setup(&ctx, plan, false, &mut answers).unwrap(),
            HostSetup::Update
        );
        assert!(answers.asked.is_empty());
    }

    // ------------------------------------------------------------------
    // execute
    // ------------------------------------------------------------------

    #[test]
    fn fresh_host_declining_setup_only_links() {
        let s = Scratch::new();
        let (ctx, log) = context(&s, false);
        let mut answers = Answers::new(&[false]);

        execute(&ctx, InstallPlan::default(), &mut answers).unwrap();

        assert!(s.home.join(".zshrc").is_symlink());
        assert_eq!(answers.asked.len(), 1);
        let statuses: Vec<_> = log
            .task_entries()
            .into_iter()
            .map(|e| (e.name, e.status))
            .collect();
        assert!(statuses.contains(&("Link dotfiles".to_string(), TaskStatus::Ok)));
        assert!(statuses.contains(&("Install apt packages".to_string(), TaskStatus::NotApplicable)));
    }

    #[test]
    fn second_run_detects_installation() {
        let s = Scratch::new();
        let (ctx, _) = context(&s, false);
        execute(&ctx, InstallPlan::default(), &mut Answers::new(&[false])).unwrap();

        let mut answers = Answers::new(&[]);
        execute(&ctx, InstallPlan::default(), &mut answers).unwrap();

        assert!(answers.asked.is_empty());
    }

    #[test]
    fn missing_source_stops_before_linking() {
        let s = Scratch::new();
        let (mut ctx, log) = context(&s, false);
        ctx.config = Arc::new(config_with(&s.root, &[".zshrc", ".missing"]));

        let err = execute(&ctx, InstallPlan::default(), &mut Answers::new(&[])).unwrap_err();

        assert!(err.to_string().contains("Verify sources"));
        assert!(!s.home.join(".zshrc").exists());
        assert_eq!(log.task_entries().len(), 1);
    }

    // ------------------------------------------------------------------
    // resolve_root / resolve_home
    // ------------------------------------------------------------------

    #[test]
    fn explicit_root_is_canonicalised() {
        let s = Scratch::new();
        let global = GlobalOpts {
            root: Some(s.root.join("../repo")),
            ..GlobalOpts::default()
        };
        assert_eq!(resolve_root(&global).unwrap(), s.root);
    }

    #[test]
    fn missing_explicit_root_is_an_error() {
        let s = Scratch::new();
        let global = GlobalOpts {
            root: Some(s.root.join("nope")),
            ..GlobalOpts::default()
        };
        let err = resolve_root(&global).unwrap_err();
        assert!(err.to_string().contains("resolving dotfiles root"));
    }

    #[test]
    fn explicit_home_wins() {
        let s = Scratch::new();
        let global = GlobalOpts {
            home: Some(s.home.clone()),
            ..GlobalOpts::default()
        };
        assert_eq!(resolve_home(&global).unwrap(), s.home);
    }

    #[test]
    fn detect_root_falls_back_to_cwd() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(detect_root(dir.path()), dir.path());

        std::fs::create_dir_all(dir.path().join("conf")).unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "").unwrap();
        assert_eq!(detect_root(dir.path()), dir.path());
    }
}
