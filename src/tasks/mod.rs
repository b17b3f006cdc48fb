//! Named, ordered tasks that orchestrate the link engine and the host
//! provisioning resources.
pub mod backup;
pub mod container;
pub mod context;
pub mod fonts;
pub mod git_config;
pub mod links;
pub mod packages;
pub mod starship;
pub mod update_timer;
pub mod verify;

pub use context::{Context, HostSetup};

use anyhow::Result;

use crate::logging::TaskStatus;

/// Result of a single task execution.
///
/// # Examples
///
/// ```
/// use dotfiles_provision::tasks::TaskResult;
///
/// let ok = TaskResult::Ok;
/// let skipped = TaskResult::Skipped("apt-get not found".into());
/// let dry = TaskResult::DryRun;
///
/// assert!(matches!(ok, TaskResult::Ok));
/// assert!(matches!(skipped, TaskResult::Skipped(_)));
/// assert!(matches!(dry, TaskResult::DryRun));
/// ```
#[derive(Debug, Clone)]
pub enum TaskResult {
    /// Task completed successfully.
    Ok,
    /// Task was skipped (tool missing, or a non-fatal step failed).
    Skipped(String),
    /// Task ran in dry-run mode.
    DryRun,
}

/// Counters for batch tasks that process many items.
///
/// Provides consistent summary logging across all tasks.
///
/// # Examples
///
/// ```
/// use dotfiles_provision::tasks::TaskStats;
///
/// let mut stats = TaskStats::new();
/// stats.changed = 3;
/// stats.already_ok = 10;
///
/// assert_eq!(stats.summary(false), "3 changed, 10 already ok");
/// assert_eq!(stats.summary(true), "3 would change, 10 already ok");
/// ```
///
/// When items are skipped, the summary includes the count:
///
/// ```
/// use dotfiles_provision::tasks::TaskStats;
///
/// let stats = TaskStats { changed: 1, already_ok: 2, skipped: 3 };
/// assert_eq!(stats.summary(false), "1 changed, 2 already ok, 3 skipped");
/// ```
#[derive(Debug, Default)]
pub struct TaskStats {
    /// Number of items changed or applied.
    pub changed: usize,
    /// Number of items already in the correct state.
    pub already_ok: usize,
    /// Number of items skipped.
    pub skipped: usize,
}

impl TaskStats {
    /// Create a new empty stats counter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Format the summary string (e.g. "3 changed, 10 already ok, 1 skipped").
    #[must_use]
    pub fn summary(&self, dry_run: bool) -> String {
        let verb = if dry_run { "would change" } else { "changed" };
        if self.skipped > 0 {
            format!(
                "{} {verb}, {} already ok, {} skipped",
                self.changed, self.already_ok, self.skipped
            )
        } else {
            format!("{} {verb}, {} already ok", self.changed, self.already_ok)
        }
    }

    /// Log the summary and return the appropriate `TaskResult`.
    #[must_use]
    pub fn finish(self, ctx: &Context) -> TaskResult {
        ctx.log.info(&self.summary(ctx.dry_run));
        if ctx.dry_run {
            TaskResult::DryRun
        } else {
            TaskResult::Ok
        }
    }
}

/// A named, executable task.
pub trait Task: Send + Sync {
    /// Human-readable task name.
    fn name(&self) -> &str;

    /// Whether this task applies to the current run.
    fn should_run(&self, ctx: &Context) -> bool;

    /// Execute the task.
    ///
    /// # Errors
    ///
    /// Returns an error if the task cannot complete. Every task error is
    /// fatal to the run.
    fn run(&self, ctx: &Context) -> Result<TaskResult>;
}

/// Tasks that reconcile the home directory, in their fixed order.
#[must_use]
pub fn link_tasks() -> Vec<Box<dyn Task>> {
    vec![
        Box::new(verify::VerifySources),
        Box::new(backup::BackupDotfiles),
        Box::new(links::LinkDotfiles),
        Box::new(container::ContainerSetup::default()),
        Box::new(update_timer::UpdateTimer),
    ]
}

/// Host provisioning tasks, in their fixed order. Each one decides from
/// [`Context::setup`] whether it applies.
#[must_use]
pub fn provision_tasks() -> Vec<Box<dyn Task>> {
    vec![
        Box::new(packages::InstallAptPackages),
        Box::new(fonts::InstallFonts),
        Box::new(starship::InstallStarship),
        Box::new(git_config::ConfigureGit),
    ]
}

/// Execute a task, recording the result in the logger.
///
/// Returns the recorded status so the caller can stop at the first failure.
pub fn execute(task: &dyn Task, ctx: &Context) -> TaskStatus {
    if !task.should_run(ctx) {
        ctx.log
            .debug(&format!("skipping task: {} (not applicable)", task.name()));
        ctx.log
            .record_task(task.name(), TaskStatus::NotApplicable, None);
        return TaskStatus::NotApplicable;
    }

    ctx.log.stage(task.name());

    let (status, message) = match task.run(ctx) {
        Ok(TaskResult::Ok) => (TaskStatus::Ok, None),
        Ok(TaskResult::Skipped(reason)) => {
            ctx.log.info(&format!("skipped: {reason}"));
            (TaskStatus::Skipped, Some(reason))
        }
        Ok(TaskResult::DryRun) => (TaskStatus::DryRun, None),
        Err(e) => {
            ctx.log.error(&format!("{}: {e:#}", task.name()));
            (TaskStatus::Failed, Some(format!("{e:#}")))
        }
    };
    ctx.log.record_task(task.name(), status, message.as_deref());
    status
}

/// Execute tasks in order until one fails.
///
/// # Errors
///
/// Returns an error naming the first failed task; no later task runs.
pub fn run_until_failure<'a>(
    tasks: impl IntoIterator<Item = &'a dyn Task>,
    ctx: &Context,
) -> Result<()> {
    for task in tasks {
        if execute(task, ctx) == TaskStatus::Failed {
            anyhow::bail!("task '{}' failed", task.name());
        }
    }
    Ok(())
}


#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use test_helpers::{Scratch, WhichExecutor, config_with, make_context};

    /// A mock task for testing `execute()`.
    struct MockTask {
        name: &'static str,
        should_run: bool,
        result: Result<TaskResult, String>,
    }

    impl Task for MockTask {
        fn name(&self) -> &str {
            self.name
        }
        fn should_run(&self, _ctx: &Context) -> bool {
            self.should_run
        }
        fn run(&self, _ctx: &Context) -> Result<TaskResult> {
            self.result.clone().map_err(|s| anyhow::anyhow!("{s}"))
        }
    }

    fn mock(name: &'static str, should_run: bool, result: Result<TaskResult, String>) -> MockTask {
        MockTask {
            name,
            should_run,
            result,
        }
    }

    fn context(scratch: &Scratch) -> (Context, Arc<crate::logging::RecordingLog>) {
        make_context(
            scratch,
            config_with(&scratch.root, &[]),
            Arc::new(WhichExecutor::default()),
        )
    }

    #[test]
    fn execute_skips_non_applicable_task() {
        let s = Scratch::new();
        let (ctx, log) = context(&s);
        let status = execute(&mock("n/a", false, Ok(TaskResult::Ok)), &ctx);
        assert_eq!(status, TaskStatus::NotApplicable);
        assert_eq!(log.task_entries()[0].status, TaskStatus::NotApplicable);
    }

    #[test]
    fn execute_records_ok_task() {
        let s = Scratch::new();
        let (ctx, log) = context(&s);
        assert_eq!(
            execute(&mock("ok-task", true, Ok(TaskResult::Ok)), &ctx),
            TaskStatus::Ok
        );
        assert_eq!(log.messages("stage"), vec!["ok-task"]);
    }

    #[test]
    fn execute_records_failed_task_with_message() {
        let s = Scratch::new();
        let (ctx, log) = context(&s);
        let status = execute(&mock("fail-task", true, Err("kaboom".to_string())), &ctx);
        assert_eq!(status, TaskStatus::Failed);
        let entry = &log.task_entries()[0];
        assert_eq!(entry.message.as_deref(), Some("kaboom"));
        assert!(log.contains("error", "fail-task: kaboom"));
    }

    #[test]
    fn execute_records_skipped_task() {
        let s = Scratch::new();
        let (ctx, log) = context(&s);
        let status = execute(
            &mock("skip-task", true, Ok(TaskResult::Skipped("not needed".to_string()))),
            &ctx,
        );
        assert_eq!(status, TaskStatus::Skipped);
        assert!(log.contains("info", "skipped: not needed"));
    }

    #[test]
    fn run_until_failure_stops_at_first_failure() {
        let s = Scratch::new();
        let (ctx, log) = context(&s);
        let tasks = [
            mock("first", true, Ok(TaskResult::Ok)),
            mock("second", true, Err("boom".to_string())),
            mock("third", true, Ok(TaskResult::Ok)),
        ];

        let err = run_until_failure(tasks.iter().map(|t| t as &dyn Task), &ctx).unwrap_err();

        assert!(err.to_string().contains("second"));
        let names: Vec<_> = log.task_entries().into_iter().map(|e| e.name).collect();
        assert_eq!(names, vec!["first", "second"]);
    }

    #[test]
    fn task_order_is_fixed() {
        let names: Vec<String> = link_tasks()
            .iter()
            .chain(provision_tasks().iter())
            .map(|t| t.name().to_string())
            .collect();
        insta::assert_yaml_snapshot!(names, @r"
        - Verify sources
        - Back up existing dotfiles
        - Link dotfiles
        - Container setup
        - Update-check timer
        - Install apt packages
        - Install fonts
        - Install starship
        - Configure git
        ");
    }

    #[test]
    fn stats_summary_includes_skipped_only_when_nonzero() {
        let stats = TaskStats {
            changed: 2,
            already_ok: 1,
            skipped: 0,
        };
        assert_eq!(stats.summary(false), "2 changed, 1 already ok");
    }
}
