//! The production [`Log`] implementation.
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::file::default_log_path;
use super::{DRY_RUN_TARGET, Log, STAGE_TARGET, TaskEntry, TaskStatus};

/// Emits every message as a [`tracing`] event and keeps the task results
/// for the end-of-run summary.
#[derive(Debug)]
pub struct Logger {
    tasks: Mutex<Vec<TaskEntry>>,
    log_file: Option<PathBuf>,
}

impl Logger {
    /// Logger for `command`, pointing the summary at its default log file.
    #[must_use]
    pub fn new(command: &str) -> Self {
        Self::with_log_file(default_log_path(command))
    }

    /// Logger whose summary names `log_file`.
    #[must_use]
    pub const fn with_log_file(log_file: Option<PathBuf>) -> Self {
        Self {
            tasks: Mutex::new(Vec::new()),
            log_file,
        }
    }

    /// Where the subscriber writes the full log, if anywhere.
    #[must_use]
    pub fn log_path(&self) -> Option<&Path> {
        self.log_file.as_deref()
    }

    /// Task results recorded so far, in order.
    #[must_use]
    pub fn task_entries(&self) -> Vec<TaskEntry> {
        self.tasks.lock().map_or_else(|_| vec![], |g| g.clone())
    }

    /// Counts of the recorded task results.
    #[must_use]
    pub fn summary(&self) -> RunSummary {
        RunSummary::tally(&self.task_entries())
    }

    /// Print one line per task, the totals and the log file location.
    pub fn print_summary(&self) {
        let tasks = self.task_entries();
        if tasks.is_empty() {
            return;
        }

        println!();
        Log::stage(self, "Summary");
        for task in &tasks {
            let (icon, colour) = match task.status {
                TaskStatus::Ok => ("✓", "32"),
                TaskStatus::NotApplicable => ("·", "2"),
                TaskStatus::Skipped => ("○", "33"),
                TaskStatus::DryRun => ("~", "37"),
                TaskStatus::Failed => ("✗", "31"),
            };
            let detail = task
                .message
                .as_deref()
                .map_or_else(String::new, |m| format!(" ({m})"));
            Log::info(
                self,
                &format!("\x1b[{colour}m{icon} {}{detail}\x1b[0m", task.name),
            );
        }
        println!();
        Log::info(self, &RunSummary::tally(&tasks).to_string());
        if let Some(path) = self.log_path() {
            Log::info(self, &format!("\x1b[2mlog: {}\x1b[0m", path.display()));
        }
    }
}

impl Log for Logger {
    fn stage(&self, msg: &str) {
        tracing::info!(target: STAGE_TARGET, "{msg}");
    }

    fn info(&self, msg: &str) {
        tracing::info!("{msg}");
    }

    fn debug(&self, msg: &str) {
        tracing::debug!("{msg}");
    }

    fn warn(&self, msg: &str) {
        tracing::warn!("{msg}");
    }

    fn error(&self, msg: &str) {
        tracing::error!("{msg}");
    }

    fn dry_run(&self, msg: &str) {
        tracing::info!(target: DRY_RUN_TARGET, "{msg}");
    }

    fn record_task(&self, name: &str, status: TaskStatus, message: Option<&str>) {
        if let Ok(mut tasks) = self.tasks.lock() {
            tasks.push(TaskEntry {
                name: name.to_string(),
                status,
                message: message.map(String::from),
            });
        }
    }
}

/// Number of tasks per final status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Succeeded.
    pub ok: usize,
    /// Did not apply.
    pub not_applicable: usize,
    /// Skipped.
    pub skipped: usize,
    /// Dry run only.
    pub dry_run: usize,
    /// Failed.
    pub failed: usize,
}

impl RunSummary {
    /// Count `tasks` by status.
    #[must_use]
    pub fn tally(tasks: &[TaskEntry]) -> Self {
        tasks.iter().fold(Self::default(), |mut s, t| {
            match t.status {
                TaskStatus::Ok => s.ok += 1,
                TaskStatus::NotApplicable => s.not_applicable += 1,
                TaskStatus::Skipped => s.skipped += 1,
                TaskStatus::DryRun => s.dry_run += 1,
                TaskStatus::Failed => s.failed += 1,
            }
            s
        })
    }

    /// All tasks counted.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.ok + self.not_applicable + self.skipped + self.dry_run + self.failed
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} tasks: {} ok, {} n/a, {} skipped, {} dry-run, {} failed",
            self.total(),
            self.ok,
            self.not_applicable,
            self.skipped,
            self.dry_run,
            self.failed
        )
    }
}
