//! Console and log-file output.
//!
//! Task and resource code only sees the [`Log`] trait. The binary backs it
//! with [`Logger`], which turns each call into a [`tracing`] event rendered by
//! the subscriber from [`init_subscriber`]; tests back it with an in-memory
//! recorder.

mod file;
mod logger;
mod subscriber;

pub use file::{LOG_DIR_NAME, default_log_path};
pub use logger::{Logger, RunSummary};
pub use subscriber::{LOG_ENV_VAR, init_subscriber};

/// `tracing` target of stage headers.
pub(crate) const STAGE_TARGET: &str = "provision::stage";
/// `tracing` target of dry-run notes.
pub(crate) const DRY_RUN_TARGET: &str = "provision::dry_run";

/// Final state of one task, as listed in the run summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    /// Ran and succeeded.
    Ok,
    /// Not part of this run (e.g. not a new host, not in a container).
    NotApplicable,
    /// Gave up without failing the run (tool missing, non-fatal error).
    Skipped,
    /// Only reported what it would do.
    DryRun,
    /// Failed; later tasks did not run.
    Failed,
}

/// One line of the run summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskEntry {
    /// Task name.
    pub name: String,
    /// How it ended.
    pub status: TaskStatus,
    /// Skip reason or error text.
    pub message: Option<String>,
}

/// Sink for everything a run reports.
pub trait Log: Send + Sync {
    /// Start of a task or other major step.
    fn stage(&self, msg: &str);
    /// Progress.
    fn info(&self, msg: &str);
    /// Detail, shown on the console with `--verbose` only.
    fn debug(&self, msg: &str);
    /// Something went wrong but the run continues.
    fn warn(&self, msg: &str);
    /// Something went wrong and the run stops.
    fn error(&self, msg: &str);
    /// What a dry run would have done.
    fn dry_run(&self, msg: &str);
    /// Remember how a task ended, for the summary.
    fn record_task(&self, name: &str, status: TaskStatus, message: Option<&str>);
}

/// [`Logger`] writing to a fresh log file in a temporary directory through a
/// thread-local subscriber. Keep the guard alive for the whole test.
#[cfg(test)]
#[allow(clippy::expect_used)]
pub(crate) fn isolated_logger() -> (Logger, tempfile::TempDir, tracing::dispatcher::DefaultGuard) {
    use tracing_subscriber::{Layer as _, filter::LevelFilter, layer::SubscriberExt as _};

    let tmp = tempfile::tempdir().expect("create temp dir");
    let path = tmp.path().join("test.log");
    let layer = file::FileLayer::create(&path, "test").expect("create log file");
    let subscriber = tracing_subscriber::registry().with(layer.with_filter(LevelFilter::DEBUG));
    let guard = tracing::dispatcher::set_default(&tracing::Dispatch::new(subscriber));
    (Logger::with_log_file(Some(path)), tmp, guard)
}

/// In-memory [`Log`] that keeps every message as `"<level>: <text>"`, for
/// example `"dry_run: would link ..."`.
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct RecordingLog {
    lines: std::sync::Mutex<Vec<String>>,
    tasks: std::sync::Mutex<Vec<TaskEntry>>,
}

#[cfg(test)]
impl RecordingLog {
    fn push(&self, level: &str, msg: &str) {
        if let Ok(mut guard) = self.lines.lock() {
            guard.push(format!("{level}: {msg}"));
        }
    }

    /// All recorded lines in emission order.
    pub(crate) fn lines(&self) -> Vec<String> {
        self.lines.lock().map_or_else(|_| vec![], |g| g.clone())
    }

    /// Recorded lines with the given level prefix stripped.
    pub(crate) fn messages(&self, level: &str) -> Vec<String> {
        let prefix = format!("{level}: ");
        self.lines()
            .into_iter()
            .filter_map(|l| l.strip_prefix(&prefix).map(String::from))
            .collect()
    }

    /// Whether any line of `level` contains `needle`.
    pub(crate) fn contains(&self, level: &str, needle: &str) -> bool {
        self.messages(level).iter().any(|m| m.contains(needle))
    }

    /// Recorded task entries.
    pub(crate) fn task_entries(&self) -> Vec<TaskEntry> {
        self.tasks.lock().map_or_else(|_| vec![], |g| g.clone())
    }
}

#[cfg(test)]
impl Log for RecordingLog {
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
        if let Ok(mut guard) = self.tasks.lock() {
            guard.push(TaskEntry {
                name: name.to_string(),
                status,
                message: message.map(String::from),
            });
        }
    }
}
