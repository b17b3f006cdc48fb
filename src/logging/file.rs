//! The per-command log file.
use std::fs;
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::subscriber::{Kind, message_of};

/// Directory below the user cache directory that holds the log files.
pub const LOG_DIR_NAME: &str = "dotfiles";

/// `$XDG_CACHE_HOME/dotfiles/<command>.log`, or `~/.cache/dotfiles/...` when
/// `XDG_CACHE_HOME` is unset. `None` without any usable base directory.
#[must_use]
pub fn default_log_path(command: &str) -> Option<PathBuf> {
    let cache = std::env::var_os("XDG_CACHE_HOME")
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .or_else(|| {
            std::env::var_os("HOME")
                .filter(|v| !v.is_empty())
                .map(|home| PathBuf::from(home).join(".cache"))
        })?;
    Some(log_path_in(&cache, command))
}

fn log_path_in(cache: &Path, command: &str) -> PathBuf {
    cache.join(LOG_DIR_NAME).join(format!("{command}.log"))
}

/// Remove terminal escape sequences. CSI sequences (`ESC [ ... final`) are
/// dropped whole; any other escape takes exactly one following character.
pub(super) fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\x1b' {
            out.push(c);
            continue;
        }
        if chars.next() == Some('[') {
            for c in chars.by_ref() {
                if ('@'..='~').contains(&c) {
                    break;
                }
            }
        }
    }
    out
}

/// [`tracing_subscriber::Layer`] appending every event, timestamped and
/// without colours, to the log file.
#[derive(Debug)]
pub(super) struct FileLayer {
    file: Mutex<fs::File>,
}

impl FileLayer {
    /// Truncate `path`, write the run header and open it for appending.
    /// `None` if the file cannot be written; the run then logs to the
    /// console only.
    pub(super) fn create(path: &Path, command: &str) -> Option<Self> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).ok()?;
        }
        let version = crate::commands::version::version();
        let rule = "=".repeat(42);
        let header = format!(
            "{rule}\ndotfiles {version} ({command}) {}\n{rule}\n",
            chrono::Utc::now().format("%Y-%m-%d %H:%M:%S"),
        );
        fs::write(path, header).ok()?;
        let file = fs::OpenOptions::new().append(true).open(path).ok()?;
        Some(Self {
            file: Mutex::new(file),
        })
    }
}

impl Kind {
    const fn file_prefix(self) -> &'static str {
        match self {
            Self::Stage => "==> ",
            Self::DryRun => "    [dry run] ",
            Self::Error => "    [error] ",
            Self::Warn => "    [warn] ",
            Self::Debug => "    [debug] ",
            Self::Info => "    ",
        }
    }
}

impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for FileLayer {
    fn on_event(&self, event: &tracing::Event<'_>, _: tracing_subscriber::layer::Context<'_, S>) {
        let kind = Kind::of(event.metadata());
        let line = format!(
            "[{}] {}{}",
            chrono::Utc::now().format("%H:%M:%S"),
            kind.file_prefix(),
            strip_ansi(&message_of(event))
        );
        if let Ok(mut f) = self.file.lock() {
            writeln!(f, "{line}").ok();
        }
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::logging::{DRY_RUN_TARGET, STAGE_TARGET};
    use tracing_subscriber::layer::SubscriberExt as _;

    #[test]
    fn colours_and_cursor_movement_are_removed() {
        assert_eq!(strip_ansi("\x1b[1;34m==>\x1b[0m \x1b[1mLink\x1b[0m"), "==> Link");
        assert_eq!(strip_ansi("\x1b[2Jcleared\x1b[K"), "cleared");
        assert_eq!(strip_ansi("\x1b7saved"), "saved");
        assert_eq!(strip_ansi("plain"), "plain");
        assert_eq!(strip_ansi(""), "");
    }

    #[test]
    fn log_lives_in_the_dotfiles_cache_dir() {
        assert_eq!(
            log_path_in(Path::new("/cache"), "install"),
            PathBuf::from("/cache/dotfiles/install.log")
        );
    }

    #[test]
    fn each_run_starts_a_fresh_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("nested/install.log");

        FileLayer::create(&path, "install").unwrap();
        fs::write(&path, "old run\n").unwrap();
        FileLayer::create(&path, "install").unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        assert!(!contents.contains("old run"));
        assert!(contents.lines().nth(1).unwrap().starts_with("dotfiles "));
        assert!(contents.contains("(install)"));
    }

    #[test]
    fn events_are_tagged_by_kind() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("install.log");
        let layer = FileLayer::create(&path, "install").unwrap();

        tracing::subscriber::with_default(tracing_subscriber::registry().with(layer), || {
            tracing::info!(target: STAGE_TARGET, "Link dotfiles");
            tracing::info!(target: DRY_RUN_TARGET, "would link '.zshrc'");
            tracing::warn!("\x1b[33mfonts\x1b[0m skipped");
            tracing::debug!("resolved root");
            tracing::info!("done");
        });

        let lines: Vec<String> = fs::read_to_string(&path)
            .unwrap()
            .lines()
            .skip(3)
            .map(|l| l.split_once("] ").unwrap().1.to_string())
            .collect();
        assert_eq!(
            lines,
            vec![
                "==> Link dotfiles",
                "    [dry run] would link '.zshrc'",
                "    [warn] fonts skipped",
                "    [debug] resolved root",
                "    done",
            ]
        );
    }
}
