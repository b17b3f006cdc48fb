//! Domain-specific error types for the provisioning engine.
//!
//! Library modules return these typed errors; command handlers at the CLI
//! boundary convert them to [`anyhow::Error`] via the standard `?` operator.
//!
//! # Error hierarchy
//!
//! ```text
//! ProvisionError
//! ├── Config(ConfigError) : provision.toml parsing, entry validation, root/home
//! ├── Link(LinkError)     : self links, missing sources, removal failures
//! └── Fs(FsError)         : filesystem provider failures
//! ```

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Top-level error type for the provisioning engine.
#[derive(Error, Debug)]
pub enum ProvisionError {
    /// Configuration-related error.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Link reconciliation error.
    #[error("Link error: {0}")]
    Link(#[from] LinkError),

    /// Filesystem provider error.
    #[error("Filesystem error: {0}")]
    Fs(#[from] FsError),
}

/// Errors that arise from loading and validating configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// An I/O error occurred while reading a config file.
    #[error("IO error reading config file {path}: {source}")]
    Io {
        /// Path to the file that could not be read.
        path: String,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// The TOML file could not be parsed.
    #[error("Invalid TOML in {file}: {message}")]
    InvalidSyntax {
        /// File that failed to parse.
        file: String,
        /// Parser message.
        message: String,
    },

    /// A managed entry is not a usable relative path.
    #[error("Invalid dotfile entry '{entry}': {reason}")]
    InvalidEntry {
        /// The offending entry as written in the config.
        entry: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The home directory could not be determined.
    #[error("HOME environment variable is not set; pass --home")]
    HomeNotSet,
}

/// Failures reported by the filesystem provider.
///
/// "Does not exist", "permission denied" and "resource busy" are kept
/// distinguishable so the reconciler can retry the transient case and report
/// the others precisely.
#[derive(Error, Debug)]
pub enum FsError {
    /// The path does not exist.
    #[error("no such file or directory: {}", path.display())]
    NotFound {
        /// Path that was missing.
        path: PathBuf,
    },

    /// The operation was denied.
    #[error("permission denied: {}", path.display())]
    PermissionDenied {
        /// Path the operation was denied on.
        path: PathBuf,
    },

    /// The path is temporarily held by another process.
    #[error("resource busy: {}", path.display())]
    Busy {
        /// Path that is busy.
        path: PathBuf,
    },

    /// Any other I/O failure.
    #[error("{}: {source}", path.display())]
    Io {
        /// Path the operation was performed on.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
}

impl FsError {
    /// Classify an [`io::Error`] raised while operating on `path`.
    #[must_use]
    pub fn from_io(path: &Path, source: io::Error) -> Self {
        let path = path.to_path_buf();
        match source.kind() {
            io::ErrorKind::NotFound => Self::NotFound { path },
            io::ErrorKind::PermissionDenied => Self::PermissionDenied { path },
            io::ErrorKind::ResourceBusy | io::ErrorKind::ExecutableFileBusy => {
                Self::Busy { path }
            }
            _ => Self::Io { path, source },
        }
    }

    /// Whether this failure is transient and worth retrying.
    #[must_use]
    pub const fn is_busy(&self) -> bool {
        matches!(self, Self::Busy { .. })
    }
}

/// Errors raised while reconciling links. All of them abort the run.
#[derive(Error, Debug)]
pub enum LinkError {
    /// Source and target resolve to the same location.
    #[error("dotfile path and target path are the same: {}", path.display())]
    SelfLink {
        /// The shared canonical location.
        path: PathBuf,
    },

    /// One or more managed entries are absent from the source repository.
    #[error("the following dotfiles are missing in the repository: {}", entries.join(", "))]
    MissingSources {
        /// Relative entry names that are missing.
        entries: Vec<String>,
    },

    /// A single source passed to the reconciler does not exist.
    #[error("link source does not exist: {}", path.display())]
    MissingSource {
        /// Source path.
        path: PathBuf,
    },

    /// The target still exists after it was removed.
    #[error("failed to remove incorrect link '{}'", path.display())]
    RemovalFailed {
        /// Target that could not be removed.
        path: PathBuf,
    },

    /// Removal kept failing with "resource busy".
    #[error("'{}' still busy after {attempts} removal attempts", path.display())]
    BusyRetriesExhausted {
        /// Target that stayed busy.
        path: PathBuf,
        /// Number of attempts made.
        attempts: u32,
    },

    /// Underlying filesystem failure.
    #[error(transparent)]
    Fs(#[from] FsError),
}
