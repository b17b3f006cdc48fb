//! Managed dotfile entries.
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Component, Path};

use crate::error::ConfigError;

/// Entries linked when `provision.toml` has no `[dotfiles]` section.
pub const DEFAULT_ENTRIES: &[&str] = &[
    ".bashrc",
    ".config/starship.toml",
    ".config/systemd/user/dotfiles-update-check.service",
    ".config/systemd/user/dotfiles-update-check.timer",
    ".gitconfig",
    ".local/bin/dotfiles-update-check-job",
    ".p10k.zsh",
    ".profile",
    ".tmux.conf",
    ".zprofile",
    ".zsh",
    ".zshrc",
];

/// A managed entry: a path relative to both the source repository and the
/// home directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DotfileEntry {
    /// Relative path, identical under the source root and the home directory.
    pub path: String,
    /// Link a directory as a single entry instead of linking each file below
    /// it.
    pub whole_directory: bool,
}

impl DotfileEntry {
    /// Plain entry whose directories are walked file by file.
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            whole_directory: false,
        }
    }
}

/// Raw TOML representation: either `".zshrc"` or
/// `{ path = ".zsh", whole_directory = true }`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawEntry {
    Plain(String),
    Detailed {
        path: String,
        #[serde(default)]
        whole_directory: bool,
    },
}

/// The `[dotfiles]` section of `provision.toml`.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DotfilesSection {
    #[serde(default)]
    entries: Vec<RawEntry>,
}

/// Build the validated entry list from an optional `[dotfiles]` section.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidEntry`] for the first entry that fails
/// [`validate`].
pub fn from_section(section: Option<DotfilesSection>) -> Result<Vec<DotfileEntry>, ConfigError> {
    let entries: Vec<DotfileEntry> = match section {
        Some(section) => section
            .entries
            .into_iter()
            .map(|raw| match raw {
                RawEntry::Plain(path) => DotfileEntry::new(path),
                RawEntry::Detailed {
                    path,
                    whole_directory,
                } => DotfileEntry {
                    path,
                    whole_directory,
                },
            })
            .collect(),
        None => DEFAULT_ENTRIES.iter().map(|e| DotfileEntry::new(*e)).collect(),
    };
    validate(&entries)?;
    Ok(entries)
}

/// Check that every entry is a non-empty relative path without `..` and
/// that no entry is listed twice.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidEntry`] naming the offending entry.
pub fn validate(entries: &[DotfileEntry]) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();
    for entry in entries {
        let invalid = |reason: &str| ConfigError::InvalidEntry {
            entry: entry.path.clone(),
            reason: reason.to_string(),
        };
        let path = Path::new(&entry.path);
        if entry.path.trim().is_empty() {
            return Err(invalid("path is empty"));
        }
        if path.is_absolute() {
            return Err(invalid("must be relative to the home directory"));
        }
        if path.components().any(|c| c == Component::ParentDir) {
            return Err(invalid("must not contain '..'"));
        }
        if !path.components().any(|c| matches!(c, Component::Normal(_))) {
            return Err(invalid("does not name a file or directory"));
        }
        let normalized: Vec<Component<'_>> = path
            .components()
            .filter(|c| *c != Component::CurDir)
            .collect();
        if !seen.insert(normalized) {
            return Err(invalid("listed more than once"));
        }
    }
    Ok(())
}
