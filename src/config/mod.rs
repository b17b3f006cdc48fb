//! Provisioning configuration loaded from `conf/provision.toml`.
//!
//! Every section is optional. A missing file or section falls back to the
//! built-in lists, so a bare checkout provisions exactly the default set.
pub mod dotfiles;
pub mod fonts;
pub mod git_config;
pub mod packages;
pub mod toml_loader;

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Location of the config file relative to the source root.
pub const CONFIG_FILE: &str = "conf/provision.toml";

/// Raw file layout before defaults and validation.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ProvisionFile {
    dotfiles: Option<dotfiles::DotfilesSection>,
    packages: Option<packages::PackageLists>,
    fonts: Option<fonts::FontSources>,
    git: Option<git_config::GitSection>,
}

/// All loaded configuration for one invocation.
#[derive(Debug, Clone)]
pub struct Config {
    /// Path the configuration was read from (it may not exist).
    pub path: PathBuf,
    /// Managed dotfile entries in link order.
    pub dotfiles: Vec<dotfiles::DotfileEntry>,
    /// Apt package lists.
    pub packages: packages::PackageLists,
    /// Font archives and files.
    pub fonts: fonts::FontSources,
    /// Repository-local git settings.
    pub git: Vec<git_config::GitSetting>,
}

impl Config {
    /// Load configuration for the source repository at `root`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed, or
    /// if a dotfile entry fails validation.
    pub fn load(root: &Path) -> Result<Self> {
        let path = root.join(CONFIG_FILE);
        let raw: ProvisionFile = toml_loader::load_config(&path)
            .with_context(|| format!("loading {}", path.display()))?;
        Self::from_raw(path, raw)
    }

    fn from_raw(path: PathBuf, raw: ProvisionFile) -> Result<Self> {
        let dotfiles = dotfiles::from_section(raw.dotfiles)
            .with_context(|| format!("validating [dotfiles] in {}", path.display()))?;
        Ok(Self {
            path,
            dotfiles,
            packages: raw.packages.unwrap_or_default(),
            fonts: raw.fonts.unwrap_or_default(),
            git: raw.git.unwrap_or_default().settings,
        })
    }
}
