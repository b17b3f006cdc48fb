//! Repository-local git config resource.
use std::path::PathBuf;

use anyhow::{Context as _, Result};
use git2::{Config, ConfigLevel, ErrorCode, Repository};

use super::{Applicable, Resource, ResourceChange, ResourceState};

/// A local git config entry of one repository that can be checked and applied.
#[derive(Debug)]
pub struct GitConfigResource {
    /// Config key (e.g., "user.name").
    pub key: String,
    /// Desired value.
    pub desired_value: String,
    /// Root of the repository whose `.git/config` is edited.
    repo_root: PathBuf,
}

impl GitConfigResource {
    /// Create a new git config resource.
    #[must_use]
    pub const fn new(key: String, desired_value: String, repo_root: PathBuf) -> Self {
        Self {
            key,
            desired_value,
            repo_root,
        }
    }

    fn local_config(&self) -> Result<Config> {
        let repo = Repository::open(&self.repo_root)
            .with_context(|| format!("opening git repository {}", self.repo_root.display()))?;
        repo.config()
            .and_then(|c| c.open_level(ConfigLevel::Local))
            .with_context(|| {
                format!(
                    "opening local git config of {}",
                    self.repo_root.display()
                )
            })
    }
}

impl Applicable for GitConfigResource {
    fn description(&self) -> String {
        format!("{} = {}", self.key, self.desired_value)
    }

    fn apply(&self) -> Result<ResourceChange> {
        let mut config = self.local_config()?;
        config
            .set_str(&self.key, &self.desired_value)
            .with_context(|| format!("setting git config {}", self.key))?;
        Ok(ResourceChange::Applied)
    }
}

impl Resource for GitConfigResource {
    fn current_state(&self) -> Result<ResourceState> {
        let config = self.local_config()?;
        match config.get_string(&self.key) {
            Ok(current) if current == self.desired_value => Ok(ResourceState::Correct),
            Ok(current) if current.is_empty() => Ok(ResourceState::Missing),
            Ok(current) => Ok(ResourceState::Incorrect { current }),
            Err(e) if e.code() == ErrorCode::NotFound => Ok(ResourceState::Missing),
            Err(e) => Err(e).with_context(|| format!("reading git config {}", self.key)),
        }
    }
}
