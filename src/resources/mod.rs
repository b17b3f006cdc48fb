//! Provisioning primitives.
//!
//! The link engine ([`link`], [`tree`]) and [`backup`] work directly on the
//! filesystem provider. Everything a new host installs (apt packages, fonts,
//! git settings) is a resource: it reports its state, then applies itself.
pub mod backup;
pub mod font;
pub mod git_config;
pub mod helpers;
pub mod link;
pub mod package;
pub mod tree;

use anyhow::Result;

/// Something a provisioning task can install or set.
///
/// Font archives only implement this trait: whether one is present is
/// answered for all of them at once by a single `fc-list` query. Apt
/// packages only implement [`Resource`] since they install as one batch.
pub trait Applicable {
    /// Short label used in log lines.
    fn description(&self) -> String;

    /// Bring the host to the desired state.
    ///
    /// # Errors
    ///
    /// Returns an error if a command, download or write fails.
    fn apply(&self) -> Result<ResourceChange>;
}

/// What a resource looks like on the host right now.
///
/// ```
/// use dotfiles_provision::resources::ResourceState;
///
/// let unset = ResourceState::Incorrect { current: "vim".into() };
/// assert_ne!(unset, ResourceState::Correct);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceState {
    /// Not installed or not set.
    Missing,
    /// Already as desired.
    Correct,
    /// Present with another value.
    Incorrect {
        /// Value found on the host.
        current: String,
    },
    /// Cannot be provided on this host (e.g. a package unknown to apt).
    Invalid {
        /// Why it cannot be provided.
        reason: String,
    },
}

/// Outcome of [`Applicable::apply`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceChange {
    /// Installed or updated.
    Applied,
    /// Nothing had to change.
    AlreadyCorrect,
    /// Left alone, e.g. an archive without any `.ttf` file.
    Skipped {
        /// Why it was left alone.
        reason: String,
    },
}

/// Something whose state on the host can be inspected.
pub trait Resource {
    /// Inspect the host.
    ///
    /// # Errors
    ///
    /// Returns an error if the state cannot be queried.
    fn current_state(&self) -> Result<ResourceState>;
}
