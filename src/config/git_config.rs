//! Repository-local git settings applied on a new host.
use serde::Deserialize;

/// A git config key-value pair written to the source repository's local
/// config.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GitSetting {
    /// Config key (e.g. `"user.name"`).
    pub key: String,
    /// Desired value.
    pub value: String,
}

impl GitSetting {
    fn new(key: &str, value: &str) -> Self {
        Self {
            key: key.to_string(),
            value: value.to_string(),
        }
    }
}

/// The `[git]` section of `provision.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GitSection {
    /// Settings in application order.
    pub settings: Vec<GitSetting>,
}

impl Default for GitSection {
    fn default() -> Self {
        Self {
            settings: vec![
                GitSetting::new("user.name", "Christian Ditscher"),
                GitSetting::new("user.email", "chris@ditscher.me"),
                GitSetting::new("commit.gpgsign", "false"),
            ],
        }
    }
}
