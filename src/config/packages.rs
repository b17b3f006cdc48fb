//! System package lists.
use serde::Deserialize;

/// Packages installed on every new host.
pub const DEFAULT_APT: &[&str] = &[
    "autojump",
    "curl",
    "eza",
    "fonts-firacode",
    "fonts-powerline",
    "fzf",
    "git",
    "git-lfs",
    "gnupg",
    "golang",
    "libsecret-tools",
    "jq",
    "luajit",
    "pipx",
    "python-is-python3",
    "python3-venv",
    "tmux",
    "unzip",
    "wget",
    "zsh",
];

/// Packages installed only when desktop UI setup is enabled.
pub const DEFAULT_UI: &[&str] = &[
    "flameshot",
    "gnome-shell-extension-gpaste",
    "gnome-shell-extension-manager",
    "gnome-shell-extension-prefs",
    "gnome-shell-extensions-gpaste",
    "guake",
    "guake-indicator",
];

/// The `[packages]` section of `provision.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PackageLists {
    /// Base apt packages.
    pub apt: Vec<String>,
    /// Desktop-only apt packages.
    pub ui: Vec<String>,
}

impl Default for PackageLists {
    fn default() -> Self {
        Self {
            apt: DEFAULT_APT.iter().map(ToString::to_string).collect(),
            ui: DEFAULT_UI.iter().map(ToString::to_string).collect(),
        }
    }
}

impl PackageLists {
    /// Packages to install for a run, UI packages appended when `with_ui`.
    #[must_use]
    pub fn selected(&self, with_ui: bool) -> Vec<String> {
        let mut out = self.apt.clone();
        if with_ui {
            out.extend(self.ui.iter().cloned());
        }
        out
    }
}
