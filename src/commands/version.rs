//! Command: print version information.

/// Version baked in at build time: `git describe` output or
/// `DOTFILES_VERSION` when available, otherwise the package version.
#[must_use]
pub fn version() -> &'static str {
    option_env!("DOTFILES_VERSION").unwrap_or(env!("CARGO_PKG_VERSION"))
}

/// Print the version to stdout.
pub fn run() {
    println!("dotfiles {}", version());
}
