//! Command-line arguments.
use clap::{Parser, Subcommand};

/// Top-level CLI entry point for the dotfiles provisioner.
#[derive(Parser, Debug)]
#[command(
    name = "dotfiles",
    about = "Link dotfiles into the home directory and provision the host",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, visible_alias = "debug", global = true)]
    pub verbose: bool,

    #[command(flatten)]
    pub global: GlobalOpts,
}

/// Options shared across all subcommands.
#[derive(Parser, Debug, Clone, Default)]
pub struct GlobalOpts {
    /// Preview changes without applying
    #[arg(short = 'd', long, global = true)]
    pub dry_run: bool,

    /// Override dotfiles root directory
    #[arg(long, global = true)]
    pub root: Option<std::path::PathBuf>,

    /// Override the home directory receiving the links
    #[arg(long, global = true)]
    pub home: Option<std::path::PathBuf>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Link dotfiles and optionally provision the host
    Install(InstallOpts),
    /// Print version information
    Version,
}

/// Options for the `install` subcommand.
#[derive(Parser, Debug, Clone, Default)]
#[allow(clippy::struct_excessive_bools)]
pub struct InstallOpts {
    /// Run the full new host setup (packages, fonts, starship, git config)
    #[arg(long)]
    pub new_host: bool,

    /// Also install desktop packages; implies --new-host
    #[arg(long)]
    pub ui: bool,

    /// Back up existing dotfiles before linking
    #[arg(long)]
    pub backup: bool,

    /// Replace existing targets even when they are already correct links
    #[arg(short, long)]
    pub force: bool,

    /// Leave existing targets untouched (default inside a container)
    #[arg(long)]
    pub skip_existing: bool,

    /// Create hard links instead of symlinks
    #[arg(long)]
    pub hard_links: bool,

    /// Never prompt; answer "no" to every question
    #[arg(long)]
    pub non_interactive: bool,

    /// Refresh packages, fonts and starship without prompting; overrides
    /// --new-host and --ui
    #[arg(long)]
    pub update: bool,
}

#[cfg(test)]
#[allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::indexing_slicing,
    clippy::panic
)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn install(args: &[&str]) -> (GlobalOpts, InstallOpts) {
        let cli = Cli::parse_from(args);
        match cli.command {
            Command::Install(opts) => (cli.global, opts),
            Command::Version => panic!("expected install"),
        }
    }

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_install_defaults() {
        let (global, opts) = install(&["dotfiles", "install"]);
        assert!(!global.dry_run);
        assert_eq!(global.root, None);
        assert!(!opts.new_host && !opts.ui && !opts.backup && !opts.force);
        assert!(!opts.skip_existing && !opts.hard_links && !opts.update);
    }

    #[test]
    fn parse_install_dry_run_short() {
        let (global, _) = install(&["dotfiles", "-d", "install"]);
        assert!(global.dry_run);
    }

    #[test]
    fn parse_global_options_after_subcommand() {
        let (global, _) = install(&["dotfiles", "install", "--root", "/r", "--home", "/h"]);
        assert_eq!(global.root.as_deref(), Some(std::path::Path::new("/r")));
        assert_eq!(global.home.as_deref(), Some(std::path::Path::new("/h")));
    }

    #[test]
    fn parse_install_flags() {
        let (_, opts) = install(&[
            "dotfiles",
            "install",
            "--new-host",
            "--ui",
            "--backup",
            "-f",
            "--skip-existing",
            "--hard-links",
            "--non-interactive",
        ]);
        assert!(opts.new_host && opts.ui && opts.backup && opts.force);
        assert!(opts.skip_existing && opts.hard_links && opts.non_interactive);
    }

    #[test]
    fn update_parses_alongside_new_host() {
        let (_, opts) = install(&["dotfiles", "install", "--update", "--new-host"]);
        assert!(opts.update && opts.new_host);
    }

    #[test]
    fn debug_is_an_alias_for_verbose() {
        let cli = Cli::parse_from(["dotfiles", "--debug", "install"]);
        assert!(cli.verbose);
        let cli = Cli::parse_from(["dotfiles", "-v", "install"]);
        assert!(cli.verbose);
    }

    #[test]
    fn parse_version() {
        let cli = Cli::parse_from(["dotfiles", "version"]);
        assert!(matches!(cli.command, Command::Version));
    }
}
