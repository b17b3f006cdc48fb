//! Dotfiles provisioner.
//!
//! Links a fixed set of configuration files from a dotfiles repository into
//! the home directory, optionally backing up what was there, and provisions a
//! new Debian-family host: apt packages, terminal fonts, the starship prompt
//! and repository-local git settings.
//!
//! The public API is organised into four layers:
//!
//! - **[`config`]**: load `conf/provision.toml` over built-in defaults
//! - **[`resources`]**: the link reconciler, tree walker and backup manager,
//!   plus idempotent `check + apply` primitives (packages, fonts, git config)
//! - **[`tasks`]**: named, ordered units of work wired to resources
//! - **[`commands`]**: top-level subcommand orchestration (`install`, `version`)
#![deny(clippy::or_fun_call)]
#![deny(clippy::bool_to_int_with_if)]

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod exec;
pub mod fetch;
pub mod logging;
pub mod operations;
pub mod paths;
pub mod platform;
pub mod resources;
pub mod tasks;
