//! Top-level subcommand orchestration.
pub mod install;
pub mod prompt;
pub mod version;
